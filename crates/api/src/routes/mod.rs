//! HTTP route handlers.

pub mod auth;
pub mod health;
pub mod players;
pub mod products;
pub mod promocodes;
pub mod rewards;
pub mod server_actions;
pub mod shop;
pub mod transfers;

//! Request extractors.

pub mod player_auth;

pub use player_auth::PlayerAuth;

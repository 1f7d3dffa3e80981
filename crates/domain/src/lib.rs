//! Domain layer for the EmberCraft backend.
//!
//! This crate contains:
//! - Domain models (Player, Product, PromoCode, Purchase, ExecutionRecord, Transfer)
//! - Pure business logic (pricing, command templates, referral schedule)
//! - Domain error types

pub mod models;
pub mod services;

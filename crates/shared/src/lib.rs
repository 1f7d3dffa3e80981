//! Shared utilities and common types for the EmberCraft backend.
//!
//! This crate provides common functionality used across all other crates:
//! - JWT token generation and validation
//! - Password hashing with Argon2id
//! - Referral code generation and hashing helpers
//! - Common validation logic
//! - Cursor-based pagination

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;

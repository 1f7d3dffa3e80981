//! Pure domain services.

pub mod commands;
pub mod pricing;
pub mod referral;

pub use commands::{build_commands, CommandBuildError};
pub use pricing::{resolve_price, PricingError, ResolvedPrice};
pub use referral::discount_for_referrals;

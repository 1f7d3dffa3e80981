//! Repository implementations.

pub mod execution;
pub mod ledger;
pub mod player;
pub mod playtime;
pub mod product;
pub mod promo_code;
pub mod purchase;
pub mod referral;
pub mod transfer;

pub use execution::ExecutionRepository;
pub use ledger::{LedgerError, LedgerRepository, PurchaseOutcome};
pub use player::PlayerRepository;
pub use playtime::PlaytimeRepository;
pub use product::ProductRepository;
pub use promo_code::PromoCodeRepository;
pub use purchase::PurchaseRepository;
pub use referral::ReferralRepository;
pub use transfer::{TransferError, TransferRepository};

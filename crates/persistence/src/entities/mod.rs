//! Database entity definitions (row mappings).

pub mod execution;
pub mod player;
pub mod playtime;
pub mod product;
pub mod promo_code;
pub mod purchase;
pub mod transfer;

pub use execution::{ExecutionEntity, RetryableExecutionRow, DEFAULT_MAX_RETRIES};
pub use player::PlayerEntity;
pub use playtime::{PlaytimeRewardEntity, PlaytimeTotalRow};
pub use product::ProductEntity;
pub use promo_code::PromoCodeEntity;
pub use purchase::PurchaseEntity;
pub use transfer::TransferEntity;

//! Background job scheduler and job implementations.

mod fulfillment_retry;
mod playtime_rewards;
mod pool_metrics;
mod scheduler;

pub use fulfillment_retry::FulfillmentRetryJob;
pub use playtime_rewards::PlaytimeRewardsJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::JobScheduler;

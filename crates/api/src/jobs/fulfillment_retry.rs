//! Fulfillment retry sweeper.
//!
//! Periodically re-drives execution records stuck in the pending state.
//! A single-flight guard skips a tick while the previous sweep is still
//! running; overlapping sweeps over the same records would double-fire
//! remote commands.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::services::FulfillmentService;

use super::scheduler::{Job, JobFrequency};

/// Background job retrying pending fulfillment executions.
pub struct FulfillmentRetryJob {
    service: Arc<FulfillmentService>,
    batch_size: i64,
    interval_minutes: u64,
    in_flight: AtomicBool,
}

impl FulfillmentRetryJob {
    pub fn new(service: Arc<FulfillmentService>, batch_size: i64, interval_minutes: u64) -> Self {
        Self {
            service,
            batch_size,
            interval_minutes,
            in_flight: AtomicBool::new(false),
        }
    }
}

#[async_trait::async_trait]
impl Job for FulfillmentRetryJob {
    fn name(&self) -> &'static str {
        "fulfillment_retry"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    async fn execute(&self) -> Result<(), String> {
        // Single-flight: if the previous sweep has not finished, skip
        // this tick entirely.
        if self.in_flight.swap(true, Ordering::SeqCst) {
            warn!("Previous fulfillment sweep still in flight, skipping tick");
            return Ok(());
        }

        let result = self.service.retry_pending(self.batch_size).await;
        self.in_flight.store(false, Ordering::SeqCst);

        match result {
            Ok(succeeded) => {
                if succeeded > 0 {
                    info!(
                        succeeded,
                        batch_size = self.batch_size,
                        "Fulfillment sweep recovered executions"
                    );
                }
                Ok(())
            }
            Err(e) => Err(format!("Fulfillment sweep failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_frequency() {
        let freq = JobFrequency::Minutes(2);
        assert_eq!(freq.duration(), std::time::Duration::from_secs(120));
    }

    #[test]
    fn test_single_flight_guard_semantics() {
        let guard = AtomicBool::new(false);
        // First entry wins the guard.
        assert!(!guard.swap(true, Ordering::SeqCst));
        // Second entry sees it held and must skip.
        assert!(guard.swap(true, Ordering::SeqCst));
        guard.store(false, Ordering::SeqCst);
        assert!(!guard.swap(true, Ordering::SeqCst));
    }
}

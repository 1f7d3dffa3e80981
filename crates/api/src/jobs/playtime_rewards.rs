//! Playtime reward accrual job.
//!
//! Aggregates active minutes (session time minus AFK) from the playtime
//! plugin's session rows, diffs against the per-player award watermark,
//! and credits coins for the new minutes. The run summary goes to the
//! notification channel as raw statistics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sqlx::PgPool;
use tracing::{error, info, warn};

use domain::models::RewardRunStats;
use persistence::repositories::PlaytimeRepository;

use crate::services::TelegramNotifier;

use super::scheduler::{Job, JobFrequency};

/// Background job crediting coins for active playtime.
pub struct PlaytimeRewardsJob {
    playtime: PlaytimeRepository,
    notifier: Arc<TelegramNotifier>,
    coins_per_minute: i64,
    interval_minutes: u64,
    in_flight: AtomicBool,
}

impl PlaytimeRewardsJob {
    pub fn new(
        pool: PgPool,
        notifier: Arc<TelegramNotifier>,
        coins_per_minute: i64,
        interval_minutes: u64,
    ) -> Self {
        Self {
            playtime: PlaytimeRepository::new(pool),
            notifier,
            coins_per_minute,
            interval_minutes,
            in_flight: AtomicBool::new(false),
        }
    }

    async fn run_accrual(&self) -> Result<RewardRunStats, sqlx::Error> {
        let totals = self.playtime.active_minute_totals().await?;
        let mut stats = RewardRunStats::default();

        for row in totals {
            let watermark = self.playtime.watermark(row.player_id).await?;
            let counted = watermark.map_or(0, |w| w.total_active_minutes);
            let new_minutes = (row.total_active_minutes - counted).max(0);

            if new_minutes == 0 {
                continue;
            }

            let coins = new_minutes * self.coins_per_minute;
            match self
                .playtime
                .award(row.player_id, row.total_active_minutes, new_minutes, coins)
                .await
            {
                Ok(()) => {
                    stats.players_rewarded += 1;
                    stats.coins_awarded += coins;
                    stats.active_minutes += new_minutes;
                }
                Err(e) => {
                    // One broken player must not starve the rest of the run.
                    error!(player_id = row.player_id, error = %e, "Reward credit failed");
                }
            }
        }

        Ok(stats)
    }
}

#[async_trait::async_trait]
impl Job for PlaytimeRewardsJob {
    fn name(&self) -> &'static str {
        "playtime_rewards"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    async fn execute(&self) -> Result<(), String> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            warn!("Previous reward run still in flight, skipping tick");
            return Ok(());
        }

        let result = self.run_accrual().await;
        self.in_flight.store(false, Ordering::SeqCst);

        match result {
            Ok(stats) => {
                if !stats.is_empty() {
                    info!(
                        players = stats.players_rewarded,
                        coins = stats.coins_awarded,
                        minutes = stats.active_minutes,
                        "Playtime rewards credited"
                    );
                    self.notifier.notify_reward_run(&stats).await;
                }
                Ok(())
            }
            Err(e) => Err(format!("Reward accrual failed: {}", e)),
        }
    }
}

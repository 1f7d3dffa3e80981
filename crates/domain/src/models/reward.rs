//! Playtime reward statistics.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Aggregate result of one reward accrual run.
///
/// These are the raw numbers a notification channel renders; formatting
/// is out of scope here.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardRunStats {
    /// Players that received at least one coin this run.
    pub players_rewarded: u32,
    /// Total coins credited this run.
    pub coins_awarded: i64,
    /// Total newly-counted active minutes this run.
    pub active_minutes: i64,
}

impl RewardRunStats {
    pub fn is_empty(&self) -> bool {
        self.players_rewarded == 0
    }
}

/// A player's accrual state, as exposed by the rewards endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaytimeRewardStatus {
    /// Active minutes counted so far (lifetime, minus AFK).
    pub total_active_minutes: i64,
    /// Coins credited by reward runs so far.
    pub coins_awarded: i64,
    pub last_awarded_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_run() {
        assert!(RewardRunStats::default().is_empty());

        let run = RewardRunStats {
            players_rewarded: 3,
            coins_awarded: 120,
            active_minutes: 120,
        };
        assert!(!run.is_empty());
    }
}

//! Telegram notification channel.
//!
//! The backend only ships raw statistics; the channel renders them as a
//! short human-readable summary. Disabled (a no-op) unless configured.

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use domain::models::RewardRunStats;

use crate::config::TelegramConfig;

/// Request timeout for the Bot API.
const TELEGRAM_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API returned status {0}")]
    BadStatus(u16),
}

#[derive(Debug, Serialize)]
struct SendMessageBody<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Posts operational summaries to a Telegram chat.
pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(TELEGRAM_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.bot_token.is_empty()
    }

    /// Sends one text message to the configured chat.
    pub async fn send_message(&self, text: &str) -> Result<(), NotifierError> {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.config.bot_token
        );

        let response = self
            .client
            .post(&url)
            .json(&SendMessageBody {
                chat_id: &self.config.chat_id,
                text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::BadStatus(status.as_u16()));
        }

        Ok(())
    }

    /// Reports a reward-run summary. Failures are logged, never
    /// propagated; a broken bot must not fail the accrual job.
    pub async fn notify_reward_run(&self, stats: &RewardRunStats) {
        if !self.is_enabled() {
            debug!("Telegram notifier disabled, skipping reward summary");
            return;
        }

        let text = format!(
            "Playtime rewards: {} players, {} coins for {} active minutes",
            stats.players_rewarded, stats.coins_awarded, stats.active_minutes
        );

        if let Err(e) = self.send_message(&text).await {
            warn!(error = %e, "Failed to deliver reward summary");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_without_token() {
        let notifier = TelegramNotifier::new(TelegramConfig {
            enabled: true,
            bot_token: String::new(),
            chat_id: "42".to_string(),
        });
        assert!(!notifier.is_enabled());
    }

    #[test]
    fn test_disabled_by_flag() {
        let notifier = TelegramNotifier::new(TelegramConfig {
            enabled: false,
            bot_token: "token".to_string(),
            chat_id: "42".to_string(),
        });
        assert!(!notifier.is_enabled());
    }

    #[tokio::test]
    async fn test_notify_disabled_is_noop() {
        let notifier = TelegramNotifier::new(TelegramConfig::default());
        // Must return without any network activity.
        notifier.notify_reward_run(&RewardRunStats::default()).await;
    }
}

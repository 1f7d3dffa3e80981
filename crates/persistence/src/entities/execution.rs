//! Execution record entity definitions.
//!
//! Maps to the product_executions table tracking fulfillment attempts.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::{CommandResult, ExecutionStatus};

/// Default retry budget for a new execution record.
pub const DEFAULT_MAX_RETRIES: i32 = 3;

/// Database entity for the product_executions table.
#[derive(Debug, Clone, FromRow)]
pub struct ExecutionEntity {
    pub id: i64,
    pub purchase_id: i64,
    pub player_id: i64,
    pub product_id: i64,
    pub kind: String,
    pub status: String,
    pub commands: Option<serde_json::Value>,
    pub result: Option<serde_json::Value>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub created_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
}

impl ExecutionEntity {
    pub fn status(&self) -> Option<ExecutionStatus> {
        ExecutionStatus::parse(&self.status)
    }

    /// Per-command results of the latest attempt, if recorded.
    pub fn parsed_results(&self) -> Option<Vec<CommandResult>> {
        self.result
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// A retryable execution joined with everything the sweeper needs to
/// rebuild and re-run its command batch.
#[derive(Debug, Clone, FromRow)]
pub struct RetryableExecutionRow {
    // product_executions
    pub id: i64,
    pub purchase_id: i64,
    pub player_id: i64,
    pub product_id: i64,
    pub kind: String,
    pub retry_count: i32,
    pub max_retries: i32,
    // purchases
    pub quantity: i32,
    // players
    pub player_name: String,
    // products
    pub product_kind: String,
    pub items: Option<serde_json::Value>,
    pub subscription_days: Option<i32>,
    pub execution_config: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_max_retries() {
        assert_eq!(DEFAULT_MAX_RETRIES, 3);
    }

    #[test]
    fn test_parsed_results() {
        let entity = ExecutionEntity {
            id: 1,
            purchase_id: 1,
            player_id: 1,
            product_id: 1,
            kind: "whitelist".to_string(),
            status: "success".to_string(),
            commands: None,
            result: Some(serde_json::json!([
                {"command": "whitelist add Steve", "success": true, "response": "ok"}
            ])),
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            created_at: Utc::now(),
            executed_at: Some(Utc::now()),
        };

        let results = entity.parsed_results().unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].success);
        assert_eq!(entity.status(), Some(ExecutionStatus::Success));
    }
}

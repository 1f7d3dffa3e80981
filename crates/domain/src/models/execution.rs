//! Execution record lifecycle types.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a fulfillment attempt-group.
///
/// `Pending` is the only non-terminal state: the dispatcher creates the
/// record as pending, and the retry sweeper re-drives pending records
/// until they reach `Success` or `Failed`. `ManualRequired` is terminal
/// for automation; a human resolves it out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Success,
    Failed,
    ManualRequired,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Success => "success",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::ManualRequired => "manual_required",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ExecutionStatus::Pending),
            "success" => Some(ExecutionStatus::Success),
            "failed" => Some(ExecutionStatus::Failed),
            "manual_required" => Some(ExecutionStatus::ManualRequired),
            _ => None,
        }
    }

    /// Whether the sweeper may still pick this record up.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecutionStatus::Pending)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of one remote command inside an attempt batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub command: String,
    pub success: bool,
    pub response: String,
}

/// State transition after one fulfillment attempt.
///
/// `retry_count` is the counter value after this attempt has been added.
/// A successful batch is terminal; a failed batch stays pending until the
/// retry budget is spent.
pub fn status_after_attempt(
    all_succeeded: bool,
    retry_count: i32,
    max_retries: i32,
) -> ExecutionStatus {
    if all_succeeded {
        ExecutionStatus::Success
    } else if retry_count >= max_retries {
        ExecutionStatus::Failed
    } else {
        ExecutionStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            ExecutionStatus::Pending,
            ExecutionStatus::Success,
            ExecutionStatus::Failed,
            ExecutionStatus::ManualRequired,
        ] {
            assert_eq!(ExecutionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ExecutionStatus::parse("unknown"), None);
    }

    #[test]
    fn test_only_pending_is_retryable() {
        assert!(ExecutionStatus::Pending.is_retryable());
        assert!(!ExecutionStatus::Success.is_retryable());
        assert!(!ExecutionStatus::Failed.is_retryable());
        assert!(!ExecutionStatus::ManualRequired.is_retryable());
    }

    #[test]
    fn test_success_is_terminal_regardless_of_retries() {
        assert_eq!(
            status_after_attempt(true, 3, 3),
            ExecutionStatus::Success
        );
    }

    #[test]
    fn test_failure_stays_pending_with_budget_left() {
        assert_eq!(
            status_after_attempt(false, 1, 3),
            ExecutionStatus::Pending
        );
        assert_eq!(
            status_after_attempt(false, 2, 3),
            ExecutionStatus::Pending
        );
    }

    #[test]
    fn test_failure_terminal_when_budget_spent() {
        assert_eq!(status_after_attempt(false, 3, 3), ExecutionStatus::Failed);
        assert_eq!(status_after_attempt(false, 4, 3), ExecutionStatus::Failed);
    }

    #[test]
    fn test_command_result_serialization() {
        let result = CommandResult {
            command: "whitelist add Steve".to_string(),
            success: true,
            response: "Added Steve to the whitelist".to_string(),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"command\":\"whitelist add Steve\""));
        assert!(json.contains("\"success\":true"));
    }
}

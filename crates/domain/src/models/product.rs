//! Product catalog model and fulfillment configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use super::purchase::Currency;

/// The category of reward a product grants, determining which command
/// builder applies at fulfillment time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentKind {
    /// One or more in-game items delivered via give commands.
    Item,
    /// A time-limited perk; command templates receive the duration.
    Subscription,
    /// Server allowlist entry.
    Whitelist,
    /// Permission/privilege rank.
    Rank,
    /// Human-performed service; always routed to manual handling.
    Service,
    /// Raw configured command batch.
    Command,
}

impl FulfillmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentKind::Item => "item",
            FulfillmentKind::Subscription => "subscription",
            FulfillmentKind::Whitelist => "whitelist",
            FulfillmentKind::Rank => "rank",
            FulfillmentKind::Service => "service",
            FulfillmentKind::Command => "command",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "item" => Some(FulfillmentKind::Item),
            "subscription" => Some(FulfillmentKind::Subscription),
            "whitelist" => Some(FulfillmentKind::Whitelist),
            "rank" => Some(FulfillmentKind::Rank),
            "service" => Some(FulfillmentKind::Service),
            "command" => Some(FulfillmentKind::Command),
            _ => None,
        }
    }
}

impl std::fmt::Display for FulfillmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One item entry for `item` products without explicit command templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSpec {
    /// Namespaced item id, e.g. `minecraft:diamond`.
    pub minecraft_id: String,
    /// Amount per purchased unit.
    pub amount: i32,
}

/// How a command batch relates to the purchased quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStrategy {
    /// Run the batch once; templates see the full quantity.
    #[default]
    PerPurchase,
    /// Repeat the batch once per purchased unit.
    PerUnit,
}

/// Declarative fulfillment configuration stored with the product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionConfig {
    /// Target game server id; the executor's default server when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,

    /// Ordered command templates with `{placeholder}` substitution.
    #[serde(default)]
    pub commands: Vec<String>,

    #[serde(default)]
    pub delivery: DeliveryStrategy,
}

/// A catalog entry.
///
/// At least one price must be set; a null price means the product cannot
/// be bought with that currency. Products are soft-deleted via `is_active`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub kind: FulfillmentKind,
    pub game_price: Option<i64>,
    pub donate_price: Option<i64>,
    /// 0 = unlimited.
    pub max_purchases_per_player: i32,
    pub items: Option<Vec<ItemSpec>>,
    pub subscription_days: Option<i32>,
    pub execution_config: ExecutionConfig,
    pub auto_execute: bool,
    pub requires_manual_approval: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Price in the given currency, if purchasable with it.
    pub fn price_in(&self, currency: Currency) -> Option<i64> {
        match currency {
            Currency::Game => self.game_price,
            Currency::Donate => self.donate_price,
        }
    }
}

/// Why a product definition was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProductConfigError {
    #[error("product must have at least one price")]
    NoPrice,

    #[error("price must be positive")]
    NonPositivePrice,

    #[error("'command' products require a non-empty command template list")]
    MissingCommands,

    #[error("'item' products require items or command templates")]
    MissingItems,

    #[error("'subscription' products require a positive duration in days")]
    MissingDuration,

    #[error("item amounts must be positive")]
    NonPositiveItemAmount,
}

/// Request payload for creating a product (admin).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,

    pub description: Option<String>,

    pub kind: FulfillmentKind,

    pub game_price: Option<i64>,
    pub donate_price: Option<i64>,

    #[serde(default)]
    pub max_purchases_per_player: i32,

    pub items: Option<Vec<ItemSpec>>,
    pub subscription_days: Option<i32>,

    #[serde(default)]
    pub execution_config: ExecutionConfig,

    #[serde(default = "default_true")]
    pub auto_execute: bool,

    #[serde(default)]
    pub requires_manual_approval: bool,
}

fn default_true() -> bool {
    true
}

impl CreateProductRequest {
    /// Kind-specific invariants that `validator` derives cannot express.
    pub fn check_config(&self) -> Result<(), ProductConfigError> {
        validate_product_config(
            self.kind,
            self.game_price,
            self.donate_price,
            &self.execution_config,
            self.items.as_deref(),
            self.subscription_days,
        )
    }
}

/// Validates the cross-field product invariants.
pub fn validate_product_config(
    kind: FulfillmentKind,
    game_price: Option<i64>,
    donate_price: Option<i64>,
    config: &ExecutionConfig,
    items: Option<&[ItemSpec]>,
    subscription_days: Option<i32>,
) -> Result<(), ProductConfigError> {
    if game_price.is_none() && donate_price.is_none() {
        return Err(ProductConfigError::NoPrice);
    }
    if game_price.is_some_and(|p| p <= 0) || donate_price.is_some_and(|p| p <= 0) {
        return Err(ProductConfigError::NonPositivePrice);
    }

    match kind {
        FulfillmentKind::Command => {
            if config.commands.is_empty() {
                return Err(ProductConfigError::MissingCommands);
            }
        }
        FulfillmentKind::Item => {
            let has_items = items.is_some_and(|i| !i.is_empty());
            if !has_items && config.commands.is_empty() {
                return Err(ProductConfigError::MissingItems);
            }
            if let Some(items) = items {
                if items.iter().any(|i| i.amount <= 0) {
                    return Err(ProductConfigError::NonPositiveItemAmount);
                }
            }
        }
        FulfillmentKind::Subscription => {
            if !subscription_days.is_some_and(|d| d > 0) {
                return Err(ProductConfigError::MissingDuration);
            }
        }
        // Whitelist has a built-in default command; rank templates are
        // checked at dispatch time; service is manual-only.
        FulfillmentKind::Whitelist | FulfillmentKind::Rank | FulfillmentKind::Service => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request(kind: FulfillmentKind) -> CreateProductRequest {
        CreateProductRequest {
            name: "Test product".to_string(),
            description: None,
            kind,
            game_price: Some(100),
            donate_price: None,
            max_purchases_per_player: 0,
            items: None,
            subscription_days: None,
            execution_config: ExecutionConfig::default(),
            auto_execute: true,
            requires_manual_approval: false,
        }
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            FulfillmentKind::Item,
            FulfillmentKind::Subscription,
            FulfillmentKind::Whitelist,
            FulfillmentKind::Rank,
            FulfillmentKind::Service,
            FulfillmentKind::Command,
        ] {
            assert_eq!(FulfillmentKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(FulfillmentKind::parse("mystery"), None);
    }

    #[test]
    fn test_at_least_one_price_required() {
        let mut req = base_request(FulfillmentKind::Whitelist);
        req.game_price = None;
        assert_eq!(req.check_config(), Err(ProductConfigError::NoPrice));
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut req = base_request(FulfillmentKind::Whitelist);
        req.game_price = Some(-5);
        assert_eq!(
            req.check_config(),
            Err(ProductConfigError::NonPositivePrice)
        );
    }

    #[test]
    fn test_command_kind_requires_templates() {
        let req = base_request(FulfillmentKind::Command);
        assert_eq!(req.check_config(), Err(ProductConfigError::MissingCommands));

        let mut with_commands = base_request(FulfillmentKind::Command);
        with_commands.execution_config.commands = vec!["broadcast thanks {player}".to_string()];
        assert!(with_commands.check_config().is_ok());
    }

    #[test]
    fn test_item_kind_requires_items_or_templates() {
        let req = base_request(FulfillmentKind::Item);
        assert_eq!(req.check_config(), Err(ProductConfigError::MissingItems));

        let mut with_items = base_request(FulfillmentKind::Item);
        with_items.items = Some(vec![ItemSpec {
            minecraft_id: "minecraft:diamond".to_string(),
            amount: 3,
        }]);
        assert!(with_items.check_config().is_ok());
    }

    #[test]
    fn test_subscription_requires_duration() {
        let req = base_request(FulfillmentKind::Subscription);
        assert_eq!(req.check_config(), Err(ProductConfigError::MissingDuration));

        let mut with_days = base_request(FulfillmentKind::Subscription);
        with_days.subscription_days = Some(30);
        assert!(with_days.check_config().is_ok());
    }

    #[test]
    fn test_whitelist_needs_no_extra_fields() {
        assert!(base_request(FulfillmentKind::Whitelist).check_config().is_ok());
    }

    #[test]
    fn test_execution_config_deserializes_with_defaults() {
        let config: ExecutionConfig = serde_json::from_str("{}").unwrap();
        assert!(config.server_id.is_none());
        assert!(config.commands.is_empty());
        assert_eq!(config.delivery, DeliveryStrategy::PerPurchase);
    }
}

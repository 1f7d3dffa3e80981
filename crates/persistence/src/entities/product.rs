//! Product entity definition.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::warn;

use domain::models::{ExecutionConfig, FulfillmentKind, ItemSpec, Product};

/// Database entity for the products table.
#[derive(Debug, Clone, FromRow)]
pub struct ProductEntity {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub kind: String,
    pub game_price: Option<i64>,
    pub donate_price: Option<i64>,
    pub max_purchases_per_player: i32,
    pub items: Option<serde_json::Value>,
    pub subscription_days: Option<i32>,
    pub execution_config: serde_json::Value,
    pub auto_execute: bool,
    pub requires_manual_approval: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductEntity {
    /// The fulfillment kind, or `None` for an unknown stored value.
    pub fn fulfillment_kind(&self) -> Option<FulfillmentKind> {
        FulfillmentKind::parse(&self.kind)
    }

    /// Parsed execution configuration; malformed JSON degrades to the
    /// empty config rather than failing the whole purchase.
    pub fn parsed_execution_config(&self) -> ExecutionConfig {
        match serde_json::from_value(self.execution_config.clone()) {
            Ok(config) => config,
            Err(e) => {
                warn!(product_id = self.id, error = %e, "Malformed execution_config, using defaults");
                ExecutionConfig::default()
            }
        }
    }

    /// Parsed item list for `item` products.
    pub fn parsed_items(&self) -> Option<Vec<ItemSpec>> {
        self.items
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Converts to the domain model. Unknown kinds are reported as `None`
    /// by `fulfillment_kind`; callers filter those out before exposure.
    pub fn into_model(self) -> Option<Product> {
        let kind = self.fulfillment_kind()?;
        let execution_config = self.parsed_execution_config();
        let items = self.parsed_items();

        Some(Product {
            id: self.id,
            name: self.name,
            description: self.description,
            kind,
            game_price: self.game_price,
            donate_price: self.donate_price,
            max_purchases_per_player: self.max_purchases_per_player,
            items,
            subscription_days: self.subscription_days,
            execution_config,
            auto_execute: self.auto_execute,
            requires_manual_approval: self.requires_manual_approval,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(kind: &str, config: serde_json::Value) -> ProductEntity {
        ProductEntity {
            id: 1,
            name: "VIP".to_string(),
            description: None,
            kind: kind.to_string(),
            game_price: Some(500),
            donate_price: None,
            max_purchases_per_player: 1,
            items: None,
            subscription_days: None,
            execution_config: config,
            auto_execute: true,
            requires_manual_approval: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_parsed_execution_config() {
        let e = entity(
            "rank",
            serde_json::json!({"serverId": "survival", "commands": ["lp user {player} parent set vip"]}),
        );
        let config = e.parsed_execution_config();
        assert_eq!(config.server_id.as_deref(), Some("survival"));
        assert_eq!(config.commands.len(), 1);
    }

    #[test]
    fn test_malformed_config_degrades_to_default() {
        let e = entity("rank", serde_json::json!("not-an-object"));
        assert_eq!(e.parsed_execution_config(), ExecutionConfig::default());
    }

    #[test]
    fn test_unknown_kind_maps_to_none() {
        let e = entity("loot_box", serde_json::json!({}));
        assert!(e.fulfillment_kind().is_none());
        assert!(e.into_model().is_none());
    }
}

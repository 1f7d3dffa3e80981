//! Remote command construction from product configuration.
//!
//! Templates use a fixed set of named placeholders substituted by exact
//! match (`{player}`, `{quantity}`, `{item_id}`, `{amount}`, `{days}`).
//! There is deliberately no general interpolation: the only
//! player-controlled input reaching a command string is the player name,
//! which must pass the restrictive charset check first.

use thiserror::Error;

use crate::models::product::{DeliveryStrategy, ExecutionConfig, FulfillmentKind, ItemSpec};
use shared::validation::validate_player_name;

/// Why a command batch could not be built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandBuildError {
    #[error("player name failed charset validation")]
    InvalidPlayerName,

    #[error("product has no command templates configured")]
    MissingTemplates,

    #[error("item product has no items configured")]
    MissingItems,

    #[error("'{0}' products are fulfilled manually")]
    ManualKind(FulfillmentKind),
}

/// Values available to placeholder substitution.
#[derive(Debug, Clone, Default)]
struct Substitutions<'a> {
    player: &'a str,
    quantity: i32,
    item_id: Option<&'a str>,
    amount: Option<i64>,
    days: Option<i32>,
}

fn substitute(template: &str, subs: &Substitutions<'_>) -> String {
    let mut out = template.replace("{player}", subs.player);
    out = out.replace("{quantity}", &subs.quantity.to_string());
    if let Some(item_id) = subs.item_id {
        out = out.replace("{item_id}", item_id);
    }
    if let Some(amount) = subs.amount {
        out = out.replace("{amount}", &amount.to_string());
    }
    if let Some(days) = subs.days {
        out = out.replace("{days}", &days.to_string());
    }
    out
}

fn expand_templates(
    templates: &[String],
    subs: &Substitutions<'_>,
    delivery: DeliveryStrategy,
) -> Vec<String> {
    match delivery {
        DeliveryStrategy::PerPurchase => {
            templates.iter().map(|t| substitute(t, subs)).collect()
        }
        DeliveryStrategy::PerUnit => {
            // The batch repeats per unit; each repetition sees quantity 1.
            let unit = Substitutions {
                quantity: 1,
                ..subs.clone()
            };
            (0..subs.quantity)
                .flat_map(|_| templates.iter().map(|t| substitute(t, &unit)))
                .collect()
        }
    }
}

/// Builds the ordered remote command batch for one purchase.
///
/// The `service` kind never reaches this function in the dispatch path;
/// calling it anyway reports `ManualKind` so misuse is loud.
pub fn build_commands(
    kind: FulfillmentKind,
    config: &ExecutionConfig,
    items: Option<&[ItemSpec]>,
    subscription_days: Option<i32>,
    player_name: &str,
    quantity: i32,
) -> Result<Vec<String>, CommandBuildError> {
    if validate_player_name(player_name).is_err() {
        return Err(CommandBuildError::InvalidPlayerName);
    }

    let subs = Substitutions {
        player: player_name,
        quantity,
        item_id: None,
        amount: None,
        days: subscription_days,
    };

    match kind {
        FulfillmentKind::Service => Err(CommandBuildError::ManualKind(kind)),

        FulfillmentKind::Whitelist => {
            if config.commands.is_empty() {
                Ok(vec![format!("whitelist add {}", player_name)])
            } else {
                Ok(expand_templates(&config.commands, &subs, config.delivery))
            }
        }

        FulfillmentKind::Item => {
            if !config.commands.is_empty() {
                return Ok(expand_templates(&config.commands, &subs, config.delivery));
            }
            let items = items
                .filter(|i| !i.is_empty())
                .ok_or(CommandBuildError::MissingItems)?;

            // Synthesized give commands scale the per-unit amount by the
            // purchased quantity.
            Ok(items
                .iter()
                .map(|item| {
                    format!(
                        "give {} {} {}",
                        player_name,
                        item.minecraft_id,
                        item.amount as i64 * quantity as i64
                    )
                })
                .collect())
        }

        FulfillmentKind::Subscription | FulfillmentKind::Rank | FulfillmentKind::Command => {
            if config.commands.is_empty() {
                return Err(CommandBuildError::MissingTemplates);
            }
            Ok(expand_templates(&config.commands, &subs, config.delivery))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(commands: &[&str]) -> ExecutionConfig {
        ExecutionConfig {
            server_id: None,
            commands: commands.iter().map(|s| s.to_string()).collect(),
            delivery: DeliveryStrategy::PerPurchase,
        }
    }

    #[test]
    fn test_whitelist_default_command() {
        let cmds = build_commands(
            FulfillmentKind::Whitelist,
            &ExecutionConfig::default(),
            None,
            None,
            "Steve",
            1,
        )
        .unwrap();
        assert_eq!(cmds, vec!["whitelist add Steve".to_string()]);
    }

    #[test]
    fn test_whitelist_custom_template_overrides_default() {
        let cmds = build_commands(
            FulfillmentKind::Whitelist,
            &config(&["easywl add {player}"]),
            None,
            None,
            "Steve",
            1,
        )
        .unwrap();
        assert_eq!(cmds, vec!["easywl add Steve".to_string()]);
    }

    #[test]
    fn test_item_synthesized_give_commands() {
        let items = vec![
            ItemSpec {
                minecraft_id: "minecraft:diamond".to_string(),
                amount: 3,
            },
            ItemSpec {
                minecraft_id: "minecraft:emerald".to_string(),
                amount: 1,
            },
        ];
        let cmds = build_commands(
            FulfillmentKind::Item,
            &ExecutionConfig::default(),
            Some(&items),
            None,
            "Alex",
            2,
        )
        .unwrap();
        assert_eq!(
            cmds,
            vec![
                "give Alex minecraft:diamond 6".to_string(),
                "give Alex minecraft:emerald 2".to_string(),
            ]
        );
    }

    #[test]
    fn test_item_without_items_or_templates_fails() {
        let err = build_commands(
            FulfillmentKind::Item,
            &ExecutionConfig::default(),
            None,
            None,
            "Alex",
            1,
        )
        .unwrap_err();
        assert_eq!(err, CommandBuildError::MissingItems);
    }

    #[test]
    fn test_subscription_substitutes_days() {
        let cmds = build_commands(
            FulfillmentKind::Subscription,
            &config(&["lp user {player} permission settemp vip true {days}d"]),
            None,
            Some(30),
            "Steve",
            1,
        )
        .unwrap();
        assert_eq!(
            cmds,
            vec!["lp user Steve permission settemp vip true 30d".to_string()]
        );
    }

    #[test]
    fn test_rank_requires_templates() {
        let err = build_commands(
            FulfillmentKind::Rank,
            &ExecutionConfig::default(),
            None,
            None,
            "Steve",
            1,
        )
        .unwrap_err();
        assert_eq!(err, CommandBuildError::MissingTemplates);
    }

    #[test]
    fn test_command_batch_preserves_order() {
        let cmds = build_commands(
            FulfillmentKind::Command,
            &config(&["first {player}", "second {player}", "third {quantity}"]),
            None,
            None,
            "Steve",
            4,
        )
        .unwrap();
        assert_eq!(
            cmds,
            vec![
                "first Steve".to_string(),
                "second Steve".to_string(),
                "third 4".to_string(),
            ]
        );
    }

    #[test]
    fn test_per_unit_delivery_repeats_batch() {
        let mut cfg = config(&["give {player} minecraft:cake {quantity}"]);
        cfg.delivery = DeliveryStrategy::PerUnit;

        let cmds = build_commands(FulfillmentKind::Command, &cfg, None, None, "Steve", 3).unwrap();
        assert_eq!(cmds.len(), 3);
        // Each repetition is a single unit.
        assert!(cmds.iter().all(|c| c == "give Steve minecraft:cake 1"));
    }

    #[test]
    fn test_service_kind_is_manual() {
        let err = build_commands(
            FulfillmentKind::Service,
            &ExecutionConfig::default(),
            None,
            None,
            "Steve",
            1,
        )
        .unwrap_err();
        assert_eq!(err, CommandBuildError::ManualKind(FulfillmentKind::Service));
    }

    #[test]
    fn test_injectable_player_name_rejected() {
        let err = build_commands(
            FulfillmentKind::Whitelist,
            &ExecutionConfig::default(),
            None,
            None,
            "Steve; op Steve",
            1,
        )
        .unwrap_err();
        assert_eq!(err, CommandBuildError::InvalidPlayerName);
    }

    #[test]
    fn test_unknown_placeholder_left_verbatim() {
        // Only the fixed placeholder set is substituted.
        let cmds = build_commands(
            FulfillmentKind::Command,
            &config(&["say {player} {unknown}"]),
            None,
            None,
            "Steve",
            1,
        )
        .unwrap();
        assert_eq!(cmds, vec!["say Steve {unknown}".to_string()]);
    }
}

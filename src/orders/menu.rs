// Menu catalogue lookup and legacy price normalisation

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

/// Primary menu entry
///
/// `price` is raw JSON: the catalogue was migrated from a document store and
/// contains both plain numbers and formatted strings ("25.000"). It is
/// normalised at read time by [`parse_price`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MenuEntry {
    pub id: Uuid,
    pub name: String,
    pub price: Json<serde_json::Value>,
    pub variants: Option<Json<Vec<MenuVariant>>>,
    pub created_at: DateTime<Utc>,
}

/// A variant embedded in a primary menu entry (e.g. sizes, flavours)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuVariant {
    pub id: Uuid,
    pub name: String,
    pub price: serde_json::Value,
}

/// Secondary catalogue entry, kept in its own table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MenuItem {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub price: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Where an order's item id was found in the catalogue
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedMenuItem {
    /// Matched a primary menu entry
    Menu { id: Uuid, name: String, price: Decimal },
    /// Matched a secondary catalogue entry
    Item { id: Uuid, name: String, price: Decimal },
    /// Matched a variant embedded in a primary entry
    Variant {
        id: Uuid,
        parent: String,
        name: String,
        price: Decimal,
    },
}

impl ResolvedMenuItem {
    pub fn price(&self) -> Decimal {
        match self {
            ResolvedMenuItem::Menu { price, .. } => *price,
            ResolvedMenuItem::Item { price, .. } => *price,
            ResolvedMenuItem::Variant { price, .. } => *price,
        }
    }

    /// Display label for bill lines; variants render as "parent - variant"
    pub fn display_name(&self) -> String {
        match self {
            ResolvedMenuItem::Menu { name, .. } => name.clone(),
            ResolvedMenuItem::Item { name, .. } => name.clone(),
            ResolvedMenuItem::Variant { parent, name, .. } => format!("{} - {}", parent, name),
        }
    }
}

/// Normalise a raw catalogue price into VND
///
/// Legacy shorthand: operators entered "25" meaning 25,000 VND, so positive
/// values below 1000 are scaled by 1000. String prices have thousands
/// separators ('.' or ',') stripped before parsing, then get the same
/// shorthand treatment. Anything unparseable becomes zero and is logged;
/// zero-price lines are skipped when pricing an order.
pub fn parse_price(raw: &serde_json::Value) -> Decimal {
    const SHORTHAND_THRESHOLD: Decimal = Decimal::ONE_THOUSAND;

    let parsed = match raw {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                n.as_f64().and_then(Decimal::from_f64_retain)
            }
        }
        serde_json::Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| *c != '.' && *c != ',').collect();
            cleaned.trim().parse::<Decimal>().ok()
        }
        _ => None,
    };

    match parsed {
        Some(value) if value > Decimal::ZERO && value < SHORTHAND_THRESHOLD => {
            value * SHORTHAND_THRESHOLD
        }
        Some(value) if value >= Decimal::ZERO => value,
        _ => {
            tracing::warn!("Unparseable menu price {:?}, treating as zero", raw);
            Decimal::ZERO
        }
    }
}

/// Id-indexed view of the whole catalogue
///
/// Resolution order: primary menu entry, then secondary catalogue entry, then
/// embedded variant by its own id.
pub struct MenuResolver {
    by_menu_id: HashMap<Uuid, (String, Decimal)>,
    by_item_id: HashMap<Uuid, (String, Decimal)>,
    by_variant_id: HashMap<Uuid, (String, String, Decimal)>,
}

impl MenuResolver {
    pub fn new(entries: &[MenuEntry], items: &[MenuItem]) -> Self {
        let mut by_menu_id = HashMap::new();
        let mut by_variant_id = HashMap::new();

        for entry in entries {
            by_menu_id.insert(entry.id, (entry.name.clone(), parse_price(&entry.price)));

            if let Some(variants) = &entry.variants {
                for variant in variants.iter() {
                    by_variant_id.insert(
                        variant.id,
                        (
                            entry.name.clone(),
                            variant.name.clone(),
                            parse_price(&variant.price),
                        ),
                    );
                }
            }
        }

        let by_item_id = items
            .iter()
            .map(|item| (item.id, (item.name.clone(), parse_price(&item.price))))
            .collect();

        Self {
            by_menu_id,
            by_item_id,
            by_variant_id,
        }
    }

    /// Resolve an order map key (a stringified catalogue id)
    pub fn resolve(&self, key: &str) -> Option<ResolvedMenuItem> {
        let id = Uuid::parse_str(key.trim()).ok()?;

        if let Some((name, price)) = self.by_menu_id.get(&id) {
            return Some(ResolvedMenuItem::Menu {
                id,
                name: name.clone(),
                price: *price,
            });
        }

        if let Some((name, price)) = self.by_item_id.get(&id) {
            return Some(ResolvedMenuItem::Item {
                id,
                name: name.clone(),
                price: *price,
            });
        }

        if let Some((parent, variant, price)) = self.by_variant_id.get(&id) {
            return Some(ResolvedMenuItem::Variant {
                id,
                parent: parent.clone(),
                name: variant.clone(),
                price: *price,
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_price_plain_number() {
        assert_eq!(parse_price(&json!(25000)), dec!(25000));
    }

    #[test]
    fn test_parse_price_shorthand_number() {
        assert_eq!(parse_price(&json!(25)), dec!(25000));
        assert_eq!(parse_price(&json!(999)), dec!(999000));
        assert_eq!(parse_price(&json!(1000)), dec!(1000));
    }

    #[test]
    fn test_parse_price_formatted_string() {
        assert_eq!(parse_price(&json!("25.000")), dec!(25000));
        assert_eq!(parse_price(&json!("1,500,000")), dec!(1500000));
    }

    #[test]
    fn test_parse_price_shorthand_string() {
        assert_eq!(parse_price(&json!("25")), dec!(25000));
    }

    #[test]
    fn test_parse_price_garbage_is_zero() {
        assert_eq!(parse_price(&json!("free")), Decimal::ZERO);
        assert_eq!(parse_price(&json!(null)), Decimal::ZERO);
        assert_eq!(parse_price(&json!([1, 2])), Decimal::ZERO);
        assert_eq!(parse_price(&json!(-5)), Decimal::ZERO);
    }

    #[test]
    fn test_parse_price_zero_stays_zero() {
        assert_eq!(parse_price(&json!(0)), Decimal::ZERO);
    }

    const MENU_ID: Uuid = Uuid::from_u128(1);
    const VARIANT_ID: Uuid = Uuid::from_u128(2);
    const ITEM_ID: Uuid = Uuid::from_u128(3);

    fn sample_resolver() -> MenuResolver {
        let entries = vec![MenuEntry {
            id: MENU_ID,
            name: "Tiger Beer".to_string(),
            price: Json(json!(20000)),
            variants: Some(Json(vec![MenuVariant {
                id: VARIANT_ID,
                name: "Crate".to_string(),
                price: json!(450),
            }])),
            created_at: Utc::now(),
        }];
        let items = vec![MenuItem {
            id: ITEM_ID,
            parent_id: None,
            name: "Dried Squid".to_string(),
            price: Json(json!("55.000")),
            created_at: Utc::now(),
        }];
        MenuResolver::new(&entries, &items)
    }

    #[test]
    fn test_resolver_primary_menu_first() {
        let resolver = sample_resolver();
        let resolved = resolver.resolve(&MENU_ID.to_string()).unwrap();
        assert_eq!(resolved.price(), dec!(20000));
        assert_eq!(resolved.display_name(), "Tiger Beer");
        assert!(matches!(resolved, ResolvedMenuItem::Menu { .. }));
    }

    #[test]
    fn test_resolver_secondary_catalogue() {
        let resolver = sample_resolver();
        let resolved = resolver.resolve(&ITEM_ID.to_string()).unwrap();
        assert_eq!(resolved.price(), dec!(55000));
        assert!(matches!(resolved, ResolvedMenuItem::Item { .. }));
    }

    #[test]
    fn test_resolver_embedded_variant() {
        let resolver = sample_resolver();
        let resolved = resolver.resolve(&VARIANT_ID.to_string()).unwrap();
        assert_eq!(resolved.price(), dec!(450000));
        assert_eq!(resolved.display_name(), "Tiger Beer - Crate");
    }

    #[test]
    fn test_resolver_unknown_or_malformed_key() {
        let resolver = sample_resolver();
        assert!(resolver.resolve(&Uuid::from_u128(99).to_string()).is_none());
        assert!(resolver.resolve("not-a-uuid").is_none());
    }
}

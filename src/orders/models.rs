use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

/// Item name to quantity map for one category of an order
pub type ItemMap = BTreeMap<String, i64>;

/// How incoming quantities combine with the stored order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Add incoming quantities to existing ones
    Add,
    /// Subtract incoming quantities; entries dropping to zero or below are removed
    Remove,
    /// Replace the stored maps with the incoming ones
    Set,
}

impl Default for MergeMode {
    fn default() -> Self {
        MergeMode::Add
    }
}

/// Domain model representing the food-and-beverage order of a session
///
/// At most one order exists per schedule; the unique index on schedule_id
/// makes the upsert race-safe.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FnbOrder {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub drinks: Json<ItemMap>,
    pub snacks: Json<ItemMap>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only snapshot of an order taken when a session completes
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderHistoryRecord {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub drinks: Json<ItemMap>,
    pub snacks: Json<ItemMap>,
    pub completed_by: Option<String>,
    pub bill_id: Option<Uuid>,
    pub completed_at: DateTime<Utc>,
}

/// Request DTO for upserting an order
#[derive(Debug, Deserialize, Validate)]
pub struct UpsertOrderRequest {
    #[serde(default)]
    pub drinks: ItemMap,
    #[serde(default)]
    pub snacks: ItemMap,
    #[serde(default)]
    pub mode: MergeMode,
    #[validate(length(max = 100))]
    pub actor: Option<String>,
}

/// Merge incoming quantities into an existing item map
///
/// Entries whose resulting quantity is zero or negative are removed; an order
/// never stores dead lines.
pub fn merge_items(current: &ItemMap, incoming: &ItemMap, mode: MergeMode) -> ItemMap {
    let mut result: ItemMap = match mode {
        MergeMode::Set => ItemMap::new(),
        MergeMode::Add | MergeMode::Remove => current.clone(),
    };

    for (name, qty) in incoming {
        let merged = match mode {
            MergeMode::Add => result.get(name).copied().unwrap_or(0) + qty,
            MergeMode::Remove => result.get(name).copied().unwrap_or(0) - qty,
            MergeMode::Set => *qty,
        };
        if merged > 0 {
            result.insert(name.clone(), merged);
        } else {
            result.remove(name);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, i64)]) -> ItemMap {
        entries.iter().map(|(n, q)| (n.to_string(), *q)).collect()
    }

    #[test]
    fn test_merge_add() {
        let current = map(&[("Cola", 2), ("Beer", 1)]);
        let incoming = map(&[("Cola", 3), ("Water", 1)]);
        let merged = merge_items(&current, &incoming, MergeMode::Add);
        assert_eq!(merged, map(&[("Cola", 5), ("Beer", 1), ("Water", 1)]));
    }

    #[test]
    fn test_merge_remove_drops_empty_entries() {
        let current = map(&[("Cola", 2), ("Beer", 1)]);
        let incoming = map(&[("Cola", 2), ("Beer", 5)]);
        let merged = merge_items(&current, &incoming, MergeMode::Remove);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_merge_remove_partial() {
        let current = map(&[("Cola", 5)]);
        let incoming = map(&[("Cola", 2)]);
        let merged = merge_items(&current, &incoming, MergeMode::Remove);
        assert_eq!(merged, map(&[("Cola", 3)]));
    }

    #[test]
    fn test_merge_set_replaces() {
        let current = map(&[("Cola", 5), ("Beer", 2)]);
        let incoming = map(&[("Water", 1)]);
        let merged = merge_items(&current, &incoming, MergeMode::Set);
        assert_eq!(merged, map(&[("Water", 1)]));
    }

    #[test]
    fn test_merge_set_skips_non_positive() {
        let current = map(&[("Cola", 5)]);
        let incoming = map(&[("Water", 0), ("Beer", -1)]);
        let merged = merge_items(&current, &incoming, MergeMode::Set);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_merge_mode_serde() {
        assert_eq!(
            serde_json::from_str::<MergeMode>("\"add\"").unwrap(),
            MergeMode::Add
        );
        assert_eq!(
            serde_json::from_str::<MergeMode>("\"set\"").unwrap(),
            MergeMode::Set
        );
    }
}

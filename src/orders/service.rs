use rust_decimal::Decimal;
use uuid::Uuid;

use crate::orders::error::OrderError;
use crate::orders::menu::MenuResolver;
use crate::orders::{
    merge_items, FnbOrder, FnbOrderRepository, ItemMap, MenuRepository, OrderHistoryRecord,
    OrderHistoryRepository, UpsertOrderRequest,
};
use crate::scheduling::ScheduleRepository;

/// A priced line of an order, ready for the bill
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
}

impl OrderLine {
    pub fn amount(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

/// Price every item of an order against the catalogue
///
/// Unknown items and zero-price items are skipped with a warning; a stale
/// catalogue must never block billing the rest of the order.
pub fn price_order(order: &FnbOrder, resolver: &MenuResolver) -> Vec<OrderLine> {
    let mut lines = Vec::new();

    for (name, qty) in order.drinks.iter().chain(order.snacks.iter()) {
        let Some(resolved) = resolver.resolve(name) else {
            tracing::warn!("Order item {:?} not found in catalogue, skipping", name);
            continue;
        };

        let unit_price = resolved.price();
        if unit_price <= Decimal::ZERO {
            tracing::warn!("Order item {:?} has zero price, skipping", name);
            continue;
        }

        lines.push(OrderLine {
            name: resolved.display_name(),
            quantity: *qty,
            unit_price,
        });
    }

    lines
}

/// Total value of an order's priced lines
pub fn order_total(lines: &[OrderLine]) -> Decimal {
    lines.iter().map(|line| line.amount()).sum()
}

/// Service for order business logic
#[derive(Clone)]
pub struct OrderService {
    menu_repo: MenuRepository,
    order_repo: FnbOrderRepository,
    history_repo: OrderHistoryRepository,
    schedule_repo: ScheduleRepository,
}

impl OrderService {
    /// Create a new OrderService
    pub fn new(
        menu_repo: MenuRepository,
        order_repo: FnbOrderRepository,
        history_repo: OrderHistoryRepository,
        schedule_repo: ScheduleRepository,
    ) -> Self {
        Self {
            menu_repo,
            order_repo,
            history_repo,
            schedule_repo,
        }
    }

    /// Build a name-indexed resolver over the whole catalogue
    pub async fn build_resolver(&self) -> Result<MenuResolver, OrderError> {
        let entries = self.menu_repo.load_entries().await?;
        let items = self.menu_repo.load_items().await?;
        Ok(MenuResolver::new(&entries, &items))
    }

    /// Merge incoming quantities into the schedule's order and persist
    ///
    /// # Validation
    /// - The schedule must exist and not be in a terminal status
    /// - Quantities dropping to zero or below remove the entry
    pub async fn upsert_order(
        &self,
        schedule_id: Uuid,
        request: UpsertOrderRequest,
    ) -> Result<FnbOrder, OrderError> {
        let schedule = self
            .schedule_repo
            .find_by_id(schedule_id)
            .await
            .map_err(|e| OrderError::DatabaseError(e.to_string()))?
            .ok_or(OrderError::ScheduleNotFound)?;

        if schedule.status.is_terminal() {
            return Err(OrderError::ScheduleClosed(schedule.status.to_string()));
        }

        let current = self.order_repo.find_by_schedule(schedule_id).await?;
        let (current_drinks, current_snacks) = match &current {
            Some(order) => (order.drinks.0.clone(), order.snacks.0.clone()),
            None => (ItemMap::new(), ItemMap::new()),
        };

        let drinks = merge_items(&current_drinks, &request.drinks, request.mode);
        let snacks = merge_items(&current_snacks, &request.snacks, request.mode);

        let order = self
            .order_repo
            .upsert(schedule_id, &drinks, &snacks, request.actor.as_deref())
            .await?;

        tracing::debug!(
            "Order for schedule {} now has {} drink and {} snack lines",
            schedule_id,
            order.drinks.0.len(),
            order.snacks.0.len()
        );

        Ok(order)
    }

    /// Fetch the order for a schedule
    pub async fn get_order(&self, schedule_id: Uuid) -> Result<FnbOrder, OrderError> {
        self.order_repo
            .find_by_schedule(schedule_id)
            .await?
            .ok_or(OrderError::NotFound)
    }

    /// Snapshot a schedule's order into the history
    ///
    /// Skipped when an identical snapshot (same schedule and bill) already
    /// exists, so re-printing a bill never duplicates history rows.
    pub async fn complete_order(
        &self,
        schedule_id: Uuid,
        completed_by: Option<&str>,
        bill_id: Option<Uuid>,
    ) -> Result<Option<OrderHistoryRecord>, OrderError> {
        let Some(order) = self.order_repo.find_by_schedule(schedule_id).await? else {
            return Ok(None);
        };

        if self.history_repo.exists(schedule_id, bill_id).await? {
            tracing::debug!(
                "Order history for schedule {} already recorded, skipping",
                schedule_id
            );
            return Ok(None);
        }

        let record = self
            .history_repo
            .append(schedule_id, &order.drinks.0, &order.snacks.0, completed_by, bill_id)
            .await?;

        Ok(Some(record))
    }

    /// List order history snapshots for a schedule
    pub async fn get_history(
        &self,
        schedule_id: Uuid,
    ) -> Result<Vec<OrderHistoryRecord>, OrderError> {
        self.history_repo.find_by_schedule(schedule_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::menu::{MenuEntry, MenuItem};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use sqlx::types::Json;

    const COLA_ID: Uuid = Uuid::from_u128(10);
    const BROKEN_ID: Uuid = Uuid::from_u128(11);
    const PEANUTS_ID: Uuid = Uuid::from_u128(12);

    fn resolver() -> MenuResolver {
        let entries = vec![
            MenuEntry {
                id: COLA_ID,
                name: "Cola".to_string(),
                price: Json(json!(15000)),
                variants: None,
                created_at: Utc::now(),
            },
            MenuEntry {
                id: BROKEN_ID,
                name: "Broken Item".to_string(),
                price: Json(json!("n/a")),
                variants: None,
                created_at: Utc::now(),
            },
        ];
        let items = vec![MenuItem {
            id: PEANUTS_ID,
            parent_id: None,
            name: "Peanuts".to_string(),
            price: Json(json!(20)),
            created_at: Utc::now(),
        }];
        MenuResolver::new(&entries, &items)
    }

    fn order(drinks: &[(Uuid, i64)], snacks: &[(Uuid, i64)]) -> FnbOrder {
        FnbOrder {
            id: Uuid::new_v4(),
            schedule_id: Uuid::new_v4(),
            drinks: Json(drinks.iter().map(|(n, q)| (n.to_string(), *q)).collect()),
            snacks: Json(snacks.iter().map(|(n, q)| (n.to_string(), *q)).collect()),
            created_by: None,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_price_order_sums_both_categories() {
        let order = order(&[(COLA_ID, 2)], &[(PEANUTS_ID, 1)]);
        let lines = price_order(&order, &resolver());
        assert_eq!(lines.len(), 2);
        assert_eq!(order_total(&lines), dec!(50000));
    }

    #[test]
    fn test_price_order_skips_unknown_items() {
        let order = order(&[(Uuid::from_u128(99), 3)], &[]);
        let lines = price_order(&order, &resolver());
        assert!(lines.is_empty());
        assert_eq!(order_total(&lines), Decimal::ZERO);
    }

    #[test]
    fn test_price_order_skips_zero_price_items() {
        let order = order(&[(BROKEN_ID, 1), (COLA_ID, 1)], &[]);
        let lines = price_order(&order, &resolver());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "Cola");
    }

    #[test]
    fn test_shorthand_price_in_totals() {
        // Peanuts are stored as 20, meaning 20,000 VND
        let order = order(&[], &[(PEANUTS_ID, 2)]);
        let lines = price_order(&order, &resolver());
        assert_eq!(order_total(&lines), dec!(40000));
    }
}

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::orders::error::OrderError;
use crate::orders::menu::{MenuEntry, MenuItem};
use crate::orders::{FnbOrder, ItemMap, OrderHistoryRecord};

/// Repository for menu catalogue reads
#[derive(Clone)]
pub struct MenuRepository {
    pool: PgPool,
}

impl MenuRepository {
    /// Create a new MenuRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load all primary menu entries
    pub async fn load_entries(&self) -> Result<Vec<MenuEntry>, OrderError> {
        let entries = sqlx::query_as::<_, MenuEntry>(
            "SELECT id, name, price, variants, created_at FROM fnb_menu ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Load all secondary catalogue entries
    pub async fn load_items(&self) -> Result<Vec<MenuItem>, OrderError> {
        let items = sqlx::query_as::<_, MenuItem>(
            "SELECT id, parent_id, name, price, created_at FROM fnb_menu_items ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

/// Repository for per-schedule order rows
#[derive(Clone)]
pub struct FnbOrderRepository {
    pool: PgPool,
}

const ORDER_COLUMNS: &str =
    "id, schedule_id, drinks, snacks, created_by, updated_by, created_at, updated_at";

impl FnbOrderRepository {
    /// Create a new FnbOrderRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the order belonging to a schedule
    pub async fn find_by_schedule(
        &self,
        schedule_id: Uuid,
    ) -> Result<Option<FnbOrder>, OrderError> {
        let order = sqlx::query_as::<_, FnbOrder>(&format!(
            "SELECT {ORDER_COLUMNS} FROM fnb_orders WHERE schedule_id = $1"
        ))
        .bind(schedule_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Write the merged item maps for a schedule
    ///
    /// The unique index on schedule_id turns a concurrent double-insert into
    /// an update of the same row.
    pub async fn upsert(
        &self,
        schedule_id: Uuid,
        drinks: &ItemMap,
        snacks: &ItemMap,
        actor: Option<&str>,
    ) -> Result<FnbOrder, OrderError> {
        let order = sqlx::query_as::<_, FnbOrder>(&format!(
            r#"
            INSERT INTO fnb_orders (schedule_id, drinks, snacks, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (schedule_id) DO UPDATE
            SET drinks = EXCLUDED.drinks,
                snacks = EXCLUDED.snacks,
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(schedule_id)
        .bind(Json(drinks))
        .bind(Json(snacks))
        .bind(actor)
        .fetch_one(&self.pool)
        .await?;

        Ok(order)
    }

    /// Remove the order for a schedule
    pub async fn delete_by_schedule(&self, schedule_id: Uuid) -> Result<(), OrderError> {
        sqlx::query("DELETE FROM fnb_orders WHERE schedule_id = $1")
            .bind(schedule_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Repository for the append-only order history
#[derive(Clone)]
pub struct OrderHistoryRepository {
    pool: PgPool,
}

impl OrderHistoryRepository {
    /// Create a new OrderHistoryRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a snapshot of a completed order
    pub async fn append(
        &self,
        schedule_id: Uuid,
        drinks: &ItemMap,
        snacks: &ItemMap,
        completed_by: Option<&str>,
        bill_id: Option<Uuid>,
    ) -> Result<OrderHistoryRecord, OrderError> {
        let record = sqlx::query_as::<_, OrderHistoryRecord>(
            r#"
            INSERT INTO fnb_order_history (schedule_id, drinks, snacks, completed_by, bill_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, schedule_id, drinks, snacks, completed_by, bill_id, completed_at
            "#,
        )
        .bind(schedule_id)
        .bind(Json(drinks))
        .bind(Json(snacks))
        .bind(completed_by)
        .bind(bill_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Check whether a snapshot for this schedule and bill already exists
    pub async fn exists(
        &self,
        schedule_id: Uuid,
        bill_id: Option<Uuid>,
    ) -> Result<bool, OrderError> {
        let exists: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM fnb_order_history
                WHERE schedule_id = $1 AND bill_id IS NOT DISTINCT FROM $2
            )
            "#,
        )
        .bind(schedule_id)
        .bind(bill_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.unwrap_or(false))
    }

    /// List snapshots for a schedule, newest first
    pub async fn find_by_schedule(
        &self,
        schedule_id: Uuid,
    ) -> Result<Vec<OrderHistoryRecord>, OrderError> {
        let records = sqlx::query_as::<_, OrderHistoryRecord>(
            r#"
            SELECT id, schedule_id, drinks, snacks, completed_by, bill_id, completed_at
            FROM fnb_order_history
            WHERE schedule_id = $1
            ORDER BY completed_at DESC
            "#,
        )
        .bind(schedule_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

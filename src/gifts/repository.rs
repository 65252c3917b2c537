use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::gifts::error::GiftError;
use crate::gifts::{Gift, GiftBundleItem, GiftType, ScheduleGift};

const GIFT_COLUMNS: &str = "id, name, gift_type, discount_percentage, discount_amount, \
    items, total_quantity, remaining_quantity, is_active, created_at, updated_at";

/// Repository for gift operations
#[derive(Clone)]
pub struct GiftRepository {
    pool: PgPool,
}

impl GiftRepository {
    /// Create a new GiftRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new gift
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        name: String,
        gift_type: GiftType,
        discount_percentage: Option<Decimal>,
        discount_amount: Option<Decimal>,
        items: Option<Vec<GiftBundleItem>>,
        total_quantity: i32,
        is_active: bool,
    ) -> Result<Gift, GiftError> {
        let gift = sqlx::query_as::<_, Gift>(&format!(
            r#"
            INSERT INTO gifts
                (name, gift_type, discount_percentage, discount_amount, items,
                 total_quantity, remaining_quantity, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $6, $7)
            RETURNING {GIFT_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(gift_type)
        .bind(discount_percentage)
        .bind(discount_amount)
        .bind(items.map(Json))
        .bind(total_quantity)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(gift)
    }

    /// Find a gift by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Gift>, GiftError> {
        let gift = sqlx::query_as::<_, Gift>(&format!(
            "SELECT {GIFT_COLUMNS} FROM gifts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(gift)
    }

    /// List all gifts, newest first
    pub async fn find_all(&self) -> Result<Vec<Gift>, GiftError> {
        let gifts = sqlx::query_as::<_, Gift>(&format!(
            "SELECT {GIFT_COLUMNS} FROM gifts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(gifts)
    }

    /// List gifts that can still be won
    pub async fn find_claimable(&self) -> Result<Vec<Gift>, GiftError> {
        let gifts = sqlx::query_as::<_, Gift>(&format!(
            r#"
            SELECT {GIFT_COLUMNS}
            FROM gifts
            WHERE is_active = TRUE AND remaining_quantity > 0
            ORDER BY created_at
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(gifts)
    }

    /// Update a gift's fields
    ///
    /// A change to total_quantity shifts remaining_quantity by the same delta,
    /// clamped at zero, so already-claimed stock is preserved.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<String>,
        discount_percentage: Option<Decimal>,
        discount_amount: Option<Decimal>,
        items: Option<Vec<GiftBundleItem>>,
        total_quantity: Option<i32>,
        is_active: Option<bool>,
    ) -> Result<Gift, GiftError> {
        let gift = sqlx::query_as::<_, Gift>(&format!(
            r#"
            UPDATE gifts
            SET name = COALESCE($2, name),
                discount_percentage = COALESCE($3, discount_percentage),
                discount_amount = COALESCE($4, discount_amount),
                items = COALESCE($5, items),
                remaining_quantity = GREATEST(
                    remaining_quantity + COALESCE($6, total_quantity) - total_quantity, 0),
                total_quantity = COALESCE($6, total_quantity),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {GIFT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(discount_percentage)
        .bind(discount_amount)
        .bind(items.map(Json))
        .bind(total_quantity)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(GiftError::NotFound)?;

        Ok(gift)
    }

    /// Delete a gift
    pub async fn delete(&self, id: Uuid) -> Result<(), GiftError> {
        let result = sqlx::query("DELETE FROM gifts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(GiftError::NotFound);
        }

        Ok(())
    }

    /// Atomically take one unit of a gift's stock
    ///
    /// Returns false when the stock was already exhausted by a concurrent claim.
    pub async fn take_stock(&self, id: Uuid) -> Result<bool, GiftError> {
        let result = sqlx::query(
            r#"
            UPDATE gifts
            SET remaining_quantity = remaining_quantity - 1, updated_at = NOW()
            WHERE id = $1 AND remaining_quantity > 0
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Return one unit of stock after a lost claim race
    pub async fn return_stock(&self, id: Uuid) -> Result<(), GiftError> {
        sqlx::query(
            r#"
            UPDATE gifts
            SET remaining_quantity = LEAST(remaining_quantity + 1, total_quantity),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Attach a claimed gift to a schedule
    ///
    /// Only succeeds when gifts are still enabled and nothing has been claimed
    /// yet; the WHERE clause is the atomicity guard against double claims.
    pub async fn attach_to_schedule(
        &self,
        schedule_id: Uuid,
        gift: &ScheduleGift,
    ) -> Result<bool, GiftError> {
        let result = sqlx::query(
            r#"
            UPDATE room_schedules
            SET gift = $2, gift_enabled = FALSE, updated_at = NOW()
            WHERE id = $1 AND gift_enabled = TRUE AND gift IS NULL
            "#,
        )
        .bind(schedule_id)
        .bind(Json(gift))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

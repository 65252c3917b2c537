use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::billing::error::BillingError;
use crate::billing::{Bill, BillRecord, DayType, PriceTable, Promotion, TimeSlot};

/// Repository for price table reads
#[derive(Clone)]
pub struct PriceRepository {
    pool: PgPool,
}

impl PriceRepository {
    /// Create a new PriceRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load every day-type's slot table
    pub async fn load_tables(&self) -> Result<HashMap<DayType, Vec<TimeSlot>>, BillingError> {
        let rows = sqlx::query_as::<_, PriceTable>(
            "SELECT day_type, time_slots FROM price_tables",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.day_type, row.time_slots.0))
            .collect())
    }
}

/// Repository for holiday reads
#[derive(Clone)]
pub struct HolidayRepository {
    pool: PgPool,
}

impl HolidayRepository {
    /// Create a new HolidayRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load all holiday dates
    pub async fn load_dates(&self) -> Result<HashSet<NaiveDate>, BillingError> {
        let dates: Vec<NaiveDate> = sqlx::query_scalar("SELECT date FROM holidays")
            .fetch_all(&self.pool)
            .await?;

        Ok(dates.into_iter().collect())
    }
}

/// Repository for promotion reads
#[derive(Clone)]
pub struct PromotionRepository {
    pool: PgPool,
}

const PROMOTION_COLUMNS: &str =
    "id, name, discount_percentage, applies_to, applies_to_id, is_active";

impl PromotionRepository {
    /// Create a new PromotionRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a promotion by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Promotion>, BillingError> {
        let promotion = sqlx::query_as::<_, Promotion>(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(promotion)
    }

    /// List all active promotions
    pub async fn find_active(&self) -> Result<Vec<Promotion>, BillingError> {
        let promotions = sqlx::query_as::<_, Promotion>(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotions WHERE is_active = TRUE ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(promotions)
    }
}

/// Repository for persisted bills
#[derive(Clone)]
pub struct BillRepository {
    pool: PgPool,
}

const BILL_COLUMNS: &str = "id, schedule_id, room_id, items, total_amount, start_time, \
    end_time, invoice_code, payment_method, active_promotion, free_hour, gift, fnb_order, \
    created_at";

impl BillRepository {
    /// Create a new BillRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a computed bill, one row per schedule
    ///
    /// The unique constraint on schedule_id makes a re-save an update of the
    /// existing row rather than a duplicate insert. A payment method already
    /// recorded is never cleared by a later save without one.
    pub async fn upsert(
        &self,
        bill: &Bill,
        fnb_order: Option<serde_json::Value>,
    ) -> Result<BillRecord, BillingError> {
        let record = sqlx::query_as::<_, BillRecord>(&format!(
            r#"
            INSERT INTO bills
                (schedule_id, room_id, items, total_amount, start_time, end_time,
                 invoice_code, payment_method, active_promotion, free_hour, gift, fnb_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (schedule_id) DO UPDATE
            SET items = EXCLUDED.items,
                total_amount = EXCLUDED.total_amount,
                start_time = EXCLUDED.start_time,
                end_time = EXCLUDED.end_time,
                invoice_code = EXCLUDED.invoice_code,
                payment_method = COALESCE(EXCLUDED.payment_method, bills.payment_method),
                active_promotion = EXCLUDED.active_promotion,
                free_hour = EXCLUDED.free_hour,
                gift = EXCLUDED.gift,
                fnb_order = EXCLUDED.fnb_order
            RETURNING {BILL_COLUMNS}
            "#
        ))
        .bind(bill.schedule_id)
        .bind(bill.room_id)
        .bind(Json(&bill.items))
        .bind(bill.total_amount)
        .bind(bill.start_time)
        .bind(bill.end_time)
        .bind(&bill.invoice_code)
        .bind(&bill.payment_method)
        .bind(bill.promotion.as_ref().map(Json))
        .bind(bill.free_hour.as_ref().map(Json))
        .bind(bill.gift.as_ref().map(Json))
        .bind(fnb_order.map(Json))
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// All persisted rows for one schedule, paid-first then newest-first
    ///
    /// The unique constraint keeps this to one row for new data; legacy rows
    /// predating the constraint can still be plural, so callers take the
    /// first entry as the canonical bill.
    pub async fn find_by_schedule(
        &self,
        schedule_id: Uuid,
    ) -> Result<Vec<BillRecord>, BillingError> {
        let records = sqlx::query_as::<_, BillRecord>(&format!(
            r#"
            SELECT {BILL_COLUMNS}
            FROM bills
            WHERE schedule_id = $1
            ORDER BY (payment_method IS NOT NULL) DESC, created_at DESC
            "#
        ))
        .bind(schedule_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Bills whose session started in [from, to)
    pub async fn find_started_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BillRecord>, BillingError> {
        let records = sqlx::query_as::<_, BillRecord>(&format!(
            r#"
            SELECT {BILL_COLUMNS}
            FROM bills
            WHERE start_time >= $1 AND start_time < $2
            ORDER BY start_time
            "#
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Record the payment method on a persisted bill
    pub async fn set_payment_method(
        &self,
        id: Uuid,
        payment_method: &str,
    ) -> Result<BillRecord, BillingError> {
        let record = sqlx::query_as::<_, BillRecord>(&format!(
            r#"
            UPDATE bills
            SET payment_method = $2
            WHERE id = $1
            RETURNING {BILL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payment_method)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(BillingError::BillNotFound)?;

        Ok(record)
    }

    /// Load every persisted bill (used by duplicate cleanup)
    pub async fn find_all(&self) -> Result<Vec<BillRecord>, BillingError> {
        let records = sqlx::query_as::<_, BillRecord>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Delete a set of bills by id
    pub async fn delete_ids(&self, ids: &[Uuid]) -> Result<u64, BillingError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM bills WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete bills whose schedule never reached the finished status
    pub async fn delete_non_finished(&self) -> Result<u64, BillingError> {
        let result = sqlx::query(
            r#"
            DELETE FROM bills b
            USING room_schedules s
            WHERE b.schedule_id = s.id AND s.status != 'finished'
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

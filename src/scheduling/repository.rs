use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::scheduling::error::ScheduleError;
use crate::scheduling::{RoomSchedule, ScheduleStatus};

/// Repository for room schedule operations
#[derive(Clone)]
pub struct ScheduleRepository {
    pool: PgPool,
}

const SCHEDULE_COLUMNS: &str = "id, room_id, start_time, end_time, status, note, \
    customer_name, customer_phone, gift_enabled, apply_free_hour_promo, gift, \
    created_at, updated_at";

impl ScheduleRepository {
    /// Create a new ScheduleRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new schedule row
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        room_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        note: Option<String>,
        customer_name: Option<String>,
        customer_phone: Option<String>,
        gift_enabled: bool,
        apply_free_hour_promo: bool,
    ) -> Result<RoomSchedule, ScheduleError> {
        let schedule = sqlx::query_as::<_, RoomSchedule>(&format!(
            r#"
            INSERT INTO room_schedules
                (room_id, start_time, end_time, status, note, customer_name,
                 customer_phone, gift_enabled, apply_free_hour_promo)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {SCHEDULE_COLUMNS}
            "#
        ))
        .bind(room_id)
        .bind(start_time)
        .bind(end_time)
        .bind(ScheduleStatus::Booked)
        .bind(note)
        .bind(customer_name)
        .bind(customer_phone)
        .bind(gift_enabled)
        .bind(apply_free_hour_promo)
        .fetch_one(&self.pool)
        .await?;

        Ok(schedule)
    }

    /// Find a schedule by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<RoomSchedule>, ScheduleError> {
        let schedule = sqlx::query_as::<_, RoomSchedule>(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM room_schedules WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(schedule)
    }

    /// List schedules for a room, newest first
    pub async fn find_by_room(&self, room_id: Uuid) -> Result<Vec<RoomSchedule>, ScheduleError> {
        let schedules = sqlx::query_as::<_, RoomSchedule>(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS}
            FROM room_schedules
            WHERE room_id = $1
            ORDER BY start_time DESC
            "#
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(schedules)
    }

    /// List schedules whose session start falls in [from, to)
    pub async fn find_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<RoomSchedule>, ScheduleError> {
        let schedules = sqlx::query_as::<_, RoomSchedule>(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS}
            FROM room_schedules
            WHERE start_time >= $1 AND start_time < $2
            ORDER BY start_time
            "#
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(schedules)
    }

    /// Update mutable fields of a schedule
    ///
    /// Terminal rows are never matched; the WHERE clause excludes them so a
    /// concurrent finish cannot be overwritten.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: Uuid,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
        note: Option<String>,
        customer_name: Option<String>,
        customer_phone: Option<String>,
        gift_enabled: Option<bool>,
        apply_free_hour_promo: Option<bool>,
    ) -> Result<Option<RoomSchedule>, ScheduleError> {
        let schedule = sqlx::query_as::<_, RoomSchedule>(&format!(
            r#"
            UPDATE room_schedules
            SET start_time = COALESCE($2, start_time),
                end_time = COALESCE($3, end_time),
                note = COALESCE($4, note),
                customer_name = COALESCE($5, customer_name),
                customer_phone = COALESCE($6, customer_phone),
                gift_enabled = COALESCE($7, gift_enabled),
                apply_free_hour_promo = COALESCE($8, apply_free_hour_promo),
                updated_at = NOW()
            WHERE id = $1 AND status NOT IN ('finished', 'cancelled')
            RETURNING {SCHEDULE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(start_time)
        .bind(end_time)
        .bind(note)
        .bind(customer_name)
        .bind(customer_phone)
        .bind(gift_enabled)
        .bind(apply_free_hour_promo)
        .fetch_optional(&self.pool)
        .await?;

        Ok(schedule)
    }

    /// Delete a schedule row
    ///
    /// Returns false when no row matched. Bills and orders for the schedule
    /// are removed by the ON DELETE CASCADE on their foreign keys.
    pub async fn delete(&self, id: Uuid) -> Result<bool, ScheduleError> {
        let result = sqlx::query("DELETE FROM room_schedules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Update schedule status
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: ScheduleStatus,
    ) -> Result<RoomSchedule, ScheduleError> {
        let schedule = sqlx::query_as::<_, RoomSchedule>(&format!(
            r#"
            UPDATE room_schedules
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {SCHEDULE_COLUMNS}
            "#
        ))
        .bind(new_status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ScheduleError::NotFound)?;

        Ok(schedule)
    }
}

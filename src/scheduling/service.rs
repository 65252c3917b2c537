use chrono::{DateTime, Duration, Timelike, Utc};
use uuid::Uuid;

use crate::scheduling::error::ScheduleError;
use crate::scheduling::{
    CreateScheduleRequest, RoomSchedule, ScheduleRepository, ScheduleStatus, StatusMachine,
    UpdateScheduleRequest,
};

/// Longest bookable session
const MAX_SESSION_HOURS: i64 = 8;

/// Service for schedule business logic
#[derive(Clone)]
pub struct ScheduleService {
    repo: ScheduleRepository,
    pool: sqlx::PgPool,
}

/// Truncate a timestamp to minute granularity
///
/// Bookings are compared at minute precision so stray seconds in client input
/// never flip an ordering check.
pub fn truncate_to_minute(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

impl ScheduleService {
    /// Create a new ScheduleService
    pub fn new(repo: ScheduleRepository, pool: sqlx::PgPool) -> Self {
        Self { repo, pool }
    }

    /// Create a new booking
    ///
    /// # Validation
    /// - The room must exist
    /// - end_time (when given) must not precede start_time at minute granularity
    /// - The session may not exceed 8 hours
    pub async fn create_schedule(
        &self,
        request: CreateScheduleRequest,
    ) -> Result<RoomSchedule, ScheduleError> {
        let room_exists: Option<bool> =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM rooms WHERE id = $1)")
                .bind(request.room_id)
                .fetch_one(&self.pool)
                .await?;

        if !room_exists.unwrap_or(false) {
            return Err(ScheduleError::RoomNotFound(request.room_id.to_string()));
        }

        let start = truncate_to_minute(request.start_time);
        let end = request.end_time.map(truncate_to_minute);

        if let Some(end) = end {
            if end < start {
                return Err(ScheduleError::ValidationError(
                    "end_time must not precede start_time".to_string(),
                ));
            }
            if end - start > Duration::hours(MAX_SESSION_HOURS) {
                return Err(ScheduleError::ValidationError(format!(
                    "Session may not exceed {} hours",
                    MAX_SESSION_HOURS
                )));
            }
        }

        let schedule = self
            .repo
            .create(
                request.room_id,
                start,
                end,
                request.note,
                request.customer_name,
                request.customer_phone,
                request.gift_enabled,
                request.apply_free_hour_promo,
            )
            .await?;

        tracing::info!(
            "Created schedule {} for room {} starting {}",
            schedule.id,
            schedule.room_id,
            schedule.start_time
        );

        Ok(schedule)
    }

    /// Fetch a schedule by ID
    pub async fn get_schedule(&self, id: Uuid) -> Result<RoomSchedule, ScheduleError> {
        self.repo.find_by_id(id).await?.ok_or(ScheduleError::NotFound)
    }

    /// List schedules for a room
    pub async fn get_room_schedules(&self, room_id: Uuid) -> Result<Vec<RoomSchedule>, ScheduleError> {
        self.repo.find_by_room(room_id).await
    }

    /// Update a schedule's mutable fields
    ///
    /// Schedules in a terminal status (finished, cancelled) are immutable.
    pub async fn update_schedule(
        &self,
        id: Uuid,
        request: UpdateScheduleRequest,
    ) -> Result<RoomSchedule, ScheduleError> {
        let current = self.repo.find_by_id(id).await?.ok_or(ScheduleError::NotFound)?;

        if current.status.is_terminal() {
            return Err(ScheduleError::Immutable(current.status.to_string()));
        }

        let start = request
            .start_time
            .map(truncate_to_minute)
            .unwrap_or_else(|| truncate_to_minute(current.start_time));
        let end = request
            .end_time
            .map(truncate_to_minute)
            .or_else(|| current.end_time.map(truncate_to_minute));

        if let Some(end) = end {
            if end < start {
                return Err(ScheduleError::ValidationError(
                    "end_time must not precede start_time".to_string(),
                ));
            }
            if end - start > Duration::hours(MAX_SESSION_HOURS) {
                return Err(ScheduleError::ValidationError(format!(
                    "Session may not exceed {} hours",
                    MAX_SESSION_HOURS
                )));
            }
        }

        self.repo
            .update(
                id,
                request.start_time.map(truncate_to_minute),
                request.end_time.map(truncate_to_minute),
                request.note,
                request.customer_name,
                request.customer_phone,
                request.gift_enabled,
                request.apply_free_hour_promo,
            )
            .await?
            .ok_or_else(|| ScheduleError::Immutable(current.status.to_string()))
    }

    /// Delete a schedule
    ///
    /// An in-use schedule has a live session and must be finished or
    /// cancelled before it can be removed.
    pub async fn delete_schedule(&self, id: Uuid) -> Result<(), ScheduleError> {
        let current = self.repo.find_by_id(id).await?.ok_or(ScheduleError::NotFound)?;

        if current.status == ScheduleStatus::InUse {
            return Err(ScheduleError::ValidationError(
                "An in-use schedule cannot be deleted".to_string(),
            ));
        }

        if !self.repo.delete(id).await? {
            return Err(ScheduleError::NotFound);
        }

        tracing::info!("Deleted schedule {}", id);

        Ok(())
    }

    /// Transition a schedule to a new status
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: ScheduleStatus,
    ) -> Result<RoomSchedule, ScheduleError> {
        let current = self.repo.find_by_id(id).await?.ok_or(ScheduleError::NotFound)?;

        StatusMachine::transition(current.status, new_status)
            .map_err(ScheduleError::InvalidTransition)?;

        let updated = self.repo.update_status(id, new_status).await?;

        tracing::info!(
            "Schedule {} transitioned from {} to {}",
            id,
            current.status,
            new_status
        );

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate_to_minute() {
        let t = Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 45).unwrap();
        let truncated = truncate_to_minute(t);
        assert_eq!(truncated, Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap());
    }

    #[test]
    fn test_truncate_is_idempotent() {
        let t = Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap();
        assert_eq!(truncate_to_minute(t), t);
    }
}

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::billing::error::BillingError;
use crate::billing::repository::{
    BillRepository, HolidayRepository, PriceRepository, PromotionRepository,
};
use crate::billing::session::{
    apply_free_hour, duration_minutes, free_hour_eligible, partition_session, PricingContext,
    Segment,
};
use crate::billing::{
    invoice_code, AppliedGift, AppliedPromotion, Bill, BillItem, BillRecord, FreeHourDetail,
    Promotion, SERVICE_LABEL, VENUE_TZ,
};
use crate::gifts::{GiftType, ScheduleGift};
use crate::models::Room;
use crate::orders::{order_total, price_order, FnbOrderRepository, OrderLine, OrderService};
use crate::scheduling::{RoomSchedule, ScheduleRepository};

/// Optional overrides accepted when computing a bill
///
/// Actual times accept either a bare venue-local wall clock ("21:30", placed
/// on the session's start date) or a full RFC 3339 datetime.
#[derive(Debug, Default, Deserialize)]
pub struct BillQuery {
    pub actual_start_time: Option<String>,
    pub actual_end_time: Option<String>,
    pub apply_free_hour_promotion: Option<bool>,
    pub promotion_id: Option<Uuid>,
    pub payment_method: Option<String>,
}

impl BillQuery {
    /// Free-hour flag for this request, falling back to the schedule's setting
    fn free_hour_flag(&self, schedule: &RoomSchedule) -> bool {
        self.apply_free_hour_promotion
            .unwrap_or(schedule.apply_free_hour_promo)
    }
}

/// Reporting period for revenue summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevenuePeriod {
    Day,
    Week,
    Month,
}

/// Revenue summed over a time range
#[derive(Debug, Clone, serde::Serialize)]
pub struct RevenueReport {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub bill_count: usize,
    pub total: Decimal,
}

const THOUSAND: Decimal = Decimal::ONE_THOUSAND;
const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Round a charge down to the nearest 1000 VND, clamped at zero
fn floor_to_thousand(value: Decimal) -> Decimal {
    ((value / THOUSAND).floor() * THOUSAND).max(Decimal::ZERO)
}

/// Lenient venue wall-clock parse ("9:30" and "09:30" both accepted)
fn parse_wall_clock(raw: &str) -> Option<(u32, u32)> {
    let (h, m) = raw.trim().split_once(':')?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return None;
    }
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    (h <= 23 && m <= 59).then_some((h, m))
}

/// A UTC instant from a venue-local date and wall clock
fn local_instant(date: NaiveDate, hour: u32, minute: u32) -> Result<DateTime<Utc>, BillingError> {
    let naive = date
        .and_hms_opt(hour, minute, 0)
        .ok_or_else(|| BillingError::InvalidTime(format!("{:02}:{:02} on {}", hour, minute, date)))?;

    VENUE_TZ
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| BillingError::InvalidTime(format!("{} is not a valid local time", naive)))
}

/// Interpret one actual-time override against the session's start date
fn parse_time_override(raw: &str, base_date: NaiveDate) -> Result<DateTime<Utc>, BillingError> {
    if let Some((hour, minute)) = parse_wall_clock(raw) {
        return local_instant(base_date, hour, minute);
    }

    DateTime::parse_from_rfc3339(raw.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| BillingError::InvalidTime(format!("Unrecognised time {:?}", raw)))
}

/// Resolve the billed window from the schedule and operator overrides
///
/// A missing end falls back to the scheduled end, then to one hour after the
/// start. An end earlier than the start (at minute granularity) is an
/// overnight session and rolls to the next day.
pub fn resolve_actual_times(
    schedule_start: DateTime<Utc>,
    schedule_end: Option<DateTime<Utc>>,
    actual_start: Option<&str>,
    actual_end: Option<&str>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), BillingError> {
    let base_date = schedule_start.with_timezone(&VENUE_TZ).date_naive();

    let start = match actual_start {
        Some(raw) => parse_time_override(raw, base_date)?,
        None => schedule_start,
    };

    let mut end = match actual_end {
        Some(raw) => parse_time_override(raw, base_date)?,
        None => schedule_end.unwrap_or(start + Duration::hours(1)),
    };

    let start_minute = start.timestamp() / 60;
    let end_minute = end.timestamp() / 60;
    if end_minute < start_minute {
        end += Duration::days(1);
    }

    Ok((start, end))
}

/// The deductions and extra lines a claimed gift contributes
fn apply_gift(gift: &ScheduleGift, subtotal: Decimal) -> (Option<AppliedGift>, Vec<BillItem>) {
    if !gift.is_claimed() {
        return (None, Vec::new());
    }

    match gift.gift_type {
        GiftType::SnacksDrinks => {
            let lines = gift
                .items
                .iter()
                .flatten()
                .map(|item| BillItem {
                    description: format!("Gift - {}", item.name),
                    quantity: Decimal::from(item.quantity),
                    unit_price: Decimal::ZERO,
                    amount: Decimal::ZERO,
                    discount_name: None,
                    discount_percentage: None,
                })
                .collect();

            let applied = AppliedGift {
                name: gift.name.clone(),
                gift_type: gift.gift_type,
                amount: Decimal::ZERO,
            };
            (Some(applied), lines)
        }
        GiftType::Discount => {
            let percentage = gift.discount_percentage.unwrap_or(Decimal::ZERO);
            let applied = AppliedGift {
                name: gift.name.clone(),
                gift_type: gift.gift_type,
                amount: (subtotal * percentage / HUNDRED).round_dp(2),
            };
            (Some(applied), Vec::new())
        }
        GiftType::DiscountAmount => {
            let applied = AppliedGift {
                name: gift.name.clone(),
                gift_type: gift.gift_type,
                amount: gift.discount_amount.unwrap_or(Decimal::ZERO),
            };
            (Some(applied), Vec::new())
        }
    }
}

/// Assemble a bill from already-loaded inputs
///
/// Pure except for logging, so the whole composition is unit-testable.
#[allow(clippy::too_many_arguments)]
fn compose_bill(
    schedule: &RoomSchedule,
    room: &Room,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    segments: &[Segment],
    fnb_lines: &[OrderLine],
    request_free_hour: bool,
    promotion: Option<&Promotion>,
    payment_method: Option<String>,
    code: String,
) -> Result<Bill, BillingError> {
    let mut items = Vec::new();

    let promo = promotion.filter(|p| {
        p.is_active
            && p.scope()
                .map_or(false, |scope| scope.matches(room.id, &room.room_type))
    });

    for segment in segments {
        items.push(BillItem {
            description: format!(
                "{}\n({}-{})",
                SERVICE_LABEL,
                segment.start.format("%H:%M"),
                segment.end.format("%H:%M"),
            ),
            quantity: segment.display_hours(),
            unit_price: segment.rate,
            amount: segment.fee().round_dp(2),
            discount_name: promo.map(|p| p.name.clone()),
            discount_percentage: promo.map(|p| p.discount_percentage),
        });
    }

    for line in fnb_lines {
        items.push(BillItem {
            description: line.name.clone(),
            quantity: Decimal::from(line.quantity),
            unit_price: line.unit_price,
            amount: line.amount(),
            discount_name: None,
            discount_percentage: None,
        });
    }

    let subtotal: Decimal = items.iter().map(|item| item.amount).sum();

    let applied_promotion = promo.map(|p| AppliedPromotion {
        name: p.name.clone(),
        discount_percentage: p.discount_percentage,
        amount: (subtotal * p.discount_percentage / HUNDRED).round_dp(2),
    });

    let fnb_total = order_total(fnb_lines);
    let eligible = free_hour_eligible(
        request_free_hour,
        fnb_total,
        duration_minutes(start, end),
    );
    let budget = apply_free_hour(segments, eligible)?;
    let free_hour = (budget.minutes_applied > 0).then(|| FreeHourDetail {
        minutes_applied: budget.minutes_applied,
        amount: budget.amount.round_dp(2),
    });

    let (applied_gift, gift_lines) = match schedule.gift.as_ref() {
        Some(gift) => apply_gift(&gift.0, subtotal),
        None => (None, Vec::new()),
    };
    items.extend(gift_lines);

    let deductions = applied_promotion
        .as_ref()
        .map_or(Decimal::ZERO, |p| p.amount)
        + free_hour.as_ref().map_or(Decimal::ZERO, |f| f.amount)
        + applied_gift.as_ref().map_or(Decimal::ZERO, |g| g.amount);

    let total_amount = floor_to_thousand(subtotal - deductions);

    Ok(Bill {
        schedule_id: schedule.id,
        room_id: room.id,
        room_name: room.room_name.clone(),
        room_type: room.room_type.clone(),
        invoice_code: code,
        start_time: start,
        end_time: end,
        items,
        subtotal,
        promotion: applied_promotion,
        free_hour,
        gift: applied_gift,
        total_amount,
        payment_method,
    })
}

/// Keep one bill per schedule, preferring paid rows then the newest
pub fn dedupe_bills(records: Vec<BillRecord>) -> Vec<BillRecord> {
    let mut best: HashMap<Uuid, BillRecord> = HashMap::new();

    for record in records {
        match best.get(&record.schedule_id) {
            Some(kept) if prefer(kept, &record) => {}
            _ => {
                best.insert(record.schedule_id, record);
            }
        }
    }

    let mut deduped: Vec<BillRecord> = best.into_values().collect();
    deduped.sort_by_key(|r| r.start_time);
    deduped
}

fn prefer(kept: &BillRecord, candidate: &BillRecord) -> bool {
    match (kept.payment_method.is_some(), candidate.payment_method.is_some()) {
        (true, false) => true,
        (false, true) => false,
        _ => kept.created_at >= candidate.created_at,
    }
}

/// Ids of rows that duplicate another row's content
///
/// Within a content group the preferred row survives; everything else is
/// returned for deletion.
pub fn duplicate_ids(records: &[BillRecord]) -> Vec<Uuid> {
    let mut keeper: HashMap<String, &BillRecord> = HashMap::new();
    let mut doomed = Vec::new();

    for record in records {
        let key = record.content_key();
        match keeper.get(&key) {
            None => {
                keeper.insert(key, record);
            }
            Some(kept) if prefer(kept, record) => doomed.push(record.id),
            Some(kept) => {
                doomed.push(kept.id);
                keeper.insert(key, record);
            }
        }
    }

    doomed
}

/// Venue-local [from, to) bounds for a reporting period containing `now`
///
/// Weeks start on Monday.
pub fn period_bounds(
    period: RevenuePeriod,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), BillingError> {
    let today = now.with_timezone(&VENUE_TZ).date_naive();

    let (from_date, to_date) = match period {
        RevenuePeriod::Day => (today, today + Duration::days(1)),
        RevenuePeriod::Week => {
            let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
            (monday, monday + Duration::days(7))
        }
        RevenuePeriod::Month => {
            let first = today
                .with_day(1)
                .ok_or_else(|| BillingError::InvalidTime(format!("first of month for {}", today)))?;
            let next = if first.month() == 12 {
                NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
            }
            .ok_or_else(|| BillingError::InvalidTime(format!("month after {}", first)))?;
            (first, next)
        }
    };

    Ok((
        local_instant(from_date, 0, 0)?,
        local_instant(to_date, 0, 0)?,
    ))
}

/// Sum deduped bill totals, flooring each to 1000 VND
pub fn revenue_total(records: &[BillRecord]) -> Decimal {
    records
        .iter()
        .map(|r| floor_to_thousand(r.total_amount))
        .sum()
}

/// Service computing, persisting and reporting on bills
#[derive(Clone)]
pub struct BillingService {
    pool: PgPool,
    price_repo: PriceRepository,
    holiday_repo: HolidayRepository,
    promotion_repo: PromotionRepository,
    bill_repo: BillRepository,
    schedule_repo: ScheduleRepository,
    order_repo: FnbOrderRepository,
    order_service: OrderService,
}

impl BillingService {
    /// Create a new BillingService
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        price_repo: PriceRepository,
        holiday_repo: HolidayRepository,
        promotion_repo: PromotionRepository,
        bill_repo: BillRepository,
        schedule_repo: ScheduleRepository,
        order_repo: FnbOrderRepository,
        order_service: OrderService,
    ) -> Self {
        Self {
            pool,
            price_repo,
            holiday_repo,
            promotion_repo,
            bill_repo,
            schedule_repo,
            order_repo,
            order_service,
        }
    }

    async fn find_room(&self, id: Uuid) -> Result<Room, BillingError> {
        sqlx::query_as::<_, Room>(
            "SELECT id, room_name, room_type, created_at FROM rooms WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| BillingError::RoomNotFound(id.to_string()))
    }

    /// Compute the bill for a schedule without persisting anything
    pub async fn get_bill(&self, schedule_id: Uuid, query: &BillQuery) -> Result<Bill, BillingError> {
        let schedule = self
            .schedule_repo
            .find_by_id(schedule_id)
            .await?
            .ok_or(BillingError::ScheduleNotFound)?;
        let room = self.find_room(schedule.room_id).await?;

        let (start, end) = resolve_actual_times(
            schedule.start_time,
            schedule.end_time,
            query.actual_start_time.as_deref(),
            query.actual_end_time.as_deref(),
        )?;

        let ctx = PricingContext {
            tables: self.price_repo.load_tables().await?,
            holidays: self.holiday_repo.load_dates().await?,
            room_type: room.room_type.clone(),
        };
        let segments = partition_session(start, end, &ctx)?;

        let resolver = self.order_service.build_resolver().await?;
        let fnb_lines = match self.order_repo.find_by_schedule(schedule_id).await? {
            Some(order) => price_order(&order, &resolver),
            None => Vec::new(),
        };

        let promotion = match query.promotion_id {
            Some(id) => self.promotion_repo.find_by_id(id).await?,
            None => None,
        };

        let code = invoice_code(Utc::now().with_timezone(&VENUE_TZ));

        compose_bill(
            &schedule,
            &room,
            start,
            end,
            &segments,
            &fnb_lines,
            query.free_hour_flag(&schedule),
            promotion.as_ref(),
            query.payment_method.clone(),
            code,
        )
    }

    /// Compute and persist the bill for a schedule
    ///
    /// The order snapshot is archived best-effort; a history failure never
    /// loses the saved bill.
    pub async fn record_bill(
        &self,
        schedule_id: Uuid,
        query: &BillQuery,
    ) -> Result<BillRecord, BillingError> {
        let bill = self.get_bill(schedule_id, query).await?;

        let fnb_order = self
            .order_repo
            .find_by_schedule(schedule_id)
            .await?
            .and_then(|order| serde_json::to_value(&order).ok());

        let record = self.bill_repo.upsert(&bill, fnb_order).await?;

        if let Err(err) = self
            .order_service
            .complete_order(schedule_id, None, Some(record.id))
            .await
        {
            tracing::warn!(
                "Failed to archive order history for schedule {}: {}",
                schedule_id,
                err
            );
        }

        tracing::info!(
            "Recorded bill {} for schedule {} (total {})",
            record.invoice_code,
            schedule_id,
            record.total_amount
        );

        Ok(record)
    }

    /// Fetch the persisted bill for a schedule, if any
    pub async fn find_recorded(
        &self,
        schedule_id: Uuid,
    ) -> Result<Option<BillRecord>, BillingError> {
        let records = self.bill_repo.find_by_schedule(schedule_id).await?;
        Ok(records.into_iter().next())
    }

    /// Record the payment method on a persisted bill
    pub async fn set_payment_method(
        &self,
        bill_id: Uuid,
        payment_method: &str,
    ) -> Result<BillRecord, BillingError> {
        if payment_method.trim().is_empty() {
            return Err(BillingError::ValidationError(
                "Payment method must not be empty".to_string(),
            ));
        }
        self.bill_repo.set_payment_method(bill_id, payment_method).await
    }

    /// List promotions a cashier can currently offer
    pub async fn list_active_promotions(&self) -> Result<Vec<Promotion>, BillingError> {
        self.promotion_repo.find_active().await
    }

    /// Revenue for the current day, week or month
    pub async fn revenue(&self, period: RevenuePeriod) -> Result<RevenueReport, BillingError> {
        let (from, to) = period_bounds(period, Utc::now())?;
        self.revenue_between(from, to).await
    }

    /// Revenue for an arbitrary [from, to) window
    pub async fn revenue_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<RevenueReport, BillingError> {
        if to <= from {
            return Err(BillingError::ValidationError(
                "Range end must be after range start".to_string(),
            ));
        }

        let records = dedupe_bills(self.bill_repo.find_started_in_range(from, to).await?);

        Ok(RevenueReport {
            from,
            to,
            bill_count: records.len(),
            total: revenue_total(&records),
        })
    }

    /// Delete redundant copies of content-identical bills
    pub async fn clean_duplicate_bills(&self) -> Result<u64, BillingError> {
        let records = self.bill_repo.find_all().await?;
        let doomed = duplicate_ids(&records);
        let deleted = self.bill_repo.delete_ids(&doomed).await?;

        if deleted > 0 {
            tracing::info!("Removed {} duplicate bills", deleted);
        }
        Ok(deleted)
    }

    /// Delete bills whose schedule never finished
    pub async fn clean_non_finished_bills(&self) -> Result<u64, BillingError> {
        let deleted = self.bill_repo.delete_non_finished().await?;

        if deleted > 0 {
            tracing::info!("Removed {} bills for unfinished schedules", deleted);
        }
        Ok(deleted)
    }
}

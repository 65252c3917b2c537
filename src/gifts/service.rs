use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::gifts::error::GiftError;
use crate::gifts::{
    CreateGiftRequest, Gift, GiftRepository, GiftType, ScheduleGift, UpdateGiftRequest,
};
use crate::scheduling::ScheduleRepository;

/// Service for gift business logic
#[derive(Clone)]
pub struct GiftService {
    gift_repo: GiftRepository,
    schedule_repo: ScheduleRepository,
}

/// Pick an index from a weighted pool
///
/// `roll` must be in [0, sum(weights)). Entries with zero weight are never
/// selected. Pure so the distribution is testable without an RNG.
pub fn pick_weighted_index(weights: &[i64], roll: i64) -> Option<usize> {
    let mut cumulative = 0i64;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w.max(0);
        if roll < cumulative {
            return Some(i);
        }
    }
    None
}

impl GiftService {
    /// Create a new GiftService
    pub fn new(gift_repo: GiftRepository, schedule_repo: ScheduleRepository) -> Self {
        Self {
            gift_repo,
            schedule_repo,
        }
    }

    /// Create a new gift in the prize pool
    ///
    /// # Validation
    /// - Discount gifts must carry a discount_percentage
    /// - Flat-amount gifts must carry a discount_amount
    /// - Bundle gifts must carry at least one item
    pub async fn create_gift(&self, request: CreateGiftRequest) -> Result<Gift, GiftError> {
        match request.gift_type {
            GiftType::Discount if request.discount_percentage.is_none() => {
                return Err(GiftError::ValidationError(
                    "discount gifts require discount_percentage".to_string(),
                ));
            }
            GiftType::DiscountAmount if request.discount_amount.is_none() => {
                return Err(GiftError::ValidationError(
                    "discount_amount gifts require discount_amount".to_string(),
                ));
            }
            GiftType::SnacksDrinks
                if request.items.as_ref().map_or(true, |items| items.is_empty()) =>
            {
                return Err(GiftError::ValidationError(
                    "snacks_drinks gifts require at least one bundle item".to_string(),
                ));
            }
            _ => {}
        }

        self.gift_repo
            .create(
                request.name,
                request.gift_type,
                request.discount_percentage,
                request.discount_amount,
                request.items,
                request.total_quantity,
                request.is_active,
            )
            .await
    }

    /// Fetch a gift by ID
    pub async fn get_gift(&self, id: Uuid) -> Result<Gift, GiftError> {
        self.gift_repo.find_by_id(id).await?.ok_or(GiftError::NotFound)
    }

    /// List all gifts
    pub async fn list_gifts(&self) -> Result<Vec<Gift>, GiftError> {
        self.gift_repo.find_all().await
    }

    /// Update a gift
    pub async fn update_gift(&self, id: Uuid, request: UpdateGiftRequest) -> Result<Gift, GiftError> {
        self.gift_repo
            .update(
                id,
                request.name,
                request.discount_percentage,
                request.discount_amount,
                request.items,
                request.total_quantity,
                request.is_active,
            )
            .await
    }

    /// Delete a gift
    pub async fn delete_gift(&self, id: Uuid) -> Result<(), GiftError> {
        self.gift_repo.delete(id).await
    }

    /// Claim a gift for a schedule
    ///
    /// Idempotent: when the schedule already holds a claimed gift the existing
    /// snapshot is returned unchanged.
    ///
    /// # Flow
    /// 1. Pick a claimable gift at random, weighted by remaining stock
    /// 2. Atomically take one unit of that gift's stock
    /// 3. Attach the snapshot to the schedule, guarded on gift_enabled and no
    ///    prior claim
    /// 4. On a lost race at step 3, return the stock and report a conflict
    pub async fn claim_gift(&self, schedule_id: Uuid) -> Result<ScheduleGift, GiftError> {
        let schedule = self
            .schedule_repo
            .find_by_id(schedule_id)
            .await
            .map_err(|e| GiftError::DatabaseError(e.to_string()))?
            .ok_or(GiftError::ScheduleNotFound)?;

        if let Some(existing) = schedule.gift {
            if existing.0.is_claimed() {
                tracing::debug!("Schedule {} already claimed a gift, returning it", schedule_id);
                return Ok(existing.0);
            }
        }

        if !schedule.gift_enabled {
            return Err(GiftError::GiftNotEnabled);
        }

        let pool = self.gift_repo.find_claimable().await?;
        if pool.is_empty() {
            return Err(GiftError::PoolExhausted);
        }

        let weights: Vec<i64> = pool.iter().map(|g| g.remaining_quantity as i64).collect();
        let total: i64 = weights.iter().sum();
        let roll = rand::thread_rng().gen_range(0..total);
        let winner = pick_weighted_index(&weights, roll)
            .and_then(|i| pool.get(i))
            .ok_or(GiftError::PoolExhausted)?;

        if !self.gift_repo.take_stock(winner.id).await? {
            return Err(GiftError::PoolExhausted);
        }

        let snapshot = ScheduleGift {
            gift_id: winner.id,
            name: winner.name.clone(),
            gift_type: winner.gift_type,
            discount_percentage: winner.discount_percentage,
            discount_amount: winner.discount_amount,
            items: winner.items.as_ref().map(|items| items.0.clone()),
            status: ScheduleGift::STATUS_CLAIMED.to_string(),
            claimed_at: Utc::now(),
        };

        if !self.gift_repo.attach_to_schedule(schedule_id, &snapshot).await? {
            // Lost the race against a concurrent claim; put the stock back
            if let Err(e) = self.gift_repo.return_stock(winner.id).await {
                tracing::error!(
                    "Failed to return gift {} stock after lost claim race: {}",
                    winner.id,
                    e
                );
            }
            return Err(GiftError::ClaimConflict(
                "Gift was already claimed for this schedule".to_string(),
            ));
        }

        tracing::info!(
            "Schedule {} claimed gift {} ({})",
            schedule_id,
            winner.id,
            winner.name
        );

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_weighted_index_bounds() {
        let weights = [3, 0, 2];
        assert_eq!(pick_weighted_index(&weights, 0), Some(0));
        assert_eq!(pick_weighted_index(&weights, 2), Some(0));
        assert_eq!(pick_weighted_index(&weights, 3), Some(2));
        assert_eq!(pick_weighted_index(&weights, 4), Some(2));
        assert_eq!(pick_weighted_index(&weights, 5), None);
    }

    #[test]
    fn test_pick_weighted_skips_zero_weight() {
        let weights = [0, 5, 0];
        for roll in 0..5 {
            assert_eq!(pick_weighted_index(&weights, roll), Some(1));
        }
    }

    #[test]
    fn test_pick_weighted_empty_pool() {
        assert_eq!(pick_weighted_index(&[], 0), None);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AccountId, ReviewId};
use super::error::MarketError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewTarget {
    Specialist,
    Company,
}

/// Immutable rating left by one account about a specialist or company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub author_id: AccountId,
    pub target_id: AccountId,
    pub target_kind: ReviewTarget,
    pub rating: u8,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub target_id: AccountId,
    pub rating: u8,
    #[serde(default)]
    pub text: String,
}

impl Review {
    pub(crate) fn write(
        author_id: AccountId,
        target_kind: ReviewTarget,
        new: NewReview,
        now: DateTime<Utc>,
    ) -> Result<Self, MarketError> {
        if !(1..=5).contains(&new.rating) {
            return Err(MarketError::Validation(format!(
                "rating must be between 1 and 5, got {}",
                new.rating
            )));
        }
        if author_id == new.target_id {
            return Err(MarketError::Forbidden(
                "accounts cannot review themselves".to_string(),
            ));
        }

        Ok(Self {
            id: ReviewId::generate(),
            author_id,
            target_id: new.target_id,
            target_kind,
            rating: new.rating,
            text: new.text,
            created_at: now,
            revision: 0,
        })
    }
}

/// Aggregate standing of a review target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reputation {
    pub target_id: AccountId,
    pub review_count: usize,
    pub average_rating: Option<f32>,
}

impl Reputation {
    /// Average is rounded to one decimal place.
    pub fn from_reviews<'a>(
        target_id: AccountId,
        reviews: impl IntoIterator<Item = &'a Review>,
    ) -> Self {
        let (count, total) = reviews
            .into_iter()
            .filter(|review| review.target_id == target_id)
            .fold((0usize, 0u32), |(count, total), review| {
                (count + 1, total + u32::from(review.rating))
            });

        let average_rating = (count > 0)
            .then(|| ((total as f32 / count as f32) * 10.0).round() / 10.0);

        Self {
            target_id,
            review_count: count,
            average_rating,
        }
    }
}

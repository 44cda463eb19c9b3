use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AccountId, Outcome, PurchaseId};
use super::error::MarketError;
use super::lifecycle::{Listing, ResponseLifecycle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Active,
    Completed,
    Cancelled,
}

impl PurchaseStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Supplier-run group buy that settles at its deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectivePurchase {
    pub id: PurchaseId,
    pub supplier_id: AccountId,
    pub product: String,
    pub category: String,
    pub price_per_unit: u32,
    pub retail_price: Option<u32>,
    pub min_participants: u32,
    pub deadline: DateTime<Utc>,
    pub status: PurchaseStatus,
    pub participants: Vec<PurchaseParticipant>,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchase {
    pub product: String,
    pub category: String,
    pub price_per_unit: u32,
    #[serde(default)]
    pub retail_price: Option<u32>,
    pub min_participants: u32,
    pub deadline: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseParticipant {
    pub purchase_id: PurchaseId,
    pub participant_id: AccountId,
    pub quantity: u32,
    pub joined_at: DateTime<Utc>,
}

impl CollectivePurchase {
    pub(crate) fn open(
        supplier_id: AccountId,
        new: NewPurchase,
        now: DateTime<Utc>,
    ) -> Result<Self, MarketError> {
        if new.product.trim().is_empty() {
            return Err(MarketError::Validation(
                "purchase product is required".to_string(),
            ));
        }
        if new.min_participants == 0 {
            return Err(MarketError::Validation(
                "a collective purchase needs at least one participant".to_string(),
            ));
        }
        if new.deadline <= now {
            return Err(MarketError::Validation(
                "purchase deadline must be in the future".to_string(),
            ));
        }

        Ok(Self {
            id: PurchaseId::generate(),
            supplier_id,
            product: new.product,
            category: new.category,
            price_per_unit: new.price_per_unit,
            retail_price: new.retail_price,
            min_participants: new.min_participants,
            deadline: new.deadline,
            status: PurchaseStatus::Active,
            participants: Vec::new(),
            created_at: now,
            settled_at: None,
            revision: 0,
        })
    }

    pub fn threshold_met(&self) -> bool {
        self.participants.len() >= self.min_participants as usize
    }

    pub fn total_volume(&self) -> u32 {
        self.participants
            .iter()
            .map(|participant| participant.quantity)
            .sum()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == PurchaseStatus::Active && now >= self.deadline
    }

    pub(crate) fn join(
        &mut self,
        participant_id: AccountId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<Outcome<PurchaseParticipant>, MarketError> {
        if let Some(existing) = self
            .participants
            .iter()
            .find(|participant| participant.participant_id == participant_id)
        {
            return Ok(Outcome::Unchanged(existing.clone()));
        }
        if self.status != PurchaseStatus::Active {
            return Err(MarketError::illegal(
                "collective purchase",
                self.status.label(),
                "join",
            ));
        }
        if now >= self.deadline {
            return Err(MarketError::illegal(
                "collective purchase",
                "past deadline",
                "join",
            ));
        }
        if quantity == 0 {
            return Err(MarketError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }

        let participant = PurchaseParticipant {
            purchase_id: self.id.clone(),
            participant_id,
            quantity,
            joined_at: now,
        };
        self.participants.push(participant.clone());
        Ok(Outcome::Created(participant))
    }

    /// Deadline evaluation: completed when the threshold is met, cancelled otherwise.
    /// Returns the new status, or `None` when nothing is due yet.
    pub(crate) fn settle_if_due(&mut self, now: DateTime<Utc>) -> Option<PurchaseStatus> {
        if !self.is_due(now) {
            return None;
        }
        self.status = if self.threshold_met() {
            PurchaseStatus::Completed
        } else {
            PurchaseStatus::Cancelled
        };
        self.settled_at = Some(now);
        Some(self.status)
    }

    /// Owner closes the purchase early once enough participants have joined.
    pub(crate) fn complete_early(&mut self, now: DateTime<Utc>) -> Result<(), MarketError> {
        if self.status != PurchaseStatus::Active {
            return Err(MarketError::illegal(
                "collective purchase",
                self.status.label(),
                "complete",
            ));
        }
        if now >= self.deadline {
            return Err(MarketError::illegal(
                "collective purchase",
                "past deadline",
                "complete",
            ));
        }
        if !self.threshold_met() {
            return Err(MarketError::illegal(
                "collective purchase",
                "below participant threshold",
                "complete",
            ));
        }
        self.status = PurchaseStatus::Completed;
        self.settled_at = Some(now);
        Ok(())
    }

    pub(crate) fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), MarketError> {
        if self.status != PurchaseStatus::Active {
            return Err(MarketError::illegal(
                "collective purchase",
                self.status.label(),
                "cancel",
            ));
        }
        self.status = PurchaseStatus::Cancelled;
        self.settled_at = Some(now);
        Ok(())
    }
}

impl Listing for CollectivePurchase {
    type Status = PurchaseStatus;

    fn owner(&self) -> &AccountId {
        &self.supplier_id
    }

    fn status(&self) -> PurchaseStatus {
        self.status
    }

    fn is_open(&self) -> bool {
        self.status == PurchaseStatus::Active
    }
}

impl ResponseLifecycle for PurchaseParticipant {
    fn responder(&self) -> &AccountId {
        &self.participant_id
    }

    fn responded_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    fn status_label(&self) -> &'static str {
        "joined"
    }

    fn is_terminal(&self) -> bool {
        true
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AccountId, GigId, OrderId, PurchaseId, VacancyId};
use super::gig::GigResponse;
use super::order::OrderResponse;
use super::purchase::PurchaseParticipant;
use super::repository::Entity;
use super::vacancy::Application;

/// A posting owned by one account that other accounts respond to.
pub trait Listing: Entity {
    type Status: Copy + PartialEq + Send + Sync;

    fn owner(&self) -> &AccountId;
    fn status(&self) -> Self::Status;

    /// Whether the listing still counts against the owner's plan cap.
    fn is_open(&self) -> bool;
}

/// Behavior shared by every per-listing response record.
pub trait ResponseLifecycle {
    fn responder(&self) -> &AccountId;
    fn responded_at(&self) -> DateTime<Utc>;
    fn status_label(&self) -> &'static str;
    fn is_terminal(&self) -> bool;
}

/// Typed pointer at a listing, used by queries spanning all listing kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ListingRef {
    Vacancy(VacancyId),
    Gig(GigId),
    Order(OrderId),
    Purchase(PurchaseId),
}

/// Tagged response record, one variant per listing kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseRecord {
    Application(Application),
    GigResponse(GigResponse),
    OrderResponse(OrderResponse),
    Participation(PurchaseParticipant),
}

impl ResponseRecord {
    pub fn lifecycle(&self) -> &dyn ResponseLifecycle {
        match self {
            Self::Application(record) => record,
            Self::GigResponse(record) => record,
            Self::OrderResponse(record) => record,
            Self::Participation(record) => record,
        }
    }
}

/// Listing query: every field set narrows the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery<S> {
    pub owner: Option<AccountId>,
    pub status: Option<S>,
}

impl<S> Default for ListingQuery<S> {
    fn default() -> Self {
        Self {
            owner: None,
            status: None,
        }
    }
}

impl<S: Copy + PartialEq> ListingQuery<S> {
    pub fn owned_by(owner: AccountId) -> Self {
        Self {
            owner: Some(owner),
            status: None,
        }
    }

    pub fn with_status(mut self, status: S) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches<L>(&self, listing: &L) -> bool
    where
        L: Listing<Status = S>,
    {
        self.owner.as_ref().map_or(true, |owner| listing.owner() == owner)
            && self.status.map_or(true, |status| listing.status() == status)
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AccountId, OrderId, OrderResponseId, Role};
use super::error::MarketError;
use super::lifecycle::{Listing, ResponseLifecycle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Active,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderResponseStatus {
    Pending,
    Accepted,
    Rejected,
}

impl OrderResponseStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarDetails {
    pub make: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub body_type: Option<String>,
}

/// Service request from a client; specialists and companies bid on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub client_id: AccountId,
    pub service: String,
    pub city: String,
    pub car: CarDetails,
    pub budget: Option<u32>,
    pub preferred_date: Option<NaiveDate>,
    pub description: String,
    pub status: OrderStatus,
    pub responses: Vec<OrderResponse>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub service: String,
    pub city: String,
    #[serde(default)]
    pub car: CarDetails,
    #[serde(default)]
    pub budget: Option<u32>,
    #[serde(default)]
    pub preferred_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: OrderResponseId,
    pub order_id: OrderId,
    pub responder_id: AccountId,
    pub responder_role: Role,
    pub price: u32,
    pub message: String,
    pub status: OrderResponseStatus,
    pub created_at: DateTime<Utc>,
}

/// Result of accepting a bid: the winner plus every bid it displaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcceptedBid {
    pub accepted: OrderResponse,
    pub rejected: Vec<OrderResponseId>,
}

impl Order {
    pub(crate) fn open(
        client_id: AccountId,
        new: NewOrder,
        now: DateTime<Utc>,
    ) -> Result<Self, MarketError> {
        if new.service.trim().is_empty() {
            return Err(MarketError::Validation(
                "order service is required".to_string(),
            ));
        }

        Ok(Self {
            id: OrderId::generate(),
            client_id,
            service: new.service,
            city: new.city,
            car: new.car,
            budget: new.budget,
            preferred_date: new.preferred_date,
            description: new.description,
            status: OrderStatus::Active,
            responses: Vec::new(),
            created_at: now,
            closed_at: None,
            revision: 0,
        })
    }

    pub fn response(&self, id: &OrderResponseId) -> Option<&OrderResponse> {
        self.responses.iter().find(|response| &response.id == id)
    }

    pub fn accepted_response(&self) -> Option<&OrderResponse> {
        self.responses
            .iter()
            .find(|response| response.status == OrderResponseStatus::Accepted)
    }

    fn ensure_active(&self, action: &'static str) -> Result<(), MarketError> {
        if self.status != OrderStatus::Active {
            return Err(MarketError::illegal("order", self.status.label(), action));
        }
        Ok(())
    }

    pub(crate) fn respond(
        &mut self,
        responder_id: AccountId,
        responder_role: Role,
        price: u32,
        message: String,
        now: DateTime<Utc>,
    ) -> Result<OrderResponse, MarketError> {
        self.ensure_active("respond to")?;
        if self.accepted_response().is_some() {
            return Err(MarketError::illegal("order", "assigned", "respond to"));
        }
        if self
            .responses
            .iter()
            .any(|response| response.responder_id == responder_id)
        {
            return Err(MarketError::AlreadyExists(format!(
                "'{responder_id}' already responded to order '{}'",
                self.id
            )));
        }

        let response = OrderResponse {
            id: OrderResponseId::generate(),
            order_id: self.id.clone(),
            responder_id,
            responder_role,
            price,
            message,
            status: OrderResponseStatus::Pending,
            created_at: now,
        };
        self.responses.push(response.clone());
        Ok(response)
    }

    /// Accept one pending bid and reject every other pending bid. The order stays active.
    pub(crate) fn accept_response(
        &mut self,
        response_id: &OrderResponseId,
    ) -> Result<AcceptedBid, MarketError> {
        self.ensure_active("accept a response on")?;
        let target = self
            .response(response_id)
            .ok_or_else(|| MarketError::not_found("order response", response_id))?;
        if target.status != OrderResponseStatus::Pending {
            return Err(MarketError::illegal(
                "order response",
                target.status.label(),
                "accept",
            ));
        }

        let mut accepted = None;
        let mut rejected = Vec::new();
        for response in &mut self.responses {
            if &response.id == response_id {
                response.status = OrderResponseStatus::Accepted;
                accepted = Some(response.clone());
            } else if response.status == OrderResponseStatus::Pending {
                response.status = OrderResponseStatus::Rejected;
                rejected.push(response.id.clone());
            }
        }

        let accepted =
            accepted.ok_or_else(|| MarketError::not_found("order response", response_id))?;
        Ok(AcceptedBid { accepted, rejected })
    }

    pub(crate) fn reject_response(
        &mut self,
        response_id: &OrderResponseId,
    ) -> Result<OrderResponse, MarketError> {
        self.ensure_active("reject a response on")?;
        let response = self
            .responses
            .iter_mut()
            .find(|response| &response.id == response_id)
            .ok_or_else(|| MarketError::not_found("order response", response_id))?;
        if response.status != OrderResponseStatus::Pending {
            return Err(MarketError::illegal(
                "order response",
                response.status.label(),
                "reject",
            ));
        }
        response.status = OrderResponseStatus::Rejected;
        Ok(response.clone())
    }

    /// Mark the service delivered. Requires a chosen bid.
    pub(crate) fn complete(&mut self, now: DateTime<Utc>) -> Result<(), MarketError> {
        self.ensure_active("complete")?;
        if self.accepted_response().is_none() {
            return Err(MarketError::illegal("order", "unassigned", "complete"));
        }
        self.status = OrderStatus::Completed;
        self.closed_at = Some(now);
        Ok(())
    }

    /// Withdraw the order; outstanding bids are rejected in the same write.
    pub(crate) fn cancel(&mut self, now: DateTime<Utc>) -> Result<Vec<OrderResponseId>, MarketError> {
        self.ensure_active("cancel")?;
        let mut rejected = Vec::new();
        for response in &mut self.responses {
            if response.status == OrderResponseStatus::Pending {
                response.status = OrderResponseStatus::Rejected;
                rejected.push(response.id.clone());
            }
        }
        self.status = OrderStatus::Cancelled;
        self.closed_at = Some(now);
        Ok(rejected)
    }
}

impl Listing for Order {
    type Status = OrderStatus;

    fn owner(&self) -> &AccountId {
        &self.client_id
    }

    fn status(&self) -> OrderStatus {
        self.status
    }

    fn is_open(&self) -> bool {
        self.status == OrderStatus::Active
    }
}

impl ResponseLifecycle for OrderResponse {
    fn responder(&self) -> &AccountId {
        &self.responder_id
    }

    fn responded_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn status_label(&self) -> &'static str {
        self.status.label()
    }

    fn is_terminal(&self) -> bool {
        self.status != OrderResponseStatus::Pending
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AccountId, GigId, GigResponseId, Outcome};
use super::error::MarketError;
use super::lifecycle::{Listing, ResponseLifecycle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GigStatus {
    Open,
    Closed,
}

impl GigStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// One-shot job on a given date. Responses are informational; there is no selection step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gig {
    pub id: GigId,
    pub employer_id: AccountId,
    pub title: String,
    pub city: String,
    pub date: NaiveDate,
    pub payment: u32,
    pub description: String,
    pub urgent: bool,
    pub status: GigStatus,
    pub responses: Vec<GigResponse>,
    pub created_at: DateTime<Utc>,
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGig {
    pub title: String,
    pub city: String,
    pub date: NaiveDate,
    pub payment: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub urgent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GigResponse {
    pub id: GigResponseId,
    pub gig_id: GigId,
    pub specialist_id: AccountId,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Gig {
    pub(crate) fn open(
        employer_id: AccountId,
        new: NewGig,
        now: DateTime<Utc>,
    ) -> Result<Self, MarketError> {
        if new.title.trim().is_empty() {
            return Err(MarketError::Validation("gig title is required".to_string()));
        }

        Ok(Self {
            id: GigId::generate(),
            employer_id,
            title: new.title,
            city: new.city,
            date: new.date,
            payment: new.payment,
            description: new.description,
            urgent: new.urgent,
            status: GigStatus::Open,
            responses: Vec::new(),
            created_at: now,
            revision: 0,
        })
    }

    pub fn response_from(&self, specialist_id: &AccountId) -> Option<&GigResponse> {
        self.responses
            .iter()
            .find(|response| &response.specialist_id == specialist_id)
    }

    /// At most one response per specialist; repeating the call hands back the first one.
    pub(crate) fn respond(
        &mut self,
        specialist_id: AccountId,
        message: String,
        now: DateTime<Utc>,
    ) -> Result<Outcome<GigResponse>, MarketError> {
        if let Some(existing) = self.response_from(&specialist_id) {
            return Ok(Outcome::Unchanged(existing.clone()));
        }
        if self.status != GigStatus::Open {
            return Err(MarketError::illegal("gig", self.status.label(), "respond to"));
        }

        let response = GigResponse {
            id: GigResponseId::generate(),
            gig_id: self.id.clone(),
            specialist_id,
            message,
            created_at: now,
        };
        self.responses.push(response.clone());
        Ok(Outcome::Created(response))
    }

    pub(crate) fn close(&mut self) -> Result<(), MarketError> {
        if self.status != GigStatus::Open {
            return Err(MarketError::illegal("gig", self.status.label(), "close"));
        }
        self.status = GigStatus::Closed;
        Ok(())
    }
}

impl Listing for Gig {
    type Status = GigStatus;

    fn owner(&self) -> &AccountId {
        &self.employer_id
    }

    fn status(&self) -> GigStatus {
        self.status
    }

    fn is_open(&self) -> bool {
        self.status == GigStatus::Open
    }
}

impl ResponseLifecycle for GigResponse {
    fn responder(&self) -> &AccountId {
        &self.specialist_id
    }

    fn responded_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn status_label(&self) -> &'static str {
        "responded"
    }

    fn is_terminal(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gig() -> Gig {
        Gig::open(
            AccountId::from("acc-employer"),
            NewGig {
                title: "Weekend polish".to_string(),
                city: "Kazan".to_string(),
                date: NaiveDate::from_ymd_opt(2026, 11, 7).expect("valid date"),
                payment: 5000,
                description: String::new(),
                urgent: true,
            },
            Utc::now(),
        )
        .expect("gig opens")
    }

    #[test]
    fn respond_twice_yields_one_response() {
        let mut gig = gig();
        let specialist = AccountId::from("acc-spec");
        let first = gig
            .respond(specialist.clone(), "free Saturday".to_string(), Utc::now())
            .expect("first response");
        let second = gig
            .respond(specialist, "again".to_string(), Utc::now())
            .expect("second call");

        assert!(first.is_created());
        assert!(!second.is_created());
        assert_eq!(first.value().id, second.value().id);
        assert_eq!(gig.responses.len(), 1);
        assert_eq!(gig.responses[0].message, "free Saturday");
    }

    #[test]
    fn closed_gig_refuses_new_responders() {
        let mut gig = gig();
        gig.respond(AccountId::from("acc-early"), String::new(), Utc::now())
            .expect("early response");
        gig.close().expect("closed");

        let repeat = gig
            .respond(AccountId::from("acc-early"), String::new(), Utc::now())
            .expect("repeat is a no-op");
        assert!(!repeat.is_created());
        assert!(gig
            .respond(AccountId::from("acc-late"), String::new(), Utc::now())
            .is_err());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AccountId, ApplicationId, VacancyId};
use super::error::MarketError;
use super::lifecycle::{Listing, ResponseLifecycle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacancyStatus {
    Open,
    Filled,
    Closed,
}

impl VacancyStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Filled => "filled",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationDecision {
    Accept,
    Reject,
}

impl ApplicationDecision {
    const fn action(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
        }
    }

    const fn status(self) -> ApplicationStatus {
        match self {
            Self::Accept => ApplicationStatus::Accepted,
            Self::Reject => ApplicationStatus::Rejected,
        }
    }
}

/// Employment posting. Applications are embedded so deleting the vacancy removes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vacancy {
    pub id: VacancyId,
    pub employer_id: AccountId,
    pub title: String,
    pub city: String,
    pub salary: String,
    pub description: String,
    pub status: VacancyStatus,
    pub applications: Vec<Application>,
    pub created_at: DateTime<Utc>,
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVacancy {
    pub title: String,
    pub city: String,
    #[serde(default)]
    pub salary: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub vacancy_id: VacancyId,
    pub specialist_id: AccountId,
    pub message: String,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl Vacancy {
    pub(crate) fn open(
        employer_id: AccountId,
        new: NewVacancy,
        now: DateTime<Utc>,
    ) -> Result<Self, MarketError> {
        if new.title.trim().is_empty() {
            return Err(MarketError::Validation(
                "vacancy title is required".to_string(),
            ));
        }

        Ok(Self {
            id: VacancyId::generate(),
            employer_id,
            title: new.title,
            city: new.city,
            salary: new.salary,
            description: new.description,
            status: VacancyStatus::Open,
            applications: Vec::new(),
            created_at: now,
            revision: 0,
        })
    }

    pub fn application(&self, id: &ApplicationId) -> Option<&Application> {
        self.applications.iter().find(|app| &app.id == id)
    }

    pub fn count_by_status(&self, status: ApplicationStatus) -> usize {
        self.applications
            .iter()
            .filter(|app| app.status == status)
            .count()
    }

    pub(crate) fn apply(
        &mut self,
        specialist_id: AccountId,
        message: String,
        now: DateTime<Utc>,
    ) -> Result<Application, MarketError> {
        if self.status != VacancyStatus::Open {
            return Err(MarketError::illegal(
                "vacancy",
                self.status.label(),
                "apply to",
            ));
        }
        if self
            .applications
            .iter()
            .any(|app| app.specialist_id == specialist_id)
        {
            return Err(MarketError::AlreadyExists(format!(
                "specialist '{specialist_id}' already applied to vacancy '{}'",
                self.id
            )));
        }

        let application = Application {
            id: ApplicationId::generate(),
            vacancy_id: self.id.clone(),
            specialist_id,
            message,
            status: ApplicationStatus::Pending,
            created_at: now,
            decided_at: None,
        };
        self.applications.push(application.clone());
        Ok(application)
    }

    /// Decide a pending application. Deciding never changes the vacancy's own status.
    pub(crate) fn decide(
        &mut self,
        application_id: &ApplicationId,
        decision: ApplicationDecision,
        now: DateTime<Utc>,
    ) -> Result<Application, MarketError> {
        let application = self
            .applications
            .iter_mut()
            .find(|app| &app.id == application_id)
            .ok_or_else(|| MarketError::not_found("application", application_id))?;

        if application.status != ApplicationStatus::Pending {
            return Err(MarketError::illegal(
                "application",
                application.status.label(),
                decision.action(),
            ));
        }

        application.status = decision.status();
        application.decided_at = Some(now);
        Ok(application.clone())
    }

    pub(crate) fn fill(&mut self) -> Result<(), MarketError> {
        self.leave_open(VacancyStatus::Filled, "fill")
    }

    pub(crate) fn close(&mut self) -> Result<(), MarketError> {
        self.leave_open(VacancyStatus::Closed, "close")
    }

    fn leave_open(&mut self, to: VacancyStatus, action: &'static str) -> Result<(), MarketError> {
        if self.status != VacancyStatus::Open {
            return Err(MarketError::illegal("vacancy", self.status.label(), action));
        }
        self.status = to;
        Ok(())
    }
}

impl Listing for Vacancy {
    type Status = VacancyStatus;

    fn owner(&self) -> &AccountId {
        &self.employer_id
    }

    fn status(&self) -> VacancyStatus {
        self.status
    }

    fn is_open(&self) -> bool {
        self.status == VacancyStatus::Open
    }
}

impl ResponseLifecycle for Application {
    fn responder(&self) -> &AccountId {
        &self.specialist_id
    }

    fn responded_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn status_label(&self) -> &'static str {
        self.status.label()
    }

    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vacancy() -> Vacancy {
        Vacancy::open(
            AccountId::from("acc-employer"),
            NewVacancy {
                title: "Detailer".to_string(),
                city: "Moscow".to_string(),
                salary: "80 000".to_string(),
                description: String::new(),
            },
            Utc::now(),
        )
        .expect("vacancy opens")
    }

    #[test]
    fn rejected_application_cannot_be_accepted() {
        let mut vacancy = vacancy();
        let app = vacancy
            .apply(AccountId::from("acc-spec"), "hi".to_string(), Utc::now())
            .expect("applied");

        vacancy
            .decide(&app.id, ApplicationDecision::Reject, Utc::now())
            .expect("rejected");
        let err = vacancy
            .decide(&app.id, ApplicationDecision::Accept, Utc::now())
            .expect_err("terminal");

        assert!(matches!(err, MarketError::IllegalTransition { .. }));
        assert_eq!(
            vacancy.application(&app.id).map(|app| app.status),
            Some(ApplicationStatus::Rejected)
        );
    }

    #[test]
    fn accepting_leaves_vacancy_open() {
        let mut vacancy = vacancy();
        let first = vacancy
            .apply(AccountId::from("acc-a"), String::new(), Utc::now())
            .expect("first");
        let second = vacancy
            .apply(AccountId::from("acc-b"), String::new(), Utc::now())
            .expect("second");

        vacancy
            .decide(&first.id, ApplicationDecision::Accept, Utc::now())
            .expect("accept first");
        vacancy
            .decide(&second.id, ApplicationDecision::Accept, Utc::now())
            .expect("multi-seat accept");

        assert_eq!(vacancy.status, VacancyStatus::Open);
        assert_eq!(vacancy.count_by_status(ApplicationStatus::Accepted), 2);
    }

    #[test]
    fn applying_requires_open_vacancy() {
        let mut vacancy = vacancy();
        vacancy.fill().expect("filled");
        let err = vacancy
            .apply(AccountId::from("acc-late"), String::new(), Utc::now())
            .expect_err("filled vacancy takes no applications");
        assert!(matches!(
            err,
            MarketError::IllegalTransition { from: "filled", .. }
        ));
    }

    #[test]
    fn filled_and_closed_are_terminal() {
        let mut vacancy = vacancy();
        vacancy.close().expect("closed");
        assert!(vacancy.fill().is_err());
        assert!(vacancy.close().is_err());
        assert!(!vacancy.is_open());
    }

    #[test]
    fn duplicate_application_is_rejected() {
        let mut vacancy = vacancy();
        vacancy
            .apply(AccountId::from("acc-spec"), String::new(), Utc::now())
            .expect("first");
        let err = vacancy
            .apply(AccountId::from("acc-spec"), String::new(), Utc::now())
            .expect_err("duplicate");
        assert!(matches!(err, MarketError::AlreadyExists(_)));
        assert_eq!(vacancy.applications.len(), 1);
    }
}

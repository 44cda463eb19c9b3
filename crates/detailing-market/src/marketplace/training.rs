use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AccountId, EnrollmentId};
use super::error::MarketError;

/// A specialist's seat in a training course.
///
/// `certificate_id` is only ever set together with `completed_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingEnrollment {
    pub id: EnrollmentId,
    pub specialist_id: AccountId,
    pub course: String,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub certificate_id: Option<String>,
    pub revision: u64,
}

impl TrainingEnrollment {
    pub(crate) fn enroll(
        specialist_id: AccountId,
        course: String,
        now: DateTime<Utc>,
    ) -> Result<Self, MarketError> {
        if course.trim().is_empty() {
            return Err(MarketError::Validation("course is required".to_string()));
        }

        Ok(Self {
            id: EnrollmentId::generate(),
            specialist_id,
            course,
            enrolled_at: now,
            completed_at: None,
            certificate_id: None,
            revision: 0,
        })
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub(crate) fn complete(
        &mut self,
        certificate_id: String,
        now: DateTime<Utc>,
    ) -> Result<(), MarketError> {
        if self.is_completed() {
            return Err(MarketError::illegal(
                "training enrollment",
                "completed",
                "complete",
            ));
        }
        self.completed_at = Some(now);
        self.certificate_id = Some(certificate_id);
        Ok(())
    }
}

/// Certificate numbers run `UC-<year>-<NNN>` in completion order.
pub fn certificate_number(issued_at: DateTime<Utc>, previously_completed: usize) -> String {
    format!("UC-{}-{:03}", issued_at.year(), previously_completed + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn certificate_numbers_are_zero_padded() {
        let issued = Utc
            .with_ymd_and_hms(2026, 3, 14, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        assert_eq!(certificate_number(issued, 0), "UC-2026-001");
        assert_eq!(certificate_number(issued, 41), "UC-2026-042");
    }

    #[test]
    fn completing_twice_is_illegal() {
        let now = Utc::now();
        let mut enrollment =
            TrainingEnrollment::enroll(AccountId::from("acc-spec"), "Polishing 101".into(), now)
                .expect("enrolled");
        enrollment
            .complete("UC-2026-001".to_string(), now)
            .expect("completed");
        assert!(enrollment.is_completed());
        assert!(enrollment
            .complete("UC-2026-002".to_string(), now)
            .is_err());
        assert_eq!(enrollment.certificate_id.as_deref(), Some("UC-2026-001"));
    }
}

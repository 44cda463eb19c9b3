use tracing::{error, info};

use super::{details, require_owner, MarketplaceService};
use crate::marketplace::domain::{AccountId, ActorContext, EnrollmentId, Role};
use crate::marketplace::error::MarketError;
use crate::marketplace::repository::{Entity, MarketStore, Notifier};
use crate::marketplace::training::{certificate_number, TrainingEnrollment};

impl<S, N> MarketplaceService<S, N>
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    pub fn enrollment(&self, id: &EnrollmentId) -> Result<TrainingEnrollment, MarketError> {
        self.store()
            .enrollments()
            .fetch(id)?
            .ok_or_else(|| MarketError::not_found(TrainingEnrollment::KIND, id))
    }

    pub fn enrollments_for(
        &self,
        specialist_id: &AccountId,
    ) -> Result<Vec<TrainingEnrollment>, MarketError> {
        Ok(self
            .store()
            .enrollments()
            .list()?
            .into_iter()
            .filter(|enrollment| &enrollment.specialist_id == specialist_id)
            .collect())
    }

    pub fn enroll(&self, ctx: &ActorContext, course: String) -> Result<TrainingEnrollment, MarketError> {
        self.require_role(ctx, &[Role::Specialist], "enroll in training")?;

        let _gate = self.creation_gate()?;
        if self
            .enrollments_for(&ctx.account_id)?
            .iter()
            .any(|enrollment| enrollment.course.eq_ignore_ascii_case(course.trim()))
        {
            return Err(MarketError::AlreadyExists(format!(
                "already enrolled in '{course}'"
            )));
        }

        let enrollment = TrainingEnrollment::enroll(ctx.account_id.clone(), course, self.now())?;
        let stored = self.store().enrollments().insert(enrollment)?;
        info!(enrollment_id = %stored.id, specialist_id = %stored.specialist_id, course = %stored.course, "training enrollment created");
        Ok(stored)
    }

    /// Complete an enrollment, issue its certificate, and mark the specialist certified.
    ///
    /// If the account cannot be updated the enrollment is restored, so a certificate never
    /// exists without a certified holder.
    pub fn complete_training(
        &self,
        ctx: &ActorContext,
        id: &EnrollmentId,
    ) -> Result<TrainingEnrollment, MarketError> {
        let now = self.now();

        // Numbering depends on how many certificates exist; hold the gate so two
        // completions cannot draw the same number.
        let _gate = self.creation_gate()?;
        let issued = self
            .store()
            .enrollments()
            .list()?
            .iter()
            .filter(|enrollment| enrollment.is_completed())
            .count();
        let certificate = certificate_number(now, issued);

        let (enrollment, _) = self.mutate(self.store().enrollments(), id, |enrollment| {
            require_owner(ctx, &enrollment.specialist_id, "complete this training")?;
            enrollment.complete(certificate.clone(), now)
        })?;

        let certified = self.mutate(
            self.store().accounts(),
            &enrollment.specialist_id,
            |account| {
                account.is_certified = true;
                Ok(())
            },
        );
        if let Err(err) = certified {
            error!(enrollment_id = %id, error = %err, "certifying specialist failed, reverting enrollment");
            self.mutate(self.store().enrollments(), id, |enrollment| {
                enrollment.completed_at = None;
                enrollment.certificate_id = None;
                Ok(())
            })?;
            return Err(err);
        }

        info!(enrollment_id = %id, certificate = %certificate, "training completed");
        self.notify(
            "training.certificate_issued",
            &enrollment.specialist_id,
            details([
                ("course", enrollment.course.clone()),
                ("certificate_id", certificate),
            ]),
        );
        Ok(enrollment)
    }

    /// The completed enrollment that carries this certificate number, if any.
    pub fn verify_certificate(
        &self,
        certificate_id: &str,
    ) -> Result<Option<TrainingEnrollment>, MarketError> {
        let wanted = certificate_id.trim();
        Ok(self
            .store()
            .enrollments()
            .list()?
            .into_iter()
            .find(|enrollment| {
                enrollment.is_completed()
                    && enrollment
                        .certificate_id
                        .as_deref()
                        .is_some_and(|issued| issued.eq_ignore_ascii_case(wanted))
            }))
    }
}

use tracing::info;

use super::{details, query, require_owner, require_writer, MarketplaceService};
use crate::marketplace::domain::{ActorContext, ApplicationId, ResourceKind, Role, VacancyId};
use crate::marketplace::error::MarketError;
use crate::marketplace::lifecycle::ListingQuery;
use crate::marketplace::repository::{Entity, MarketStore, Notifier};
use crate::marketplace::vacancy::{
    Application, ApplicationDecision, NewVacancy, Vacancy, VacancyStatus,
};

impl<S, N> MarketplaceService<S, N>
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    pub fn vacancy(&self, id: &VacancyId) -> Result<Vacancy, MarketError> {
        self.store()
            .vacancies()
            .fetch(id)?
            .ok_or_else(|| MarketError::not_found(Vacancy::KIND, id))
    }

    pub fn list_vacancies(
        &self,
        filter: &ListingQuery<VacancyStatus>,
    ) -> Result<Vec<Vacancy>, MarketError> {
        query(self.store().vacancies(), filter)
    }

    /// Publish a vacancy after checking the employer's plan allowance.
    pub fn create_vacancy(
        &self,
        ctx: &ActorContext,
        new: NewVacancy,
    ) -> Result<Vacancy, MarketError> {
        self.require_role(ctx, &[Role::Employer], "publish vacancies")?;
        require_writer(ctx, "publish vacancies")?;

        let _gate = self.creation_gate()?;
        self.admit(&ctx.account_id, ResourceKind::Vacancy)?;
        let vacancy = Vacancy::open(ctx.account_id.clone(), new, self.now())?;
        let stored = self.store().vacancies().insert(vacancy)?;

        info!(vacancy_id = %stored.id, employer_id = %stored.employer_id, "vacancy published");
        Ok(stored)
    }

    /// Remove the vacancy together with its applications.
    pub fn delete_vacancy(&self, ctx: &ActorContext, id: &VacancyId) -> Result<Vacancy, MarketError> {
        require_writer(ctx, "delete vacancies")?;
        let vacancy = self.vacancy(id)?;
        require_owner(ctx, &vacancy.employer_id, "delete this vacancy")?;

        let removed = self
            .store()
            .vacancies()
            .delete(id)?
            .ok_or_else(|| MarketError::not_found(Vacancy::KIND, id))?;
        info!(vacancy_id = %id, applications = removed.applications.len(), "vacancy deleted");
        Ok(removed)
    }

    pub fn apply_to_vacancy(
        &self,
        ctx: &ActorContext,
        id: &VacancyId,
        message: String,
    ) -> Result<Application, MarketError> {
        self.require_role(ctx, &[Role::Specialist], "apply to vacancies")?;
        let now = self.now();
        let (vacancy, application) = self.mutate(self.store().vacancies(), id, |vacancy| {
            vacancy.apply(ctx.account_id.clone(), message.clone(), now)
        })?;

        info!(vacancy_id = %id, application_id = %application.id, "application received");
        self.notify(
            "vacancy.application_received",
            &vacancy.employer_id,
            details([
                ("vacancy_id", id.to_string()),
                ("application_id", application.id.to_string()),
            ]),
        );
        Ok(application)
    }

    pub fn accept_application(
        &self,
        ctx: &ActorContext,
        vacancy_id: &VacancyId,
        application_id: &ApplicationId,
    ) -> Result<Application, MarketError> {
        self.decide_application(ctx, vacancy_id, application_id, ApplicationDecision::Accept)
    }

    pub fn reject_application(
        &self,
        ctx: &ActorContext,
        vacancy_id: &VacancyId,
        application_id: &ApplicationId,
    ) -> Result<Application, MarketError> {
        self.decide_application(ctx, vacancy_id, application_id, ApplicationDecision::Reject)
    }

    pub fn decide_application(
        &self,
        ctx: &ActorContext,
        vacancy_id: &VacancyId,
        application_id: &ApplicationId,
        decision: ApplicationDecision,
    ) -> Result<Application, MarketError> {
        require_writer(ctx, "decide applications")?;
        let now = self.now();
        let (_, application) = self.mutate(self.store().vacancies(), vacancy_id, |vacancy| {
            require_owner(ctx, &vacancy.employer_id, "decide applications")?;
            vacancy.decide(application_id, decision, now)
        })?;

        info!(
            vacancy_id = %vacancy_id,
            application_id = %application_id,
            status = application.status.label(),
            "application decided"
        );
        self.notify(
            "vacancy.application_decided",
            &application.specialist_id,
            details([
                ("vacancy_id", vacancy_id.to_string()),
                ("application_id", application_id.to_string()),
                ("status", application.status.label().to_string()),
            ]),
        );
        Ok(application)
    }

    pub fn fill_vacancy(&self, ctx: &ActorContext, id: &VacancyId) -> Result<Vacancy, MarketError> {
        require_writer(ctx, "fill vacancies")?;
        let (vacancy, _) = self.mutate(self.store().vacancies(), id, |vacancy| {
            require_owner(ctx, &vacancy.employer_id, "fill this vacancy")?;
            vacancy.fill()
        })?;
        info!(vacancy_id = %id, "vacancy filled");
        Ok(vacancy)
    }

    pub fn close_vacancy(&self, ctx: &ActorContext, id: &VacancyId) -> Result<Vacancy, MarketError> {
        require_writer(ctx, "close vacancies")?;
        let (vacancy, _) = self.mutate(self.store().vacancies(), id, |vacancy| {
            require_owner(ctx, &vacancy.employer_id, "close this vacancy")?;
            vacancy.close()
        })?;
        info!(vacancy_id = %id, "vacancy closed");
        Ok(vacancy)
    }
}

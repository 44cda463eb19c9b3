//! Per-role read model. Read-only; stale by at most the last committed write.

use serde::Serialize;

use super::accounts::PortfolioItem;
use super::domain::{
    ActorContext, GigId, OrderId, Plan, PromoId, PurchaseId, ResourceKind, Role, VacancyId,
};
use super::entitlement::EntitlementUsage;
use super::error::MarketError;
use super::gig::{GigResponse, GigStatus};
use super::lifecycle::ListingQuery;
use super::order::{OrderResponse, OrderResponseStatus, OrderStatus};
use super::purchase::PurchaseStatus;
use super::repository::{MarketStore, Notifier};
use super::review::Reputation;
use super::service::MarketplaceService;
use super::training::TrainingEnrollment;
use super::vacancy::{Application, ApplicationStatus, VacancyStatus};

#[derive(Debug, Clone, Serialize)]
pub struct VacancySummary {
    pub vacancy_id: VacancyId,
    pub title: String,
    pub status: VacancyStatus,
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GigSummary {
    pub gig_id: GigId,
    pub title: String,
    pub status: GigStatus,
    pub urgent: bool,
    pub responses: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub service: String,
    pub status: OrderStatus,
    pub responses: usize,
    pub pending_responses: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_price: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseSummary {
    pub purchase_id: PurchaseId,
    pub product: String,
    pub status: PurchaseStatus,
    pub participants: usize,
    pub min_participants: u32,
    pub total_volume: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromoSummary {
    pub promo_id: PromoId,
    pub code: String,
    pub is_active: bool,
    pub used_count: u32,
    /// `None` means unlimited.
    pub remaining_uses: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployerDashboard {
    pub vacancies: Vec<VacancySummary>,
    pub gigs: Vec<GigSummary>,
    pub vacancy_usage: EntitlementUsage,
    pub sub_account_usage: EntitlementUsage,
    pub reputation: Reputation,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpecialistDashboard {
    pub applications: Vec<Application>,
    pub gig_responses: Vec<GigResponse>,
    pub order_responses: Vec<OrderResponse>,
    pub portfolio: Vec<PortfolioItem>,
    pub enrollments: Vec<TrainingEnrollment>,
    pub is_certified: bool,
    pub reputation: Reputation,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientDashboard {
    pub orders: Vec<OrderSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplierDashboard {
    pub purchases: Vec<PurchaseSummary>,
    pub promos: Vec<PromoSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum DashboardView {
    Employer(EmployerDashboard),
    Specialist(SpecialistDashboard),
    Client(ClientDashboard),
    Supplier(SupplierDashboard),
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub account_id: String,
    pub display_name: String,
    pub plan: Plan,
    #[serde(flatten)]
    pub view: DashboardView,
}

impl<S, N> MarketplaceService<S, N>
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    pub fn dashboard(&self, ctx: &ActorContext) -> Result<Dashboard, MarketError> {
        let account = self.account(&ctx.account_id)?;
        let view = match account.role {
            Role::Employer => DashboardView::Employer(self.employer_view(ctx)?),
            Role::Specialist => DashboardView::Specialist(SpecialistDashboard {
                applications: self.applications_by(ctx)?,
                gig_responses: self.gig_responses_by(ctx)?,
                order_responses: self.order_responses_by(ctx)?,
                portfolio: account.portfolio.clone(),
                enrollments: self.enrollments_for(&ctx.account_id)?,
                is_certified: account.is_certified,
                reputation: self.reputation(&ctx.account_id)?,
            }),
            Role::Client => DashboardView::Client(self.client_view(ctx)?),
            Role::Supplier => DashboardView::Supplier(self.supplier_view(ctx)?),
        };

        Ok(Dashboard {
            account_id: account.id.to_string(),
            display_name: account.display_name().to_string(),
            plan: account.effective_plan(self.now()),
            view,
        })
    }

    fn employer_view(&self, ctx: &ActorContext) -> Result<EmployerDashboard, MarketError> {
        let owned = ListingQuery::owned_by(ctx.account_id.clone());
        let vacancies = self
            .list_vacancies(&owned)?
            .into_iter()
            .map(|vacancy| VacancySummary {
                pending: vacancy.count_by_status(ApplicationStatus::Pending),
                accepted: vacancy.count_by_status(ApplicationStatus::Accepted),
                rejected: vacancy.count_by_status(ApplicationStatus::Rejected),
                vacancy_id: vacancy.id,
                title: vacancy.title,
                status: vacancy.status,
            })
            .collect();
        let gigs = self
            .list_gigs(&ListingQuery::owned_by(ctx.account_id.clone()))?
            .into_iter()
            .map(|gig| GigSummary {
                responses: gig.responses.len(),
                gig_id: gig.id,
                title: gig.title,
                status: gig.status,
                urgent: gig.urgent,
            })
            .collect();

        Ok(EmployerDashboard {
            vacancies,
            gigs,
            vacancy_usage: self.can_create(&ctx.account_id, ResourceKind::Vacancy)?,
            sub_account_usage: self.can_create(&ctx.account_id, ResourceKind::SubAccount)?,
            reputation: self.reputation(&ctx.account_id)?,
        })
    }

    fn client_view(&self, ctx: &ActorContext) -> Result<ClientDashboard, MarketError> {
        let orders = self
            .list_orders(&ListingQuery::owned_by(ctx.account_id.clone()))?
            .into_iter()
            .map(|order| OrderSummary {
                responses: order.responses.len(),
                pending_responses: order
                    .responses
                    .iter()
                    .filter(|response| response.status == OrderResponseStatus::Pending)
                    .count(),
                accepted_price: order.accepted_response().map(|response| response.price),
                order_id: order.id,
                service: order.service,
                status: order.status,
            })
            .collect();
        Ok(ClientDashboard { orders })
    }

    fn supplier_view(&self, ctx: &ActorContext) -> Result<SupplierDashboard, MarketError> {
        let purchases = self
            .list_purchases(&ListingQuery::owned_by(ctx.account_id.clone()))?
            .into_iter()
            .map(|purchase| PurchaseSummary {
                participants: purchase.participants.len(),
                total_volume: purchase.total_volume(),
                min_participants: purchase.min_participants,
                status: purchase.status,
                purchase_id: purchase.id,
                product: purchase.product,
            })
            .collect();
        let promos = self
            .promos_owned_by(&ctx.account_id)?
            .into_iter()
            .map(|promo| PromoSummary {
                remaining_uses: promo.remaining_uses(),
                promo_id: promo.id,
                code: promo.code,
                is_active: promo.is_active,
                used_count: promo.used_count,
            })
            .collect();
        Ok(SupplierDashboard { purchases, promos })
    }

    fn applications_by(&self, ctx: &ActorContext) -> Result<Vec<Application>, MarketError> {
        Ok(self
            .list_vacancies(&ListingQuery::default())?
            .into_iter()
            .flat_map(|vacancy| vacancy.applications)
            .filter(|application| application.specialist_id == ctx.account_id)
            .collect())
    }

    fn gig_responses_by(&self, ctx: &ActorContext) -> Result<Vec<GigResponse>, MarketError> {
        Ok(self
            .list_gigs(&ListingQuery::default())?
            .into_iter()
            .flat_map(|gig| gig.responses)
            .filter(|response| response.specialist_id == ctx.account_id)
            .collect())
    }

    fn order_responses_by(&self, ctx: &ActorContext) -> Result<Vec<OrderResponse>, MarketError> {
        Ok(self
            .list_orders(&ListingQuery::default())?
            .into_iter()
            .flat_map(|order| order.responses)
            .filter(|response| response.responder_id == ctx.account_id)
            .collect())
    }
}

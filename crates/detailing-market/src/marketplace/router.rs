use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::accounts::{FavoriteKind, NewAccount, NewPortfolioItem};
use super::domain::{
    AccountId, ActorContext, ApplicationId, EnrollmentId, GigId, OrderId, OrderResponseId, Outcome,
    PortfolioItemId, PromoId, PurchaseId, SubAccountId, SubAccountRole, VacancyId,
};
use super::error::MarketError;
use super::gig::NewGig;
use super::lifecycle::{ListingQuery, ListingRef};
use super::order::NewOrder;
use super::promo::NewPromo;
use super::purchase::NewPurchase;
use super::repository::{MarketStore, Notifier};
use super::review::NewReview;
use super::service::MarketplaceService;
use super::vacancy::{ApplicationDecision, NewVacancy};
use crate::error::AppError;

/// Header carrying the acting account id.
pub const ACCOUNT_HEADER: &str = "x-account-id";
/// Optional header naming the employer sub-account that is acting.
pub const SUB_ACCOUNT_HEADER: &str = "x-sub-account-id";

type Market<S, N> = State<Arc<MarketplaceService<S, N>>>;

/// Router exposing marketplace commands and queries over JSON.
pub fn market_router<S, N>(service: Arc<MarketplaceService<S, N>>) -> Router
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route("/api/v1/market/accounts", post(register_handler::<S, N>))
        .route(
            "/api/v1/market/accounts/:account_id/reputation",
            get(reputation_handler::<S, N>),
        )
        .route(
            "/api/v1/market/accounts/:account_id/reviews",
            get(reviews_for_handler::<S, N>),
        )
        .route(
            "/api/v1/market/accounts/:account_id/training",
            get(enrollments_for_handler::<S, N>),
        )
        .route("/api/v1/market/dashboard", get(dashboard_handler::<S, N>))
        .route(
            "/api/v1/market/sub-accounts",
            post(add_sub_account_handler::<S, N>),
        )
        .route(
            "/api/v1/market/sub-accounts/:sub_account_id",
            delete(remove_sub_account_handler::<S, N>),
        )
        .route("/api/v1/market/favorites", post(add_favorite_handler::<S, N>))
        .route(
            "/api/v1/market/favorites/:target_type/:target_id",
            delete(remove_favorite_handler::<S, N>),
        )
        .route(
            "/api/v1/market/portfolio",
            post(add_portfolio_item_handler::<S, N>),
        )
        .route(
            "/api/v1/market/portfolio/:item_id",
            delete(remove_portfolio_item_handler::<S, N>),
        )
        .route(
            "/api/v1/market/availability",
            put(availability_handler::<S, N>),
        )
        .route(
            "/api/v1/market/vacancies",
            get(list_vacancies_handler::<S, N>).post(create_vacancy_handler::<S, N>),
        )
        .route(
            "/api/v1/market/vacancies/:vacancy_id",
            get(vacancy_handler::<S, N>).delete(delete_vacancy_handler::<S, N>),
        )
        .route(
            "/api/v1/market/vacancies/:vacancy_id/applications",
            post(apply_handler::<S, N>),
        )
        .route(
            "/api/v1/market/vacancies/:vacancy_id/applications/:application_id/:decision",
            post(decide_application_handler::<S, N>),
        )
        .route(
            "/api/v1/market/vacancies/:vacancy_id/fill",
            post(fill_vacancy_handler::<S, N>),
        )
        .route(
            "/api/v1/market/vacancies/:vacancy_id/close",
            post(close_vacancy_handler::<S, N>),
        )
        .route(
            "/api/v1/market/gigs",
            get(list_gigs_handler::<S, N>).post(create_gig_handler::<S, N>),
        )
        .route(
            "/api/v1/market/gigs/:gig_id",
            get(gig_handler::<S, N>).delete(delete_gig_handler::<S, N>),
        )
        .route(
            "/api/v1/market/gigs/:gig_id/close",
            post(close_gig_handler::<S, N>),
        )
        .route(
            "/api/v1/market/gigs/:gig_id/responses",
            post(respond_to_gig_handler::<S, N>),
        )
        .route(
            "/api/v1/market/orders",
            get(list_orders_handler::<S, N>).post(create_order_handler::<S, N>),
        )
        .route(
            "/api/v1/market/orders/:order_id",
            get(order_handler::<S, N>).delete(delete_order_handler::<S, N>),
        )
        .route(
            "/api/v1/market/orders/:order_id/responses",
            post(respond_to_order_handler::<S, N>),
        )
        .route(
            "/api/v1/market/orders/:order_id/responses/:response_id/accept",
            post(accept_order_response_handler::<S, N>),
        )
        .route(
            "/api/v1/market/orders/:order_id/responses/:response_id/reject",
            post(reject_order_response_handler::<S, N>),
        )
        .route(
            "/api/v1/market/orders/:order_id/complete",
            post(complete_order_handler::<S, N>),
        )
        .route(
            "/api/v1/market/orders/:order_id/cancel",
            post(cancel_order_handler::<S, N>),
        )
        .route(
            "/api/v1/market/purchases",
            get(list_purchases_handler::<S, N>).post(create_purchase_handler::<S, N>),
        )
        .route(
            "/api/v1/market/purchases/:purchase_id",
            get(purchase_handler::<S, N>).delete(delete_purchase_handler::<S, N>),
        )
        .route(
            "/api/v1/market/purchases/:purchase_id/participants",
            post(join_purchase_handler::<S, N>),
        )
        .route(
            "/api/v1/market/purchases/:purchase_id/complete",
            post(complete_purchase_handler::<S, N>),
        )
        .route(
            "/api/v1/market/purchases/:purchase_id/cancel",
            post(cancel_purchase_handler::<S, N>),
        )
        .route("/api/v1/market/promos", post(create_promo_handler::<S, N>))
        .route(
            "/api/v1/market/promos/redeem",
            post(redeem_promo_handler::<S, N>),
        )
        .route(
            "/api/v1/market/promos/:promo_id/deactivate",
            post(deactivate_promo_handler::<S, N>),
        )
        .route("/api/v1/market/reviews", post(write_review_handler::<S, N>))
        .route("/api/v1/market/training", post(enroll_handler::<S, N>))
        .route(
            "/api/v1/market/training/:enrollment_id/complete",
            post(complete_training_handler::<S, N>),
        )
        .route(
            "/api/v1/market/certificates/:certificate_id",
            get(verify_certificate_handler::<S, N>),
        )
        .route(
            "/api/v1/market/listings/:kind/:listing_id/responses",
            get(responses_handler::<S, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct BidBody {
    pub price: u32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinBody {
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct RedeemBody {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct SubAccountBody {
    pub name: String,
    pub email: String,
    pub role: SubAccountRole,
}

#[derive(Debug, Deserialize)]
pub struct FavoriteBody {
    pub target_id: String,
    pub target_type: FavoriteKind,
}

/// Either flag may be omitted; at least one must be present.
#[derive(Debug, Deserialize)]
pub struct AvailabilityBody {
    #[serde(default)]
    pub looking_for_job: Option<bool>,
    #[serde(default)]
    pub available_for_gigs: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct EnrollBody {
    pub course: String,
}

fn failure(err: MarketError) -> Response {
    AppError::from(err).into_response()
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, MarketError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => failure(err),
    }
}

fn no_content<T>(result: Result<T, MarketError>) -> Response {
    match result {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => failure(err),
    }
}

/// `201 Created` for new records, `200 OK` when the call changed nothing.
fn respond_outcome<T: Serialize>(result: Result<Outcome<T>, MarketError>) -> Response {
    match result {
        Ok(outcome) => {
            let status = if outcome.is_created() {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(outcome)).into_response()
        }
        Err(err) => failure(err),
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub(crate) fn actor<S, N>(
    service: &MarketplaceService<S, N>,
    headers: &HeaderMap,
) -> Result<ActorContext, Response>
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let Some(account_id) = header(headers, ACCOUNT_HEADER) else {
        let payload = json!({
            "error": format!("missing {ACCOUNT_HEADER} header"),
            "code": "unauthenticated",
        });
        return Err((StatusCode::UNAUTHORIZED, Json(payload)).into_response());
    };
    let account_id = AccountId::from(account_id);

    let context = match header(headers, SUB_ACCOUNT_HEADER) {
        Some(sub_id) => service.context_for_delegate(&account_id, &SubAccountId::from(sub_id)),
        None => service.context_for(&account_id),
    };
    context.map_err(failure)
}

macro_rules! actor_or_return {
    ($service:expr, $headers:expr) => {
        match actor(&$service, &$headers) {
            Ok(ctx) => ctx,
            Err(response) => return response,
        }
    };
}

pub(crate) async fn register_handler<S, N>(
    State(service): Market<S, N>,
    Json(new): Json<NewAccount>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    respond(StatusCode::CREATED, service.register(new))
}

pub(crate) async fn reputation_handler<S, N>(
    State(service): Market<S, N>,
    Path(account_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    respond(StatusCode::OK, service.reputation(&AccountId(account_id)))
}

pub(crate) async fn dashboard_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(StatusCode::OK, service.dashboard(&ctx))
}

pub(crate) async fn list_vacancies_handler<S, N>(State(service): Market<S, N>) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    respond(
        StatusCode::OK,
        service.list_vacancies(&ListingQuery::default()),
    )
}

pub(crate) async fn list_gigs_handler<S, N>(State(service): Market<S, N>) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    respond(StatusCode::OK, service.list_gigs(&ListingQuery::default()))
}

pub(crate) async fn list_orders_handler<S, N>(State(service): Market<S, N>) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    respond(StatusCode::OK, service.list_orders(&ListingQuery::default()))
}

pub(crate) async fn list_purchases_handler<S, N>(State(service): Market<S, N>) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    respond(
        StatusCode::OK,
        service.list_purchases(&ListingQuery::default()),
    )
}

pub(crate) async fn vacancy_handler<S, N>(
    State(service): Market<S, N>,
    Path(vacancy_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    respond(StatusCode::OK, service.vacancy(&VacancyId(vacancy_id)))
}

pub(crate) async fn create_vacancy_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Json(new): Json<NewVacancy>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(StatusCode::CREATED, service.create_vacancy(&ctx, new))
}

pub(crate) async fn delete_vacancy_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(vacancy_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    no_content(service.delete_vacancy(&ctx, &VacancyId(vacancy_id)))
}

pub(crate) async fn apply_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(vacancy_id): Path<String>,
    Json(body): Json<MessageBody>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(
        StatusCode::CREATED,
        service.apply_to_vacancy(&ctx, &VacancyId(vacancy_id), body.message),
    )
}

pub(crate) async fn decide_application_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path((vacancy_id, application_id, decision)): Path<(String, String, String)>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    let decision = match decision.as_str() {
        "accept" => ApplicationDecision::Accept,
        "reject" => ApplicationDecision::Reject,
        other => {
            return failure(MarketError::Validation(format!(
                "unknown decision '{other}'"
            )))
        }
    };
    respond(
        StatusCode::OK,
        service.decide_application(
            &ctx,
            &VacancyId(vacancy_id),
            &ApplicationId(application_id),
            decision,
        ),
    )
}

pub(crate) async fn create_gig_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Json(new): Json<NewGig>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(StatusCode::CREATED, service.create_gig(&ctx, new))
}

pub(crate) async fn respond_to_gig_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(gig_id): Path<String>,
    Json(body): Json<MessageBody>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond_outcome(service.respond_to_gig(&ctx, &GigId(gig_id), body.message))
}

pub(crate) async fn create_order_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Json(new): Json<NewOrder>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(StatusCode::CREATED, service.create_order(&ctx, new))
}

pub(crate) async fn respond_to_order_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
    Json(body): Json<BidBody>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(
        StatusCode::CREATED,
        service.respond_to_order(&ctx, &OrderId(order_id), body.price, body.message),
    )
}

pub(crate) async fn accept_order_response_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path((order_id, response_id)): Path<(String, String)>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(
        StatusCode::OK,
        service.accept_order_response(&ctx, &OrderId(order_id), &OrderResponseId(response_id)),
    )
}

pub(crate) async fn complete_order_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(StatusCode::OK, service.complete_order(&ctx, &OrderId(order_id)))
}

pub(crate) async fn create_purchase_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Json(new): Json<NewPurchase>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(StatusCode::CREATED, service.create_purchase(&ctx, new))
}

pub(crate) async fn join_purchase_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(purchase_id): Path<String>,
    Json(body): Json<JoinBody>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond_outcome(service.join_purchase(&ctx, &PurchaseId(purchase_id), body.quantity))
}

pub(crate) async fn create_promo_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Json(new): Json<NewPromo>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(StatusCode::CREATED, service.create_promo(&ctx, new))
}

pub(crate) async fn redeem_promo_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Json(body): Json<RedeemBody>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond_outcome(service.redeem_promo(&ctx, &body.code))
}

pub(crate) async fn responses_handler<S, N>(
    State(service): Market<S, N>,
    Path((kind, listing_id)): Path<(String, String)>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let listing = match kind.as_str() {
        "vacancies" => ListingRef::Vacancy(VacancyId(listing_id)),
        "gigs" => ListingRef::Gig(GigId(listing_id)),
        "orders" => ListingRef::Order(OrderId(listing_id)),
        "purchases" => ListingRef::Purchase(PurchaseId(listing_id)),
        other => {
            return failure(MarketError::Validation(format!(
                "unknown listing kind '{other}'"
            )))
        }
    };
    respond(StatusCode::OK, service.responses(&listing))
}

pub(crate) async fn reviews_for_handler<S, N>(
    State(service): Market<S, N>,
    Path(account_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    respond(StatusCode::OK, service.reviews_for(&AccountId(account_id)))
}

pub(crate) async fn enrollments_for_handler<S, N>(
    State(service): Market<S, N>,
    Path(account_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    respond(StatusCode::OK, service.enrollments_for(&AccountId(account_id)))
}

pub(crate) async fn add_sub_account_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Json(body): Json<SubAccountBody>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(
        StatusCode::CREATED,
        service.add_sub_account(&ctx, body.name, body.email, body.role),
    )
}

pub(crate) async fn remove_sub_account_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(sub_account_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(
        StatusCode::OK,
        service.remove_sub_account(&ctx, &SubAccountId(sub_account_id)),
    )
}

pub(crate) async fn add_favorite_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Json(body): Json<FavoriteBody>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond_outcome(service.add_favorite(&ctx, body.target_id, body.target_type))
}

pub(crate) async fn remove_favorite_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path((target_type, target_id)): Path<(FavoriteKind, String)>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(
        StatusCode::OK,
        service
            .remove_favorite(&ctx, &target_id, target_type)
            .map(|removed| json!({ "removed": removed })),
    )
}

pub(crate) async fn add_portfolio_item_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Json(item): Json<NewPortfolioItem>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(StatusCode::CREATED, service.add_portfolio_item(&ctx, item))
}

pub(crate) async fn remove_portfolio_item_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(item_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(
        StatusCode::OK,
        service.remove_portfolio_item(&ctx, &PortfolioItemId(item_id)),
    )
}

pub(crate) async fn availability_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Json(body): Json<AvailabilityBody>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    let mut account = None;
    if let Some(looking) = body.looking_for_job {
        match service.set_looking_for_job(&ctx, looking) {
            Ok(updated) => account = Some(updated),
            Err(err) => return failure(err),
        }
    }
    if let Some(available) = body.available_for_gigs {
        match service.set_available_for_gigs(&ctx, available) {
            Ok(updated) => account = Some(updated),
            Err(err) => return failure(err),
        }
    }
    respond(
        StatusCode::OK,
        account.ok_or_else(|| {
            MarketError::Validation(
                "set looking_for_job or available_for_gigs".to_string(),
            )
        }),
    )
}

pub(crate) async fn fill_vacancy_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(vacancy_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(StatusCode::OK, service.fill_vacancy(&ctx, &VacancyId(vacancy_id)))
}

pub(crate) async fn close_vacancy_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(vacancy_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(StatusCode::OK, service.close_vacancy(&ctx, &VacancyId(vacancy_id)))
}

pub(crate) async fn gig_handler<S, N>(
    State(service): Market<S, N>,
    Path(gig_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    respond(StatusCode::OK, service.gig(&GigId(gig_id)))
}

pub(crate) async fn delete_gig_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(gig_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    no_content(service.delete_gig(&ctx, &GigId(gig_id)))
}

pub(crate) async fn close_gig_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(gig_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(StatusCode::OK, service.close_gig(&ctx, &GigId(gig_id)))
}

pub(crate) async fn order_handler<S, N>(
    State(service): Market<S, N>,
    Path(order_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    respond(StatusCode::OK, service.order(&OrderId(order_id)))
}

pub(crate) async fn delete_order_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    no_content(service.delete_order(&ctx, &OrderId(order_id)))
}

pub(crate) async fn reject_order_response_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path((order_id, response_id)): Path<(String, String)>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(
        StatusCode::OK,
        service.reject_order_response(&ctx, &OrderId(order_id), &OrderResponseId(response_id)),
    )
}

pub(crate) async fn cancel_order_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(StatusCode::OK, service.cancel_order(&ctx, &OrderId(order_id)))
}

pub(crate) async fn purchase_handler<S, N>(
    State(service): Market<S, N>,
    Path(purchase_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    respond(StatusCode::OK, service.purchase(&PurchaseId(purchase_id)))
}

pub(crate) async fn delete_purchase_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(purchase_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    no_content(service.delete_purchase(&ctx, &PurchaseId(purchase_id)))
}

pub(crate) async fn complete_purchase_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(purchase_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(
        StatusCode::OK,
        service.complete_purchase(&ctx, &PurchaseId(purchase_id)),
    )
}

pub(crate) async fn cancel_purchase_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(purchase_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(
        StatusCode::OK,
        service.cancel_purchase(&ctx, &PurchaseId(purchase_id)),
    )
}

pub(crate) async fn deactivate_promo_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(promo_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(StatusCode::OK, service.deactivate_promo(&ctx, &PromoId(promo_id)))
}

pub(crate) async fn write_review_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Json(new): Json<NewReview>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(StatusCode::CREATED, service.write_review(&ctx, new))
}

pub(crate) async fn enroll_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Json(body): Json<EnrollBody>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(StatusCode::CREATED, service.enroll(&ctx, body.course))
}

pub(crate) async fn complete_training_handler<S, N>(
    State(service): Market<S, N>,
    headers: HeaderMap,
    Path(enrollment_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let ctx = actor_or_return!(service, headers);
    respond(
        StatusCode::OK,
        service.complete_training(&ctx, &EnrollmentId(enrollment_id)),
    )
}

/// Public certificate lookup; an unknown number is a 404.
pub(crate) async fn verify_certificate_handler<S, N>(
    State(service): Market<S, N>,
    Path(certificate_id): Path<String>,
) -> Response
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let verified = service.verify_certificate(&certificate_id).and_then(|found| {
        found.ok_or_else(|| MarketError::not_found("certificate", &certificate_id))
    });
    respond(StatusCode::OK, verified)
}

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::config::MarketConfig;
use crate::marketplace::accounts::{Account, NewAccount, Profile};
use crate::marketplace::clock::ManualClock;
use crate::marketplace::domain::{AccountId, ActorContext, Plan, Role};
use crate::marketplace::gig::{Gig, NewGig};
use crate::marketplace::memory::{InMemoryMarketStore, InMemoryRepository, RecordingNotifier};
use crate::marketplace::order::{CarDetails, NewOrder, Order};
use crate::marketplace::promo::Promo;
use crate::marketplace::purchase::{CollectivePurchase, NewPurchase};
use crate::marketplace::repository::{
    MarketNotice, MarketStore, Notifier, NotifyError, Repository, RepositoryError,
};
use crate::marketplace::review::Review;
use crate::marketplace::service::MarketplaceService;
use crate::marketplace::training::TrainingEnrollment;
use crate::marketplace::vacancy::{NewVacancy, Vacancy};

pub(super) type MemoryService = MarketplaceService<InMemoryMarketStore, RecordingNotifier>;

pub(super) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .expect("valid start time")
}

pub(super) struct Harness {
    pub service: Arc<MemoryService>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
}

pub(super) fn harness() -> Harness {
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = Arc::new(ManualClock::new(start()));
    let service = Arc::new(MarketplaceService::with_clock(
        Arc::new(InMemoryMarketStore::default()),
        notifier.clone(),
        MarketConfig::default(),
        clock.clone(),
    ));
    Harness {
        service,
        notifier,
        clock,
    }
}

impl Harness {
    pub fn templates(&self) -> Vec<String> {
        self.notifier
            .events()
            .into_iter()
            .map(|notice| notice.template)
            .collect()
    }
}

static EMAIL_SEQUENCE: AtomicU32 = AtomicU32::new(1);

pub(super) fn new_account(role: Role, plan: Plan) -> NewAccount {
    let n = EMAIL_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    NewAccount {
        role,
        plan,
        plan_expires_at: None,
        profile: Profile {
            name: format!("{role} {n}"),
            email: format!("{role}-{n}@example.com"),
            phone: "+7 900 000 00 00".to_string(),
            city: "Moscow".to_string(),
            company_name: (role == Role::Employer).then(|| format!("Detail Studio {n}")),
            tax_id: (role == Role::Employer).then(|| format!("77{n:08}")),
            address: (role == Role::Employer).then(|| format!("Tverskaya st. {n}")),
            ..Profile::default()
        },
    }
}

/// Register an account on any service and hand back its principal context.
pub(super) fn register<S, N>(
    service: &MarketplaceService<S, N>,
    role: Role,
    plan: Plan,
) -> ActorContext
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    let account = service
        .register(new_account(role, plan))
        .expect("account registers");
    ActorContext::new(account.id, account.role)
}

pub(super) fn new_vacancy(title: &str) -> NewVacancy {
    NewVacancy {
        title: title.to_string(),
        city: "Moscow".to_string(),
        salary: "from 90 000".to_string(),
        description: "Full-time detailer".to_string(),
    }
}

pub(super) fn new_gig(title: &str) -> NewGig {
    NewGig {
        title: title.to_string(),
        city: "Kazan".to_string(),
        date: NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date"),
        payment: 5_000,
        description: String::new(),
        urgent: true,
    }
}

pub(super) fn new_order() -> NewOrder {
    NewOrder {
        service: "Polishing".to_string(),
        city: "Moscow".to_string(),
        car: CarDetails {
            make: "Toyota".to_string(),
            model: Some("Camry".to_string()),
            body_type: Some("sedan".to_string()),
        },
        budget: Some(25_000),
        preferred_date: None,
        description: "Two-stage polish".to_string(),
    }
}

pub(super) fn new_purchase(min_participants: u32, deadline_in: Duration) -> NewPurchase {
    NewPurchase {
        product: "Ceramic coating 50ml".to_string(),
        category: "chemicals".to_string(),
        price_per_unit: 3_200,
        retail_price: Some(4_500),
        min_participants,
        deadline: start() + deadline_in,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Notifier whose transport is always down.
#[derive(Default)]
pub(super) struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn publish(&self, _notice: MarketNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp offline".to_string()))
    }
}

/// Account repository whose updates can be switched off.
#[derive(Default)]
pub(super) struct BrittleAccounts {
    inner: InMemoryRepository<Account>,
    pub fail_updates: AtomicBool,
}

impl Repository<Account> for BrittleAccounts {
    fn insert(&self, entity: Account) -> Result<Account, RepositoryError> {
        self.inner.insert(entity)
    }

    fn fetch(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn update(&self, entity: Account) -> Result<Account, RepositoryError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("accounts offline".to_string()));
        }
        self.inner.update(entity)
    }

    fn delete(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        self.inner.delete(id)
    }

    fn list(&self) -> Result<Vec<Account>, RepositoryError> {
        self.inner.list()
    }
}

/// Store that keeps everything in memory but routes account writes through
/// [`BrittleAccounts`].
#[derive(Default)]
pub(super) struct BrittleStore {
    pub accounts: BrittleAccounts,
    vacancies: InMemoryRepository<Vacancy>,
    gigs: InMemoryRepository<Gig>,
    orders: InMemoryRepository<Order>,
    purchases: InMemoryRepository<CollectivePurchase>,
    promos: InMemoryRepository<Promo>,
    enrollments: InMemoryRepository<TrainingEnrollment>,
    reviews: InMemoryRepository<Review>,
}

impl MarketStore for BrittleStore {
    fn accounts(&self) -> &dyn Repository<Account> {
        &self.accounts
    }

    fn vacancies(&self) -> &dyn Repository<Vacancy> {
        &self.vacancies
    }

    fn gigs(&self) -> &dyn Repository<Gig> {
        &self.gigs
    }

    fn orders(&self) -> &dyn Repository<Order> {
        &self.orders
    }

    fn purchases(&self) -> &dyn Repository<CollectivePurchase> {
        &self.purchases
    }

    fn promos(&self) -> &dyn Repository<Promo> {
        &self.promos
    }

    fn enrollments(&self) -> &dyn Repository<TrainingEnrollment> {
        &self.enrollments
    }

    fn reviews(&self) -> &dyn Repository<Review> {
        &self.reviews
    }
}

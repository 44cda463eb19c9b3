use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use super::accounts::Account;
use super::domain::AccountId;
use super::gig::Gig;
use super::order::Order;
use super::promo::Promo;
use super::purchase::CollectivePurchase;
use super::review::Review;
use super::training::TrainingEnrollment;
use super::vacancy::Vacancy;

/// Stored record with an identity and a revision counter for compare-and-set writes.
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Clone + Eq + Ord + Hash + fmt::Display + Send + Sync + 'static;

    /// Human-readable kind used in error messages.
    const KIND: &'static str;

    fn id(&self) -> &Self::Id;
    fn revision(&self) -> u64;
    fn set_revision(&mut self, revision: u64);
}

/// Storage abstraction so services can be exercised against any backend.
///
/// `update` must only succeed when the stored revision equals the revision on the
/// incoming record; the stored copy then carries the next revision.
pub trait Repository<E: Entity>: Send + Sync {
    fn insert(&self, entity: E) -> Result<E, RepositoryError>;
    fn fetch(&self, id: &E::Id) -> Result<Option<E>, RepositoryError>;
    fn update(&self, entity: E) -> Result<E, RepositoryError>;
    fn delete(&self, id: &E::Id) -> Result<Option<E>, RepositoryError>;
    fn list(&self) -> Result<Vec<E>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record was modified concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Bundle of repositories backing the marketplace.
pub trait MarketStore: Send + Sync {
    fn accounts(&self) -> &dyn Repository<Account>;
    fn vacancies(&self) -> &dyn Repository<Vacancy>;
    fn gigs(&self) -> &dyn Repository<Gig>;
    fn orders(&self) -> &dyn Repository<Order>;
    fn purchases(&self) -> &dyn Repository<CollectivePurchase>;
    fn promos(&self) -> &dyn Repository<Promo>;
    fn enrollments(&self) -> &dyn Repository<TrainingEnrollment>;
    fn reviews(&self) -> &dyn Repository<Review>;
}

/// Outbound notice hook (e-mail, push, chat bots).
pub trait Notifier: Send + Sync {
    fn publish(&self, notice: MarketNotice) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketNotice {
    pub template: String,
    pub recipient: AccountId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notice transport unavailable: {0}")]
    Transport(String),
}

macro_rules! entity {
    ($type:ty, $id:ty, $kind:literal) => {
        impl Entity for $type {
            type Id = $id;

            const KIND: &'static str = $kind;

            fn id(&self) -> &Self::Id {
                &self.id
            }

            fn revision(&self) -> u64 {
                self.revision
            }

            fn set_revision(&mut self, revision: u64) {
                self.revision = revision;
            }
        }
    };
}

entity!(Account, AccountId, "account");
entity!(Vacancy, super::domain::VacancyId, "vacancy");
entity!(Gig, super::domain::GigId, "gig");
entity!(Order, super::domain::OrderId, "order");
entity!(CollectivePurchase, super::domain::PurchaseId, "collective purchase");
entity!(Promo, super::domain::PromoId, "promo");
entity!(
    TrainingEnrollment,
    super::domain::EnrollmentId,
    "training enrollment"
);
entity!(Review, super::domain::ReviewId, "review");

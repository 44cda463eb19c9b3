use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::accounts::Account;
use super::gig::Gig;
use super::order::Order;
use super::promo::Promo;
use super::purchase::CollectivePurchase;
use super::repository::{
    Entity, MarketNotice, MarketStore, Notifier, NotifyError, Repository, RepositoryError,
};
use super::review::Review;
use super::training::TrainingEnrollment;
use super::vacancy::Vacancy;

/// Process-local repository. Records are keyed by id, so listing order follows id order.
pub struct InMemoryRepository<E: Entity> {
    records: Mutex<BTreeMap<E::Id, E>>,
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
        }
    }
}

impl<E: Entity> InMemoryRepository<E> {
    fn guard(&self) -> Result<MutexGuard<'_, BTreeMap<E::Id, E>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    fn insert(&self, mut entity: E) -> Result<E, RepositoryError> {
        let mut guard = self.guard()?;
        if guard.contains_key(entity.id()) {
            return Err(RepositoryError::Conflict);
        }
        entity.set_revision(1);
        guard.insert(entity.id().clone(), entity.clone());
        Ok(entity)
    }

    fn fetch(&self, id: &E::Id) -> Result<Option<E>, RepositoryError> {
        Ok(self.guard()?.get(id).cloned())
    }

    fn update(&self, mut entity: E) -> Result<E, RepositoryError> {
        let mut guard = self.guard()?;
        let stored = guard.get(entity.id()).ok_or(RepositoryError::NotFound)?;
        if stored.revision() != entity.revision() {
            return Err(RepositoryError::Conflict);
        }
        entity.set_revision(entity.revision() + 1);
        guard.insert(entity.id().clone(), entity.clone());
        Ok(entity)
    }

    fn delete(&self, id: &E::Id) -> Result<Option<E>, RepositoryError> {
        Ok(self.guard()?.remove(id))
    }

    fn list(&self) -> Result<Vec<E>, RepositoryError> {
        Ok(self.guard()?.values().cloned().collect())
    }
}

/// All marketplace collections held in memory.
#[derive(Default)]
pub struct InMemoryMarketStore {
    accounts: InMemoryRepository<Account>,
    vacancies: InMemoryRepository<Vacancy>,
    gigs: InMemoryRepository<Gig>,
    orders: InMemoryRepository<Order>,
    purchases: InMemoryRepository<CollectivePurchase>,
    promos: InMemoryRepository<Promo>,
    enrollments: InMemoryRepository<TrainingEnrollment>,
    reviews: InMemoryRepository<Review>,
}

impl MarketStore for InMemoryMarketStore {
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

/// Notifier that keeps every notice for later inspection.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<MarketNotice>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<MarketNotice> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn publish(&self, notice: MarketNotice) -> Result<(), NotifyError> {
        self.events
            .lock()
            .map_err(|_| NotifyError::Transport("notice buffer poisoned".to_string()))?
            .push(notice);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::domain::{AccountId, EnrollmentId};
    use chrono::Utc;

    fn enrollment(id: &str) -> TrainingEnrollment {
        TrainingEnrollment {
            id: EnrollmentId::from(id),
            specialist_id: AccountId::from("acc-spec"),
            course: "Polishing".to_string(),
            enrolled_at: Utc::now(),
            completed_at: None,
            certificate_id: None,
            revision: 0,
        }
    }

    #[test]
    fn stale_update_is_a_conflict() {
        let repository = InMemoryRepository::<TrainingEnrollment>::default();
        let stored = repository.insert(enrollment("enr-1")).expect("insert");
        assert_eq!(stored.revision, 1);

        let fresh = repository.update(stored.clone()).expect("first update");
        assert_eq!(fresh.revision, 2);

        match repository.update(stored) {
            Err(RepositoryError::Conflict) => {}
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_insert_is_a_conflict() {
        let repository = InMemoryRepository::<TrainingEnrollment>::default();
        repository.insert(enrollment("enr-1")).expect("insert");
        assert!(matches!(
            repository.insert(enrollment("enr-1")),
            Err(RepositoryError::Conflict)
        ));
    }

    #[test]
    fn update_of_missing_record_is_not_found() {
        let repository = InMemoryRepository::<TrainingEnrollment>::default();
        assert!(matches!(
            repository.update(enrollment("enr-404")),
            Err(RepositoryError::NotFound)
        ));
    }
}

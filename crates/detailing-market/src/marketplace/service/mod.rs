//! Command and query facade over the marketplace store.
//!
//! Every command takes an explicit [`ActorContext`]. Mutations of one entity run through
//! [`MarketplaceService::mutate`], which re-reads and re-applies the transition when a
//! concurrent writer got there first, so a state-machine step is never applied to stale state.
//! A context is only honoured when its account exists and holds the role the context claims.

mod accounts;
mod gigs;
mod orders;
mod promos;
mod purchases;
mod reviews;
mod training;
mod vacancies;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::MarketConfig;

use super::accounts::Account;
use super::clock::{Clock, SystemClock};
use super::domain::{AccountId, ActorContext, Outcome, ResourceKind, Role};
use super::entitlement::EntitlementUsage;
use super::error::MarketError;
use super::lifecycle::{Listing, ListingQuery, ListingRef, ResponseRecord};
use super::repository::{
    Entity, MarketNotice, MarketStore, Notifier, Repository, RepositoryError,
};

pub use purchases::SweepSummary;

/// Service composing the store, notifier, and clock.
pub struct MarketplaceService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    config: MarketConfig,
    creation_gate: Mutex<()>,
}

impl<S, N> MarketplaceService<S, N>
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: MarketConfig) -> Self {
        Self::with_clock(store, notifier, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<S>,
        notifier: Arc<N>,
        config: MarketConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            config: MarketConfig {
                write_retries: config.write_retries.max(1),
                ..config
            },
            creation_gate: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    /// Resolve the acting context for a principal account.
    pub fn context_for(&self, account_id: &AccountId) -> Result<ActorContext, MarketError> {
        let account = self.account(account_id)?;
        Ok(ActorContext::new(account.id, account.role))
    }

    pub fn account(&self, account_id: &AccountId) -> Result<Account, MarketError> {
        self.store
            .accounts()
            .fetch(account_id)?
            .ok_or_else(|| MarketError::not_found(Account::KIND, account_id))
    }

    /// Load the acting account and check it still holds the role the context claims.
    pub(crate) fn authenticate(&self, ctx: &ActorContext) -> Result<Account, MarketError> {
        let account = self.account(&ctx.account_id)?;
        if account.role != ctx.role {
            return Err(MarketError::Forbidden(format!(
                "context claims the {} role but account {} is {}",
                ctx.role, account.id, account.role
            )));
        }
        Ok(account)
    }

    pub(crate) fn require_role(
        &self,
        ctx: &ActorContext,
        allowed: &[Role],
        action: &str,
    ) -> Result<(), MarketError> {
        self.authenticate(ctx)?;
        if allowed.contains(&ctx.role) {
            return Ok(());
        }
        Err(MarketError::Forbidden(format!(
            "{} accounts cannot {action}",
            ctx.role
        )))
    }

    /// Apply `apply` to a fresh copy of the entity and commit it with compare-and-set.
    ///
    /// An error from `apply` aborts without writing anything. A write conflict re-reads and
    /// re-applies, up to the configured number of attempts.
    pub(crate) fn mutate<E, T, F>(
        &self,
        repository: &dyn Repository<E>,
        id: &E::Id,
        apply: F,
    ) -> Result<(E, T), MarketError>
    where
        E: Entity,
        F: FnMut(&mut E) -> Result<T, MarketError>,
    {
        self.commit(repository, id, apply, |_| true)
    }

    /// Like [`Self::mutate`], but an `Unchanged` outcome returns the fetched entity
    /// without writing, so its revision stays put.
    pub(crate) fn mutate_outcome<E, T, F>(
        &self,
        repository: &dyn Repository<E>,
        id: &E::Id,
        apply: F,
    ) -> Result<(E, Outcome<T>), MarketError>
    where
        E: Entity,
        F: FnMut(&mut E) -> Result<Outcome<T>, MarketError>,
    {
        self.commit(repository, id, apply, Outcome::is_created)
    }

    fn commit<E, T, F>(
        &self,
        repository: &dyn Repository<E>,
        id: &E::Id,
        mut apply: F,
        changed: fn(&T) -> bool,
    ) -> Result<(E, T), MarketError>
    where
        E: Entity,
        F: FnMut(&mut E) -> Result<T, MarketError>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut entity = repository
                .fetch(id)?
                .ok_or_else(|| MarketError::not_found(E::KIND, id))?;
            let output = apply(&mut entity)?;
            if !changed(&output) {
                return Ok((entity, output));
            }

            match repository.update(entity) {
                Ok(stored) => return Ok((stored, output)),
                Err(RepositoryError::Conflict) if attempt < self.config.write_retries => {
                    warn!(kind = E::KIND, %id, attempt, "write conflict, re-applying");
                }
                Err(RepositoryError::NotFound) => return Err(MarketError::not_found(E::KIND, id)),
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Serializes create-after-count so two concurrent creations cannot both pass a cap.
    pub(crate) fn creation_gate(&self) -> Result<MutexGuard<'_, ()>, MarketError> {
        self.creation_gate.lock().map_err(|_| {
            MarketError::Repository(RepositoryError::Unavailable(
                "creation gate poisoned".to_string(),
            ))
        })
    }

    /// Current usage against the plan cap. Pure query.
    pub fn can_create(
        &self,
        account_id: &AccountId,
        resource: ResourceKind,
    ) -> Result<EntitlementUsage, MarketError> {
        let account = self.account(account_id)?;
        let in_use = self.in_use(&account, resource)?;
        Ok(EntitlementUsage::evaluate(
            account.effective_plan(self.now()),
            resource,
            in_use,
        ))
    }

    /// Fail with `EntitlementExceeded` when the owner is at the cap. Call with the
    /// creation gate held.
    pub(crate) fn admit(
        &self,
        owner: &AccountId,
        resource: ResourceKind,
    ) -> Result<(), MarketError> {
        let usage = self.can_create(owner, resource)?;
        if usage.allowed() {
            return Ok(());
        }
        debug!(%owner, %resource, in_use = usage.in_use, "creation blocked by plan cap");
        Err(MarketError::EntitlementExceeded {
            resource,
            cap: usage.cap,
        })
    }

    fn in_use(&self, account: &Account, resource: ResourceKind) -> Result<usize, MarketError> {
        match resource {
            ResourceKind::Vacancy => count_open(self.store.vacancies(), &account.id),
            ResourceKind::Gig => count_open(self.store.gigs(), &account.id),
            ResourceKind::Order => count_open(self.store.orders(), &account.id),
            ResourceKind::Purchase => count_open(self.store.purchases(), &account.id),
            ResourceKind::SubAccount => Ok(account.sub_accounts.len()),
        }
    }

    /// Every response attached to one listing, as tagged records.
    pub fn responses(&self, listing: &ListingRef) -> Result<Vec<ResponseRecord>, MarketError> {
        let records = match listing {
            ListingRef::Vacancy(id) => self
                .vacancy(id)?
                .applications
                .into_iter()
                .map(ResponseRecord::Application)
                .collect(),
            ListingRef::Gig(id) => self
                .gig(id)?
                .responses
                .into_iter()
                .map(ResponseRecord::GigResponse)
                .collect(),
            ListingRef::Order(id) => self
                .order(id)?
                .responses
                .into_iter()
                .map(ResponseRecord::OrderResponse)
                .collect(),
            ListingRef::Purchase(id) => self
                .purchase(id)?
                .participants
                .into_iter()
                .map(ResponseRecord::Participation)
                .collect(),
        };
        Ok(records)
    }

    /// Notices go out after the write committed; a failed notice is logged, never undone.
    pub(crate) fn notify(
        &self,
        template: &str,
        recipient: &AccountId,
        details: BTreeMap<String, String>,
    ) {
        let notice = MarketNotice {
            template: template.to_string(),
            recipient: recipient.clone(),
            details,
        };
        if let Err(err) = self.notifier.publish(notice) {
            warn!(template, %recipient, error = %err, "failed to publish notice");
        }
    }
}

pub(crate) fn query<L: Listing>(
    repository: &dyn Repository<L>,
    query: &ListingQuery<L::Status>,
) -> Result<Vec<L>, MarketError> {
    Ok(repository
        .list()?
        .into_iter()
        .filter(|listing| query.matches(listing))
        .collect())
}

fn count_open<L: Listing>(
    repository: &dyn Repository<L>,
    owner: &AccountId,
) -> Result<usize, MarketError> {
    Ok(repository
        .list()?
        .iter()
        .filter(|listing| listing.owner() == owner && listing.is_open())
        .count())
}

pub(crate) fn details<const N: usize>(pairs: [(&str, String); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

pub(crate) fn require_writer(ctx: &ActorContext, action: &str) -> Result<(), MarketError> {
    if ctx.can_write() {
        return Ok(());
    }
    Err(MarketError::Forbidden(format!(
        "viewer sub-accounts cannot {action}"
    )))
}

pub(crate) fn require_principal(ctx: &ActorContext, action: &str) -> Result<(), MarketError> {
    if ctx.is_principal() {
        return Ok(());
    }
    Err(MarketError::Forbidden(format!(
        "sub-accounts cannot {action}"
    )))
}

pub(crate) fn require_owner(
    ctx: &ActorContext,
    owner: &AccountId,
    action: &str,
) -> Result<(), MarketError> {
    if &ctx.account_id == owner {
        return Ok(());
    }
    Err(MarketError::Forbidden(format!(
        "only the owner can {action}"
    )))
}

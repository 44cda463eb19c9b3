use serde::Serialize;
use tracing::{info, warn};

use super::{details, query, require_owner, require_principal, MarketplaceService};
use crate::marketplace::domain::{ActorContext, Outcome, PurchaseId, ResourceKind, Role};
use crate::marketplace::error::MarketError;
use crate::marketplace::lifecycle::ListingQuery;
use crate::marketplace::purchase::{
    CollectivePurchase, NewPurchase, PurchaseParticipant, PurchaseStatus,
};
use crate::marketplace::repository::{Entity, MarketStore, Notifier};

/// Purchases moved by one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub completed: Vec<PurchaseId>,
    pub cancelled: Vec<PurchaseId>,
}

impl SweepSummary {
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.cancelled.is_empty()
    }
}

impl<S, N> MarketplaceService<S, N>
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    pub fn purchase(&self, id: &PurchaseId) -> Result<CollectivePurchase, MarketError> {
        self.store()
            .purchases()
            .fetch(id)?
            .ok_or_else(|| MarketError::not_found(CollectivePurchase::KIND, id))
    }

    pub fn list_purchases(
        &self,
        filter: &ListingQuery<PurchaseStatus>,
    ) -> Result<Vec<CollectivePurchase>, MarketError> {
        query(self.store().purchases(), filter)
    }

    pub fn create_purchase(
        &self,
        ctx: &ActorContext,
        new: NewPurchase,
    ) -> Result<CollectivePurchase, MarketError> {
        self.require_role(ctx, &[Role::Supplier], "run collective purchases")?;

        let _gate = self.creation_gate()?;
        self.admit(&ctx.account_id, ResourceKind::Purchase)?;
        let purchase = CollectivePurchase::open(ctx.account_id.clone(), new, self.now())?;
        let stored = self.store().purchases().insert(purchase)?;

        info!(
            purchase_id = %stored.id,
            supplier_id = %stored.supplier_id,
            min_participants = stored.min_participants,
            deadline = %stored.deadline,
            "collective purchase opened"
        );
        Ok(stored)
    }

    pub fn delete_purchase(
        &self,
        ctx: &ActorContext,
        id: &PurchaseId,
    ) -> Result<CollectivePurchase, MarketError> {
        let purchase = self.purchase(id)?;
        require_owner(ctx, &purchase.supplier_id, "delete this purchase")?;

        let removed = self
            .store()
            .purchases()
            .delete(id)?
            .ok_or_else(|| MarketError::not_found(CollectivePurchase::KIND, id))?;
        info!(purchase_id = %id, participants = removed.participants.len(), "collective purchase deleted");
        Ok(removed)
    }

    /// Join with a quantity. Joining again returns the existing participation unchanged.
    pub fn join_purchase(
        &self,
        ctx: &ActorContext,
        id: &PurchaseId,
        quantity: u32,
    ) -> Result<Outcome<PurchaseParticipant>, MarketError> {
        require_principal(ctx, "join collective purchases")?;
        self.authenticate(ctx)?;
        let existing = self.purchase(id)?;
        if existing.supplier_id == ctx.account_id {
            return Err(MarketError::Forbidden(
                "suppliers cannot join their own purchase".to_string(),
            ));
        }
        if let Some(participant) = existing
            .participants
            .iter()
            .find(|participant| participant.participant_id == ctx.account_id)
        {
            return Ok(Outcome::Unchanged(participant.clone()));
        }

        let now = self.now();
        let (purchase, outcome) = self.mutate_outcome(self.store().purchases(), id, |purchase| {
            purchase.join(ctx.account_id.clone(), quantity, now)
        })?;

        if outcome.is_created() {
            info!(
                purchase_id = %id,
                participant_id = %ctx.account_id,
                participants = purchase.participants.len(),
                "participant joined"
            );
        }
        Ok(outcome)
    }

    /// Owner closes the purchase before its deadline once the threshold is met.
    pub fn complete_purchase(
        &self,
        ctx: &ActorContext,
        id: &PurchaseId,
    ) -> Result<CollectivePurchase, MarketError> {
        let now = self.now();
        let (purchase, _) = self.mutate(self.store().purchases(), id, |purchase| {
            require_owner(ctx, &purchase.supplier_id, "complete this purchase")?;
            purchase.complete_early(now)
        })?;
        info!(purchase_id = %id, "collective purchase completed early");
        self.announce_settlement(&purchase);
        Ok(purchase)
    }

    pub fn cancel_purchase(
        &self,
        ctx: &ActorContext,
        id: &PurchaseId,
    ) -> Result<CollectivePurchase, MarketError> {
        let now = self.now();
        let (purchase, _) = self.mutate(self.store().purchases(), id, |purchase| {
            require_owner(ctx, &purchase.supplier_id, "cancel this purchase")?;
            purchase.cancel(now)
        })?;
        info!(purchase_id = %id, "collective purchase cancelled");
        self.announce_settlement(&purchase);
        Ok(purchase)
    }

    /// Settle every active purchase whose deadline has passed.
    ///
    /// One failing purchase is logged and skipped; the rest of the pass continues.
    pub fn sweep_purchases(&self) -> Result<SweepSummary, MarketError> {
        let now = self.now();
        let due: Vec<PurchaseId> = self
            .store()
            .purchases()
            .list()?
            .into_iter()
            .filter(|purchase| purchase.is_due(now))
            .map(|purchase| purchase.id)
            .collect();

        let mut summary = SweepSummary::default();
        for id in due {
            let settled = self.mutate(self.store().purchases(), &id, |purchase| {
                Ok(purchase.settle_if_due(now))
            });
            match settled {
                Ok((purchase, Some(status))) => {
                    info!(purchase_id = %id, status = status.label(), "collective purchase settled at deadline");
                    self.announce_settlement(&purchase);
                    match status {
                        PurchaseStatus::Completed => summary.completed.push(id),
                        PurchaseStatus::Cancelled => summary.cancelled.push(id),
                        PurchaseStatus::Active => {}
                    }
                }
                Ok((_, None)) => {}
                Err(MarketError::NotFound { .. }) => {}
                Err(err) => {
                    warn!(purchase_id = %id, error = %err, "failed to settle collective purchase");
                }
            }
        }
        Ok(summary)
    }

    fn announce_settlement(&self, purchase: &CollectivePurchase) {
        let template = match purchase.status {
            PurchaseStatus::Completed => "purchase.completed",
            PurchaseStatus::Cancelled => "purchase.cancelled",
            PurchaseStatus::Active => return,
        };
        let recipients = std::iter::once(&purchase.supplier_id).chain(
            purchase
                .participants
                .iter()
                .map(|participant| &participant.participant_id),
        );
        for recipient in recipients {
            self.notify(
                template,
                recipient,
                details([
                    ("purchase_id", purchase.id.to_string()),
                    ("participants", purchase.participants.len().to_string()),
                ]),
            );
        }
    }
}

use tracing::{debug, info};

use super::{details, query, require_owner, require_writer, MarketplaceService};
use crate::marketplace::domain::{ActorContext, GigId, Outcome, ResourceKind, Role};
use crate::marketplace::error::MarketError;
use crate::marketplace::gig::{Gig, GigResponse, GigStatus, NewGig};
use crate::marketplace::lifecycle::ListingQuery;
use crate::marketplace::repository::{Entity, MarketStore, Notifier};

impl<S, N> MarketplaceService<S, N>
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    pub fn gig(&self, id: &GigId) -> Result<Gig, MarketError> {
        self.store()
            .gigs()
            .fetch(id)?
            .ok_or_else(|| MarketError::not_found(Gig::KIND, id))
    }

    pub fn list_gigs(&self, filter: &ListingQuery<GigStatus>) -> Result<Vec<Gig>, MarketError> {
        query(self.store().gigs(), filter)
    }

    pub fn create_gig(&self, ctx: &ActorContext, new: NewGig) -> Result<Gig, MarketError> {
        self.require_role(ctx, &[Role::Employer], "post gigs")?;
        require_writer(ctx, "post gigs")?;

        let _gate = self.creation_gate()?;
        self.admit(&ctx.account_id, ResourceKind::Gig)?;
        let gig = Gig::open(ctx.account_id.clone(), new, self.now())?;
        let stored = self.store().gigs().insert(gig)?;

        info!(gig_id = %stored.id, employer_id = %stored.employer_id, urgent = stored.urgent, "gig posted");
        Ok(stored)
    }

    pub fn delete_gig(&self, ctx: &ActorContext, id: &GigId) -> Result<Gig, MarketError> {
        require_writer(ctx, "delete gigs")?;
        let gig = self.gig(id)?;
        require_owner(ctx, &gig.employer_id, "delete this gig")?;

        let removed = self
            .store()
            .gigs()
            .delete(id)?
            .ok_or_else(|| MarketError::not_found(Gig::KIND, id))?;
        info!(gig_id = %id, responses = removed.responses.len(), "gig deleted");
        Ok(removed)
    }

    /// Idempotent: a specialist responding again gets their original response back and
    /// nothing is written.
    pub fn respond_to_gig(
        &self,
        ctx: &ActorContext,
        id: &GigId,
        message: String,
    ) -> Result<Outcome<GigResponse>, MarketError> {
        self.require_role(ctx, &[Role::Specialist], "respond to gigs")?;

        let existing = self.gig(id)?;
        if let Some(response) = existing.response_from(&ctx.account_id) {
            debug!(gig_id = %id, specialist_id = %ctx.account_id, "repeat gig response ignored");
            return Ok(Outcome::Unchanged(response.clone()));
        }

        let now = self.now();
        let (gig, outcome) = self.mutate_outcome(self.store().gigs(), id, |gig| {
            gig.respond(ctx.account_id.clone(), message.clone(), now)
        })?;

        if let Outcome::Created(response) = &outcome {
            info!(gig_id = %id, response_id = %response.id, "gig response recorded");
            self.notify(
                "gig.response_received",
                &gig.employer_id,
                details([
                    ("gig_id", id.to_string()),
                    ("specialist_id", ctx.account_id.to_string()),
                ]),
            );
        }
        Ok(outcome)
    }

    pub fn close_gig(&self, ctx: &ActorContext, id: &GigId) -> Result<Gig, MarketError> {
        require_writer(ctx, "close gigs")?;
        let (gig, _) = self.mutate(self.store().gigs(), id, |gig| {
            require_owner(ctx, &gig.employer_id, "close this gig")?;
            gig.close()
        })?;
        info!(gig_id = %id, "gig closed");
        Ok(gig)
    }
}

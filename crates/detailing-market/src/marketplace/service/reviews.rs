use tracing::info;

use super::{details, require_principal, MarketplaceService};
use crate::marketplace::domain::{AccountId, ActorContext, Role};
use crate::marketplace::error::MarketError;
use crate::marketplace::repository::{MarketStore, Notifier};
use crate::marketplace::review::{NewReview, Reputation, Review, ReviewTarget};

impl<S, N> MarketplaceService<S, N>
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    /// Reviews are append-only; there is no edit or delete.
    pub fn write_review(&self, ctx: &ActorContext, new: NewReview) -> Result<Review, MarketError> {
        require_principal(ctx, "write reviews")?;
        self.authenticate(ctx)?;
        let target = self.account(&new.target_id)?;
        let kind = match target.role {
            Role::Specialist => ReviewTarget::Specialist,
            Role::Employer => ReviewTarget::Company,
            other => {
                return Err(MarketError::Validation(format!(
                    "{other} accounts cannot be reviewed"
                )))
            }
        };

        let review = Review::write(ctx.account_id.clone(), kind, new, self.now())?;
        let stored = self.store().reviews().insert(review)?;

        info!(review_id = %stored.id, target_id = %stored.target_id, rating = stored.rating, "review written");
        self.notify(
            "review.received",
            &stored.target_id,
            details([("rating", stored.rating.to_string())]),
        );
        Ok(stored)
    }

    pub fn reviews_for(&self, target_id: &AccountId) -> Result<Vec<Review>, MarketError> {
        Ok(self
            .store()
            .reviews()
            .list()?
            .into_iter()
            .filter(|review| &review.target_id == target_id)
            .collect())
    }

    pub fn reputation(&self, target_id: &AccountId) -> Result<Reputation, MarketError> {
        let reviews = self.reviews_for(target_id)?;
        Ok(Reputation::from_reviews(target_id.clone(), &reviews))
    }
}

use tracing::{debug, info};

use super::{require_owner, require_principal, MarketplaceService};
use crate::marketplace::domain::{AccountId, ActorContext, Outcome, PromoId, Role};
use crate::marketplace::error::MarketError;
use crate::marketplace::promo::{NewPromo, Promo, Redemption};
use crate::marketplace::repository::{Entity, MarketStore, Notifier};

impl<S, N> MarketplaceService<S, N>
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    pub fn promo(&self, id: &PromoId) -> Result<Promo, MarketError> {
        self.store()
            .promos()
            .fetch(id)?
            .ok_or_else(|| MarketError::not_found(Promo::KIND, id))
    }

    pub fn promos_owned_by(&self, owner: &AccountId) -> Result<Vec<Promo>, MarketError> {
        Ok(self
            .store()
            .promos()
            .list()?
            .into_iter()
            .filter(|promo| &promo.owner_id == owner)
            .collect())
    }

    /// Lookup by code is case-insensitive; codes are stored upper-cased.
    pub fn promo_by_code(&self, code: &str) -> Result<Promo, MarketError> {
        let code = code.trim().to_ascii_uppercase();
        self.store()
            .promos()
            .list()?
            .into_iter()
            .find(|promo| promo.code == code)
            .ok_or_else(|| MarketError::not_found(Promo::KIND, &code))
    }

    pub fn create_promo(&self, ctx: &ActorContext, new: NewPromo) -> Result<Promo, MarketError> {
        self.require_role(ctx, &[Role::Employer, Role::Supplier], "publish promo codes")?;
        require_principal(ctx, "publish promo codes")?;

        let _gate = self.creation_gate()?;
        let promo = Promo::publish(ctx.account_id.clone(), new, self.now())?;
        if self
            .store()
            .promos()
            .list()?
            .iter()
            .any(|existing| existing.code == promo.code)
        {
            return Err(MarketError::AlreadyExists(format!(
                "promo code '{}' is taken",
                promo.code
            )));
        }
        let stored = self.store().promos().insert(promo)?;
        info!(promo_id = %stored.id, code = %stored.code, discount = stored.discount_percent, "promo published");
        Ok(stored)
    }

    /// Redeem by code. The use counter never passes `max_uses`.
    pub fn redeem_promo(
        &self,
        ctx: &ActorContext,
        code: &str,
    ) -> Result<Outcome<Redemption>, MarketError> {
        require_principal(ctx, "redeem promo codes")?;
        self.authenticate(ctx)?;
        let promo = self.promo_by_code(code)?;
        let now = self.now();
        let (_, outcome) = self.mutate_outcome(self.store().promos(), &promo.id, |promo| {
            promo.redeem(&ctx.account_id, now)
        })?;

        match &outcome {
            Outcome::Created(redemption) => {
                info!(promo_id = %redemption.promo_id, used = redemption.used_count, "promo redeemed");
            }
            Outcome::Unchanged(redemption) => {
                debug!(promo_id = %redemption.promo_id, account_id = %ctx.account_id, "promo already redeemed by account");
            }
        }
        Ok(outcome)
    }

    pub fn deactivate_promo(&self, ctx: &ActorContext, id: &PromoId) -> Result<Promo, MarketError> {
        require_principal(ctx, "deactivate promo codes")?;
        let (promo, _) = self.mutate(self.store().promos(), id, |promo| {
            require_owner(ctx, &promo.owner_id, "deactivate this promo")?;
            promo.deactivate()
        })?;
        info!(promo_id = %id, "promo deactivated");
        Ok(promo)
    }
}

use tracing::info;

use super::{require_principal, MarketplaceService};
use crate::marketplace::accounts::{
    Account, Favorite, FavoriteKind, NewAccount, NewPortfolioItem, PortfolioItem, SubAccount,
};
use crate::marketplace::domain::{
    AccountId, ActorContext, Outcome, PortfolioItemId, ResourceKind, Role, SubAccountId,
    SubAccountRole,
};
use crate::marketplace::error::MarketError;
use crate::marketplace::repository::{MarketStore, Notifier};

fn same_text(left: &Option<String>, right: &Option<String>) -> bool {
    match (left, right) {
        (Some(left), Some(right)) => left.trim().eq_ignore_ascii_case(right.trim()),
        _ => false,
    }
}

impl<S, N> MarketplaceService<S, N>
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    /// Register a new account. Emails are unique; an employer's tax id and premises address
    /// can only be registered once.
    pub fn register(&self, new: NewAccount) -> Result<Account, MarketError> {
        let _gate = self.creation_gate()?;
        let existing = self.store().accounts().list()?;

        if existing
            .iter()
            .any(|account| account.profile.email.eq_ignore_ascii_case(new.profile.email.trim()))
        {
            return Err(MarketError::AlreadyExists(
                "an account with this email already exists".to_string(),
            ));
        }
        if new.role == Role::Employer {
            let employers = existing
                .iter()
                .filter(|account| account.role == Role::Employer);
            for employer in employers {
                if same_text(&employer.profile.tax_id, &new.profile.tax_id) {
                    return Err(MarketError::AlreadyExists(
                        "a company with this tax id is already registered".to_string(),
                    ));
                }
                if same_text(&employer.profile.address, &new.profile.address) {
                    return Err(MarketError::AlreadyExists(
                        "a business at this address is already registered".to_string(),
                    ));
                }
            }
        }

        let account = Account::register(new, self.now())?;
        let stored = self.store().accounts().insert(account)?;
        info!(account_id = %stored.id, role = %stored.role, "account registered");
        Ok(stored)
    }

    /// Context for a sub-account acting on behalf of its employer.
    pub fn context_for_delegate(
        &self,
        employer_id: &AccountId,
        sub_account_id: &SubAccountId,
    ) -> Result<ActorContext, MarketError> {
        let employer = self.account(employer_id)?;
        let sub = employer
            .sub_account(sub_account_id)
            .ok_or_else(|| MarketError::not_found("sub-account", sub_account_id))?;
        Ok(ActorContext::delegated(
            employer.id.clone(),
            employer.role,
            sub.role,
        ))
    }

    pub fn add_sub_account(
        &self,
        ctx: &ActorContext,
        name: String,
        email: String,
        role: SubAccountRole,
    ) -> Result<SubAccount, MarketError> {
        self.require_role(ctx, &[Role::Employer], "own sub-accounts")?;
        require_principal(ctx, "manage sub-accounts")?;
        if email.trim().is_empty() {
            return Err(MarketError::Validation(
                "sub-account email is required".to_string(),
            ));
        }

        let _gate = self.creation_gate()?;
        self.admit(&ctx.account_id, ResourceKind::SubAccount)?;

        let now = self.now();
        let (_, sub) = self.mutate(self.store().accounts(), &ctx.account_id, |account| {
            if account
                .sub_accounts
                .iter()
                .any(|sub| sub.email.eq_ignore_ascii_case(&email))
            {
                return Err(MarketError::AlreadyExists(format!(
                    "sub-account '{email}' already exists"
                )));
            }
            let sub = SubAccount {
                id: SubAccountId::generate(),
                name: name.clone(),
                email: email.clone(),
                role,
                created_at: now,
            };
            account.sub_accounts.push(sub.clone());
            Ok(sub)
        })?;

        info!(employer_id = %ctx.account_id, sub_account_id = %sub.id, role = sub.role.label(), "sub-account added");
        Ok(sub)
    }

    pub fn remove_sub_account(
        &self,
        ctx: &ActorContext,
        sub_account_id: &SubAccountId,
    ) -> Result<SubAccount, MarketError> {
        self.require_role(ctx, &[Role::Employer], "own sub-accounts")?;
        require_principal(ctx, "manage sub-accounts")?;
        let (_, removed) = self.mutate(self.store().accounts(), &ctx.account_id, |account| {
            account.remove_sub_account(sub_account_id)
        })?;
        Ok(removed)
    }

    pub fn add_favorite(
        &self,
        ctx: &ActorContext,
        target_id: String,
        target_type: FavoriteKind,
    ) -> Result<Outcome<Favorite>, MarketError> {
        require_principal(ctx, "edit favorites")?;
        self.authenticate(ctx)?;
        let favorite = Favorite {
            target_id,
            target_type,
        };
        let (_, outcome) = self.mutate_outcome(self.store().accounts(), &ctx.account_id, |account| {
            if account.favorites.insert(favorite.clone()) {
                Ok(Outcome::Created(favorite.clone()))
            } else {
                Ok(Outcome::Unchanged(favorite.clone()))
            }
        })?;
        Ok(outcome)
    }

    /// Removing something that is not a favorite is a no-op.
    pub fn remove_favorite(
        &self,
        ctx: &ActorContext,
        target_id: &str,
        target_type: FavoriteKind,
    ) -> Result<bool, MarketError> {
        require_principal(ctx, "edit favorites")?;
        self.authenticate(ctx)?;
        let favorite = Favorite {
            target_id: target_id.to_string(),
            target_type,
        };
        let (_, removed) = self.mutate(self.store().accounts(), &ctx.account_id, |account| {
            Ok(account.favorites.remove(&favorite))
        })?;
        Ok(removed)
    }

    pub fn add_portfolio_item(
        &self,
        ctx: &ActorContext,
        item: NewPortfolioItem,
    ) -> Result<PortfolioItem, MarketError> {
        self.require_role(ctx, &[Role::Specialist], "keep a portfolio")?;
        let now = self.now();
        let (_, item) = self.mutate(self.store().accounts(), &ctx.account_id, |account| {
            account.add_portfolio_item(item.clone(), now)
        })?;
        Ok(item)
    }

    pub fn remove_portfolio_item(
        &self,
        ctx: &ActorContext,
        item_id: &PortfolioItemId,
    ) -> Result<PortfolioItem, MarketError> {
        self.require_role(ctx, &[Role::Specialist], "keep a portfolio")?;
        let (_, removed) = self.mutate(self.store().accounts(), &ctx.account_id, |account| {
            account.remove_portfolio_item(item_id)
        })?;
        Ok(removed)
    }

    pub fn set_looking_for_job(
        &self,
        ctx: &ActorContext,
        looking: bool,
    ) -> Result<Account, MarketError> {
        self.require_role(ctx, &[Role::Specialist], "search for jobs")?;
        let (account, _) = self.mutate(self.store().accounts(), &ctx.account_id, |account| {
            account.is_looking_for_job = looking;
            Ok(())
        })?;
        Ok(account)
    }

    pub fn set_available_for_gigs(
        &self,
        ctx: &ActorContext,
        available: bool,
    ) -> Result<Account, MarketError> {
        self.require_role(ctx, &[Role::Specialist], "take gigs")?;
        let (account, _) = self.mutate(self.store().accounts(), &ctx.account_id, |account| {
            account.is_available_for_gigs = available;
            Ok(())
        })?;
        Ok(account)
    }
}

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AccountId, Plan, PortfolioItemId, Role, SubAccountId, SubAccountRole};
use super::error::MarketError;

/// Registered marketplace participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub role: Role,
    pub plan: Plan,
    pub plan_expires_at: Option<DateTime<Utc>>,
    pub profile: Profile,
    pub sub_accounts: Vec<SubAccount>,
    pub favorites: BTreeSet<Favorite>,
    pub portfolio: Vec<PortfolioItem>,
    pub is_looking_for_job: bool,
    pub is_available_for_gigs: bool,
    pub is_certified: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub revision: u64,
}

/// Free-form profile data. Role-specific fields stay `None` for other roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub company_name: Option<String>,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub specialization: Option<String>,
    pub category: Option<String>,
}

/// Registration payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub role: Role,
    #[serde(default)]
    pub plan: Plan,
    #[serde(default)]
    pub plan_expires_at: Option<DateTime<Utc>>,
    pub profile: Profile,
}

/// Employer-owned delegate login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubAccount {
    pub id: SubAccountId,
    pub name: String,
    pub email: String,
    pub role: SubAccountRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteKind {
    Company,
    Specialist,
    Vacancy,
    Supplier,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Favorite {
    pub target_id: String,
    pub target_type: FavoriteKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub id: PortfolioItemId,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPortfolioItem {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Account {
    pub(crate) fn register(new: NewAccount, now: DateTime<Utc>) -> Result<Self, MarketError> {
        if new.profile.email.trim().is_empty() {
            return Err(MarketError::Validation("email is required".to_string()));
        }
        if new.profile.name.trim().is_empty() && new.profile.company_name.is_none() {
            return Err(MarketError::Validation(
                "either a name or a company name is required".to_string(),
            ));
        }

        Ok(Self {
            id: AccountId::generate(),
            role: new.role,
            plan: new.plan,
            plan_expires_at: new.plan_expires_at,
            profile: new.profile,
            sub_accounts: Vec::new(),
            favorites: BTreeSet::new(),
            portfolio: Vec::new(),
            is_looking_for_job: false,
            is_available_for_gigs: false,
            is_certified: false,
            is_verified: new.role == Role::Client,
            created_at: now,
            revision: 0,
        })
    }

    /// Plan used for entitlement checks; a lapsed subscription falls back to free.
    pub fn effective_plan(&self, now: DateTime<Utc>) -> Plan {
        match self.plan_expires_at {
            Some(expiry) if expiry <= now => Plan::Free,
            _ => self.plan,
        }
    }

    pub fn display_name(&self) -> &str {
        self.profile
            .company_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.profile.name)
    }

    pub fn sub_account(&self, id: &SubAccountId) -> Option<&SubAccount> {
        self.sub_accounts.iter().find(|sub| &sub.id == id)
    }

    pub(crate) fn add_portfolio_item(
        &mut self,
        item: NewPortfolioItem,
        now: DateTime<Utc>,
    ) -> Result<PortfolioItem, MarketError> {
        if item.title.trim().is_empty() {
            return Err(MarketError::Validation(
                "portfolio item title is required".to_string(),
            ));
        }

        let item = PortfolioItem {
            id: PortfolioItemId::generate(),
            title: item.title,
            description: item.description,
            image_url: item.image_url,
            created_at: now,
        };
        self.portfolio.push(item.clone());
        Ok(item)
    }

    pub(crate) fn remove_portfolio_item(
        &mut self,
        id: &PortfolioItemId,
    ) -> Result<PortfolioItem, MarketError> {
        let index = self
            .portfolio
            .iter()
            .position(|item| &item.id == id)
            .ok_or_else(|| MarketError::not_found("portfolio item", id))?;
        Ok(self.portfolio.remove(index))
    }

    pub(crate) fn remove_sub_account(
        &mut self,
        id: &SubAccountId,
    ) -> Result<SubAccount, MarketError> {
        let index = self
            .sub_accounts
            .iter()
            .position(|sub| &sub.id == id)
            .ok_or_else(|| MarketError::not_found("sub-account", id))?;
        Ok(self.sub_accounts.remove(index))
    }
}

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_id(prefix: &str) -> String {
    let id = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id:06}")
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident => $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub(crate) fn generate() -> Self {
                Self(next_id($prefix))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

identifier!(
    /// Identifier for a registered account of any role.
    AccountId => "acc"
);
identifier!(SubAccountId => "sub");
identifier!(PortfolioItemId => "pf");
identifier!(VacancyId => "vac");
identifier!(ApplicationId => "app");
identifier!(GigId => "gig");
identifier!(GigResponseId => "gres");
identifier!(OrderId => "ord");
identifier!(OrderResponseId => "ores");
identifier!(PurchaseId => "pur");
identifier!(PromoId => "promo");
identifier!(EnrollmentId => "enr");
identifier!(ReviewId => "rev");

/// Marketplace role an account registers under. Fixed for the account's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employer,
    Specialist,
    Client,
    Supplier,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Employer => "employer",
            Self::Specialist => "specialist",
            Self::Client => "client",
            Self::Supplier => "supplier",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Subscription tier used to derive resource caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Free,
    Standard,
    Premium,
}

impl Plan {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Standard => "standard",
            Self::Premium => "premium",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "free" => Some(Self::Free),
            "standard" => Some(Self::Standard),
            "premium" => Some(Self::Premium),
            _ => None,
        }
    }
}

/// Permission level of an employer-owned delegate account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubAccountRole {
    Manager,
    Viewer,
}

impl SubAccountRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Viewer => "viewer",
        }
    }
}

/// Kinds of owned resources that plan tiers cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Vacancy,
    Gig,
    Order,
    Purchase,
    SubAccount,
}

impl ResourceKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Vacancy => "vacancies",
            Self::Gig => "gigs",
            Self::Order => "orders",
            Self::Purchase => "collective purchases",
            Self::SubAccount => "sub-accounts",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The acting party for a command. `account_id` is always the principal account; a
/// sub-account acting on its employer's behalf carries its permission level in `delegate`.
/// Obtain one from `MarketplaceService::context_for` or `context_for_delegate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub account_id: AccountId,
    pub role: Role,
    pub delegate: Option<SubAccountRole>,
}

impl ActorContext {
    pub(crate) fn new(account_id: AccountId, role: Role) -> Self {
        Self {
            account_id,
            role,
            delegate: None,
        }
    }

    pub(crate) fn delegated(
        account_id: AccountId,
        role: Role,
        delegate: SubAccountRole,
    ) -> Self {
        Self {
            account_id,
            role,
            delegate: Some(delegate),
        }
    }

    pub fn is_principal(&self) -> bool {
        self.delegate.is_none()
    }

    pub fn can_write(&self) -> bool {
        !matches!(self.delegate, Some(SubAccountRole::Viewer))
    }
}

/// Result of an idempotent command: either something new was recorded or the existing
/// state already satisfied the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum Outcome<T> {
    Created(T),
    Unchanged(T),
}

impl<T> Outcome<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Created(value) | Self::Unchanged(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Created(value) | Self::Unchanged(value) => value,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Created(value) => Outcome::Created(f(value)),
            Self::Unchanged(value) => Outcome::Unchanged(f(value)),
        }
    }
}

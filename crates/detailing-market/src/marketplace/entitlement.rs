use std::fmt;

use serde::{Serialize, Serializer};

use super::domain::{Plan, ResourceKind};

/// Cap on how many active resources of one kind an account may own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allowance {
    Limited(u32),
    Unlimited,
}

impl Allowance {
    pub fn permits(self, in_use: usize) -> bool {
        match self {
            Self::Limited(cap) => in_use < cap as usize,
            Self::Unlimited => true,
        }
    }

    pub fn remaining(self, in_use: usize) -> Option<usize> {
        match self {
            Self::Limited(cap) => Some((cap as usize).saturating_sub(in_use)),
            Self::Unlimited => None,
        }
    }
}

impl fmt::Display for Allowance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(cap) => write!(f, "{cap}"),
            Self::Unlimited => f.write_str("unlimited"),
        }
    }
}

impl Serialize for Allowance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Limited(cap) => serializer.serialize_some(cap),
            Self::Unlimited => serializer.serialize_none(),
        }
    }
}

/// Plan tier table. Gigs, orders, and collective purchases are uncapped on every tier.
pub const fn allowance(plan: Plan, resource: ResourceKind) -> Allowance {
    match (plan, resource) {
        (Plan::Free, ResourceKind::Vacancy) => Allowance::Limited(3),
        (Plan::Standard, ResourceKind::Vacancy) => Allowance::Limited(10),
        (Plan::Free, ResourceKind::SubAccount) => Allowance::Limited(0),
        (Plan::Standard, ResourceKind::SubAccount) => Allowance::Limited(3),
        (Plan::Premium, _) => Allowance::Unlimited,
        (_, ResourceKind::Gig | ResourceKind::Order | ResourceKind::Purchase) => {
            Allowance::Unlimited
        }
    }
}

/// Snapshot of one account's usage against its cap for a resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntitlementUsage {
    pub resource: ResourceKind,
    pub plan: Plan,
    pub in_use: usize,
    pub cap: Allowance,
}

impl EntitlementUsage {
    pub fn evaluate(plan: Plan, resource: ResourceKind, in_use: usize) -> Self {
        Self {
            resource,
            plan,
            in_use,
            cap: allowance(plan, resource),
        }
    }

    pub fn allowed(&self) -> bool {
        self.cap.permits(self.in_use)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLANS: [Plan; 3] = [Plan::Free, Plan::Standard, Plan::Premium];
    const KINDS: [ResourceKind; 5] = [
        ResourceKind::Vacancy,
        ResourceKind::Gig,
        ResourceKind::Order,
        ResourceKind::Purchase,
        ResourceKind::SubAccount,
    ];

    #[test]
    fn table_matches_plan_tiers() {
        assert_eq!(
            allowance(Plan::Free, ResourceKind::Vacancy),
            Allowance::Limited(3)
        );
        assert_eq!(
            allowance(Plan::Standard, ResourceKind::Vacancy),
            Allowance::Limited(10)
        );
        assert_eq!(
            allowance(Plan::Premium, ResourceKind::Vacancy),
            Allowance::Unlimited
        );
        assert_eq!(
            allowance(Plan::Free, ResourceKind::SubAccount),
            Allowance::Limited(0)
        );
        assert_eq!(
            allowance(Plan::Standard, ResourceKind::SubAccount),
            Allowance::Limited(3)
        );
        assert_eq!(
            allowance(Plan::Premium, ResourceKind::SubAccount),
            Allowance::Unlimited
        );
    }

    #[test]
    fn never_permits_reaching_past_the_cap() {
        for plan in PLANS {
            for kind in KINDS {
                let cap = allowance(plan, kind);
                for in_use in 0..64usize {
                    let usage = EntitlementUsage::evaluate(plan, kind, in_use);
                    if let Allowance::Limited(limit) = cap {
                        assert_eq!(
                            usage.allowed(),
                            in_use < limit as usize,
                            "{plan:?}/{kind:?} at {in_use}"
                        );
                    } else {
                        assert!(usage.allowed());
                    }
                }
            }
        }
    }

    #[test]
    fn remaining_saturates_at_zero() {
        assert_eq!(Allowance::Limited(3).remaining(5), Some(0));
        assert_eq!(Allowance::Limited(3).remaining(1), Some(2));
        assert_eq!(Allowance::Unlimited.remaining(100), None);
    }
}

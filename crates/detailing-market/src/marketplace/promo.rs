use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AccountId, Outcome, PromoId};
use super::error::MarketError;

/// Discount code published by an employer or supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promo {
    pub id: PromoId,
    pub owner_id: AccountId,
    pub code: String,
    pub title: String,
    pub discount_percent: u8,
    pub max_uses: Option<u32>,
    pub used_count: u32,
    pub is_active: bool,
    pub valid_until: Option<DateTime<Utc>>,
    pub redeemed_by: BTreeSet<AccountId>,
    pub created_at: DateTime<Utc>,
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPromo {
    pub code: String,
    pub title: String,
    pub discount_percent: u8,
    #[serde(default)]
    pub max_uses: Option<u32>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redemption {
    pub promo_id: PromoId,
    pub code: String,
    pub discount_percent: u8,
    pub used_count: u32,
}

impl Promo {
    pub(crate) fn publish(
        owner_id: AccountId,
        new: NewPromo,
        now: DateTime<Utc>,
    ) -> Result<Self, MarketError> {
        let code = new.code.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(MarketError::Validation("promo code is required".to_string()));
        }
        if new.discount_percent == 0 || new.discount_percent > 100 {
            return Err(MarketError::Validation(
                "discount must be between 1 and 100 percent".to_string(),
            ));
        }
        if new.max_uses == Some(0) {
            return Err(MarketError::Validation(
                "max uses must be at least 1 when set".to_string(),
            ));
        }

        Ok(Self {
            id: PromoId::generate(),
            owner_id,
            code,
            title: new.title,
            discount_percent: new.discount_percent,
            max_uses: new.max_uses,
            used_count: 0,
            is_active: true,
            valid_until: new.valid_until,
            redeemed_by: BTreeSet::new(),
            created_at: now,
            revision: 0,
        })
    }

    pub fn remaining_uses(&self) -> Option<u32> {
        self.max_uses
            .map(|max| max.saturating_sub(self.used_count))
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_uses.is_some_and(|max| self.used_count >= max)
    }

    fn redemption(&self) -> Redemption {
        Redemption {
            promo_id: self.id.clone(),
            code: self.code.clone(),
            discount_percent: self.discount_percent,
            used_count: self.used_count,
        }
    }

    /// Counts one use per account. A repeat redemption by the same account is a no-op.
    pub(crate) fn redeem(
        &mut self,
        account_id: &AccountId,
        now: DateTime<Utc>,
    ) -> Result<Outcome<Redemption>, MarketError> {
        if self.redeemed_by.contains(account_id) {
            return Ok(Outcome::Unchanged(self.redemption()));
        }
        if !self.is_active {
            return Err(MarketError::illegal("promo", "inactive", "redeem"));
        }
        if self.valid_until.is_some_and(|until| now > until) {
            return Err(MarketError::illegal("promo", "expired", "redeem"));
        }
        if self.is_exhausted() {
            return Err(MarketError::illegal("promo", "exhausted", "redeem"));
        }

        self.used_count += 1;
        self.redeemed_by.insert(account_id.clone());
        Ok(Outcome::Created(self.redemption()))
    }

    pub(crate) fn deactivate(&mut self) -> Result<(), MarketError> {
        if !self.is_active {
            return Err(MarketError::illegal("promo", "inactive", "deactivate"));
        }
        self.is_active = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn promo(max_uses: Option<u32>) -> Promo {
        Promo::publish(
            AccountId::from("acc-supplier"),
            NewPromo {
                code: "shine10".to_string(),
                title: "10% off polish".to_string(),
                discount_percent: 10,
                max_uses,
                valid_until: None,
            },
            Utc::now(),
        )
        .expect("promo publishes")
    }

    #[test]
    fn exhausted_promo_rejects_without_increment() {
        let mut promo = promo(Some(2));
        promo
            .redeem(&AccountId::from("acc-a"), Utc::now())
            .expect("first");
        promo
            .redeem(&AccountId::from("acc-b"), Utc::now())
            .expect("second");

        let err = promo
            .redeem(&AccountId::from("acc-c"), Utc::now())
            .expect_err("exhausted");
        assert!(matches!(
            err,
            MarketError::IllegalTransition {
                from: "exhausted",
                ..
            }
        ));
        assert_eq!(promo.used_count, 2);
        assert_eq!(promo.remaining_uses(), Some(0));
    }

    #[test]
    fn repeat_redemption_by_same_account_is_a_noop() {
        let mut promo = promo(None);
        let account = AccountId::from("acc-a");
        assert!(promo.redeem(&account, Utc::now()).expect("first").is_created());
        assert!(!promo.redeem(&account, Utc::now()).expect("repeat").is_created());
        assert_eq!(promo.used_count, 1);
    }

    #[test]
    fn expired_and_inactive_promos_refuse() {
        let now = Utc::now();
        let mut promo = promo(None);
        promo.valid_until = Some(now - Duration::hours(1));
        assert!(promo.redeem(&AccountId::from("acc-a"), now).is_err());

        promo.valid_until = None;
        promo.deactivate().expect("deactivated");
        assert!(promo.redeem(&AccountId::from("acc-a"), now).is_err());
        assert_eq!(promo.used_count, 0);
    }

    #[test]
    fn publish_normalizes_code_and_checks_discount() {
        assert_eq!(promo(None).code, "SHINE10");
        let err = Promo::publish(
            AccountId::from("acc-supplier"),
            NewPromo {
                code: "BIG".to_string(),
                title: String::new(),
                discount_percent: 120,
                max_uses: None,
                valid_until: None,
            },
            Utc::now(),
        )
        .expect_err("discount too large");
        assert!(matches!(err, MarketError::Validation(_)));
    }
}

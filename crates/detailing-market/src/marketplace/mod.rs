//! Role-based detailing marketplace: listings, their responses, and the plan caps that gate
//! creation.
//!
//! Commands go through [`MarketplaceService`], which owns the state-machine transitions and
//! commits each one atomically per listing. Queries read committed state only.

pub mod accounts;
pub mod clock;
pub mod dashboard;
pub mod domain;
pub mod entitlement;
pub mod error;
pub mod gig;
pub mod lifecycle;
pub mod memory;
pub mod order;
pub mod promo;
pub mod purchase;
pub mod repository;
pub mod review;
pub mod router;
pub mod service;
pub mod sweeper;
pub mod training;
pub mod vacancy;

#[cfg(test)]
mod tests;

pub use accounts::{
    Account, Favorite, FavoriteKind, NewAccount, NewPortfolioItem, PortfolioItem, Profile,
    SubAccount,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dashboard::{Dashboard, DashboardView};
pub use domain::{
    AccountId, ActorContext, ApplicationId, EnrollmentId, GigId, GigResponseId, OrderId,
    OrderResponseId, Outcome, Plan, PortfolioItemId, PromoId, PurchaseId, ResourceKind, ReviewId,
    Role, SubAccountId, SubAccountRole, VacancyId,
};
pub use entitlement::{allowance, Allowance, EntitlementUsage};
pub use error::MarketError;
pub use gig::{Gig, GigResponse, GigStatus, NewGig};
pub use lifecycle::{Listing, ListingQuery, ListingRef, ResponseLifecycle, ResponseRecord};
pub use memory::{InMemoryMarketStore, InMemoryRepository, RecordingNotifier};
pub use order::{
    AcceptedBid, CarDetails, NewOrder, Order, OrderResponse, OrderResponseStatus, OrderStatus,
};
pub use promo::{NewPromo, Promo, Redemption};
pub use purchase::{CollectivePurchase, NewPurchase, PurchaseParticipant, PurchaseStatus};
pub use repository::{
    Entity, MarketNotice, MarketStore, Notifier, NotifyError, Repository, RepositoryError,
};
pub use review::{NewReview, Reputation, Review, ReviewTarget};
pub use router::market_router;
pub use service::{MarketplaceService, SweepSummary};
pub use sweeper::run_purchase_sweeper;
pub use training::{certificate_number, TrainingEnrollment};
pub use vacancy::{
    Application, ApplicationDecision, ApplicationStatus, NewVacancy, Vacancy, VacancyStatus,
};

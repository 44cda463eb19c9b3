//! Marketplace core connecting detailing employers, specialists, clients, and suppliers.
//!
//! Listings (vacancies, gigs, client orders, collective purchases) are created by one role and
//! answered by others. Every mutation runs through the state machines in [`marketplace`] and
//! is committed with a compare-and-set write so concurrent commands on the same listing
//! cannot both succeed.

pub mod config;
pub mod error;
pub mod marketplace;
pub mod telemetry;

//! # API Route Modules
//!
//! - `passport`: issuance, verification with audit sampling, revocation.
//! - `providers`: resolved issuer directory.
//! - `ledger`: chain integrity report.

pub mod ledger;
pub mod passport;
pub mod providers;

//! Attribution Ledger
//!
//! Attribution records are the engine's only durable state. A record is
//! created as a reservation before dispatch and is then either marked sent
//! or removed.

pub mod errors;
pub mod ledger;
pub mod records;
mod repository;
pub mod service;

pub use errors::AttributionServiceError;
pub use ledger::*;
pub use service::*;

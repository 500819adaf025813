//! Appointment History

pub mod errors;
pub mod records;
mod repository;
pub mod service;

pub use errors::AppointmentsServiceError;
pub use service::*;

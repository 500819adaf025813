//! Notification Preferences

pub mod errors;
pub mod records;
mod repository;
pub mod service;

pub use errors::PreferencesServiceError;
pub use service::*;

//! Notifications

pub mod copy;
pub mod data;
pub mod dispatcher;
pub mod errors;
pub mod push;
pub mod records;
mod repository;
pub mod service;

pub use dispatcher::{DispatchOutcome, NotificationDispatcher};
pub use errors::NotificationsServiceError;
pub use service::*;

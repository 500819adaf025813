//! Smart Promotion Domain Concerns

pub mod appointments;
pub mod attribution;
pub mod businesses;
pub mod catalog;
pub mod eligibility;
pub mod habits;
pub mod notifications;
pub mod preferences;
pub mod promotions;
pub mod slots;

//! Notification Data

use crate::domain::{appointments::records::AccountUuid, businesses::records::BusinessUuid};

/// New in-app notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub account: AccountUuid,

    pub business: BusinessUuid,

    /// Notification type, e.g. `smart_promo_offer`.
    pub kind: String,

    pub title: String,

    pub message: String,

    /// Kind of entity the notification refers to.
    pub reference_type: String,

    pub metadata: serde_json::Value,
}

//! Preference Records

use jiff::Timestamp;

use crate::domain::appointments::records::AccountUuid;

/// An account's smart promotion preference at one business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationPreferenceRecord {
    pub account: AccountUuid,

    pub enabled: bool,

    pub paused_until: Option<Timestamp>,
}

impl NotificationPreferenceRecord {
    /// Whether the account accepts smart promotions at `now`.
    pub fn allows(&self, now: Timestamp) -> bool {
        self.enabled && self.paused_until.is_none_or(|until| until <= now)
    }
}

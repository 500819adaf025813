//! Eligibility Gates

use jiff::Timestamp;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::domain::{
    appointments::records::AccountUuid, preferences::records::NotificationPreferenceRecord,
};

/// Why an account may not be notified this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    /// A promotion was sent within the cooldown window.
    Cooldown,

    /// Disabled or paused by the account.
    OptedOut,
}

/// Cooldown and preference gates for one business and run.
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    now: Timestamp,
    cooling_down: FxHashSet<AccountUuid>,
    preferences: FxHashMap<AccountUuid, NotificationPreferenceRecord>,
}

impl EligibilityFilter {
    pub fn new(
        now: Timestamp,
        cooling_down: impl IntoIterator<Item = AccountUuid>,
        preferences: impl IntoIterator<Item = NotificationPreferenceRecord>,
    ) -> Self {
        Self {
            now,
            cooling_down: cooling_down.into_iter().collect(),
            preferences: preferences
                .into_iter()
                .map(|preference| (preference.account, preference))
                .collect(),
        }
    }

    /// Cooldown first, then preferences. No preference row means enabled.
    pub fn check(&self, account: AccountUuid) -> Result<(), Ineligibility> {
        if self.cooling_down.contains(&account) {
            return Err(Ineligibility::Cooldown);
        }

        match self.preferences.get(&account) {
            Some(preference) if !preference.allows(self.now) => Err(Ineligibility::OptedOut),
            _ => Ok(()),
        }
    }
}

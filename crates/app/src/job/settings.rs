//! Engine settings.

use jiff::{SignedDuration, tz::TimeZone};

use crate::domain::businesses::records::BusinessUuid;

const HOURS_PER_DAY: i64 = 24;

/// Tunables of a smart promotions run.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// How far back history is mined.
    pub history_lookback: SignedDuration,

    /// Maximum history rows read per business; older rows beyond it are
    /// not mined.
    pub history_row_cap: u32,

    /// How far ahead a habit may be projected.
    pub slot_window: SignedDuration,

    /// Minimum time between two sends to one account at one business.
    pub cooldown: SignedDuration,

    /// Lifetime of an attribution token.
    pub attribution_ttl: SignedDuration,

    /// Minimum samples in the dominant bucket for a habit.
    pub min_support: u32,

    pub max_businesses: u32,

    /// Prefix of booking links, e.g. `/book`.
    pub booking_path_prefix: String,

    /// Zone used for businesses without one.
    pub default_time_zone: TimeZone,

    /// Restrict the run to a single business.
    pub only_business: Option<BusinessUuid>,
}

impl EngineSettings {
    pub fn days(days: u32) -> SignedDuration {
        SignedDuration::from_hours(i64::from(days) * HOURS_PER_DAY)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            history_lookback: Self::days(12 * 7),
            history_row_cap: 5_000,
            slot_window: SignedDuration::from_hours(28),
            cooldown: Self::days(7),
            attribution_ttl: Self::days(7),
            min_support: 3,
            max_businesses: 200,
            booking_path_prefix: "/book".to_string(),
            default_time_zone: TimeZone::UTC,
            only_business: None,
        }
    }
}

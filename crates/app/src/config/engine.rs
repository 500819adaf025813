//! Engine Config

use clap::Args;
use jiff::{SignedDuration, tz::TimeZone};

use crate::{domain::businesses::records::BusinessUuid, job::EngineSettings};

const DAYS_PER_WEEK: u32 = 7;

fn parse_time_zone(name: &str) -> Result<TimeZone, jiff::Error> {
    TimeZone::get(name)
}

/// Smart promotion tunables.
#[derive(Debug, Args)]
pub struct EngineConfig {
    /// Weeks of completed history mined per business
    #[arg(long, env = "SMART_PROMOS_HISTORY_WEEKS", default_value_t = 12)]
    pub history_weeks: u32,

    /// Maximum history rows read per business
    #[arg(long, env = "SMART_PROMOS_HISTORY_ROW_CAP", default_value_t = 5_000)]
    pub history_row_cap: u32,

    /// Hours ahead a habit may be projected
    #[arg(long, env = "SMART_PROMOS_WINDOW_HOURS", default_value_t = 28)]
    pub window_hours: u32,

    /// Days between two promotions to one account
    #[arg(long, env = "SMART_PROMOS_COOLDOWN_DAYS", default_value_t = 7)]
    pub cooldown_days: u32,

    /// Days an attribution token stays valid
    #[arg(long, env = "SMART_PROMOS_ATTRIBUTION_TTL_DAYS", default_value_t = 7)]
    pub attribution_ttl_days: u32,

    /// Samples the dominant bucket needs to count as a habit
    #[arg(long, env = "SMART_PROMOS_MIN_SUPPORT", default_value_t = 3)]
    pub min_support: u32,

    /// Maximum businesses visited per run
    #[arg(long, env = "SMART_PROMOS_MAX_BUSINESSES", default_value_t = 200)]
    pub max_businesses: u32,

    /// Prefix of booking deep links
    #[arg(long, env = "SMART_PROMOS_BOOKING_PATH_PREFIX", default_value = "/book")]
    pub booking_path_prefix: String,

    /// IANA time zone for businesses without one
    #[arg(
        long,
        env = "SMART_PROMOS_DEFAULT_TIMEZONE",
        default_value = "UTC",
        value_parser = parse_time_zone
    )]
    pub default_timezone: TimeZone,
}

impl EngineConfig {
    pub fn settings(&self, only_business: Option<BusinessUuid>) -> EngineSettings {
        EngineSettings {
            history_lookback: EngineSettings::days(
                self.history_weeks.saturating_mul(DAYS_PER_WEEK),
            ),
            history_row_cap: self.history_row_cap,
            slot_window: SignedDuration::from_hours(i64::from(self.window_hours)),
            cooldown: EngineSettings::days(self.cooldown_days),
            attribution_ttl: EngineSettings::days(self.attribution_ttl_days),
            min_support: self.min_support,
            max_businesses: self.max_businesses,
            booking_path_prefix: self.booking_path_prefix.clone(),
            default_time_zone: self.default_timezone.clone(),
            only_business,
        }
    }
}

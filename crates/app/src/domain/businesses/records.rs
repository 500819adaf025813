//! Business Records

use jiff::tz::TimeZone;

use crate::{domain::promotions::PromoRule, uuids::TypedUuid};

/// Business UUID
pub type BusinessUuid = TypedUuid<BusinessRecord>;

/// A business taking part in smart promotions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessRecord {
    pub id: BusinessUuid,

    /// Public booking slug.
    pub slug: String,

    /// IANA time zone name, if the business has one configured.
    pub timezone: Option<String>,

    /// Valid rules, in stored order.
    pub rules: Vec<PromoRule>,
}

impl BusinessRecord {
    /// Resolve the business time zone, falling back to `default` when unset.
    pub fn time_zone(&self, default: &TimeZone) -> Result<TimeZone, jiff::Error> {
        match self.timezone.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => TimeZone::get(name),
            _ => Ok(default.clone()),
        }
    }

    /// Rules the evaluator may consider.
    pub fn enabled_rules(&self) -> Vec<PromoRule> {
        self.rules.iter().filter(|rule| rule.enabled).cloned().collect()
    }
}

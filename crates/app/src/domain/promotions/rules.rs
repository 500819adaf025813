//! Promo Rules
//!
//! Businesses store their promotional windows as a JSON array. Each element
//! is checked here, once, and only well formed rules reach the evaluator.

use std::str::FromStr;

use jiff::civil::Weekday;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::Deserialize;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::warn;

use crate::{domain::catalog::records::ServiceUuid, uuids::TypedUuid};

/// Maximum number of rules a business may configure.
pub const MAX_RULES: usize = 20;

const MAX_LABEL_CHARS: usize = 60;

/// Rule UUID, present only when the stored rule id is a UUID.
pub type PromoRuleUuid = TypedUuid<PromoRule>;

/// Validated promo rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoRule {
    /// Opaque identifier, unique within the business.
    pub id: String,

    /// Display label.
    pub label: String,

    pub enabled: bool,

    /// Lower values win.
    pub priority: u32,

    /// Business-local weekdays the rule covers.
    pub days: SmallVec<[Weekday; 7]>,

    /// First local hour covered (inclusive).
    pub start_hour: i8,

    /// Local hour the rule stops covering (exclusive).
    pub end_hour: i8,

    pub discount: Discount,

    /// Services the rule applies to; empty means any service.
    pub service_ids: Vec<ServiceUuid>,
}

impl PromoRule {
    /// Identifier suitable for recording against an attribution.
    pub fn uuid(&self) -> Option<PromoRuleUuid> {
        PromoRuleUuid::parse(&self.id)
    }

    pub fn covers_day(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }

    pub fn covers_hour(&self, hour: i8) -> bool {
        hour >= self.start_hour && hour < self.end_hour
    }

    /// `None` is the unspecified service, which only generic rules accept.
    pub fn covers_service(&self, service: Option<ServiceUuid>) -> bool {
        self.service_ids.is_empty()
            || service.is_some_and(|service| self.service_ids.contains(&service))
    }
}

/// Discount applied by a rule. Values may be fractional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discount {
    /// Percentage off, 1 to 100.
    Percent(Decimal),

    /// Fixed amount off, in minor units.
    Fixed(Decimal),
}

impl Discount {
    /// Price after the discount, rounded half up to whole minor units and
    /// never below zero.
    pub fn apply(self, price: u64) -> u64 {
        let price = Decimal::from(price);

        let discounted = match self {
            Self::Percent(percent) => {
                let remaining = (Decimal::ONE_HUNDRED - percent.min(Decimal::ONE_HUNDRED))
                    .max(Decimal::ZERO);

                price * remaining / Decimal::ONE_HUNDRED
            }
            Self::Fixed(amount) => price - amount.min(price),
        };

        discounted
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u64()
            .unwrap_or(0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromoRuleError {
    #[error("rule is not a valid object: {0}")]
    Malformed(String),

    #[error("rule id is required")]
    MissingId,

    #[error("duplicate rule id")]
    DuplicateId,

    #[error("label must be 1-{MAX_LABEL_CHARS} characters")]
    InvalidLabel,

    #[error("start hour must be 0-23")]
    InvalidStartHour,

    #[error("end hour must be 1-24")]
    InvalidEndHour,

    #[error("start hour must be before end hour")]
    EmptyWindow,

    #[error("at least one day is required")]
    NoDays,

    #[error("days must be 0-6")]
    InvalidDay,

    #[error("discount value `{0}` is not a decimal number")]
    InvalidDiscountValue(String),

    #[error("percentage must be 1-100")]
    InvalidPercent,

    #[error("fixed amount cannot be negative")]
    NegativeAmount,

    #[error("unknown discount type `{0}`")]
    UnknownDiscountType(String),

    #[error("priority must be >= 0")]
    NegativePriority,

    #[error("service id `{0}` is not a valid UUID")]
    InvalidServiceId(String),
}

/// Stored shape of a rule, before validation.
#[derive(Debug, Deserialize)]
struct StoredPromoRule {
    #[serde(default)]
    id: String,

    #[serde(default)]
    label: String,

    #[serde(default)]
    enabled: bool,

    #[serde(default)]
    priority: i64,

    #[serde(default)]
    days: Vec<i64>,

    start_hour: i64,

    end_hour: i64,

    discount_type: String,

    discount_value: serde_json::Number,

    #[serde(default)]
    service_ids: Vec<String>,
}

impl TryFrom<StoredPromoRule> for PromoRule {
    type Error = PromoRuleError;

    fn try_from(stored: StoredPromoRule) -> Result<Self, Self::Error> {
        if stored.id.trim().is_empty() {
            return Err(PromoRuleError::MissingId);
        }

        let label_chars = stored.label.chars().count();

        if stored.label.trim().is_empty() || label_chars > MAX_LABEL_CHARS {
            return Err(PromoRuleError::InvalidLabel);
        }

        let start_hour = i8::try_from(stored.start_hour)
            .ok()
            .filter(|hour| (0..=23).contains(hour))
            .ok_or(PromoRuleError::InvalidStartHour)?;

        let end_hour = i8::try_from(stored.end_hour)
            .ok()
            .filter(|hour| (1..=24).contains(hour))
            .ok_or(PromoRuleError::InvalidEndHour)?;

        if start_hour >= end_hour {
            return Err(PromoRuleError::EmptyWindow);
        }

        if stored.days.is_empty() {
            return Err(PromoRuleError::NoDays);
        }

        let mut days: SmallVec<[Weekday; 7]> = SmallVec::new();

        for day in stored.days {
            let day = i8::try_from(day)
                .ok()
                .and_then(|day| Weekday::from_sunday_zero_offset(day).ok())
                .ok_or(PromoRuleError::InvalidDay)?;

            if !days.contains(&day) {
                days.push(day);
            }
        }

        let value = parse_decimal(&stored.discount_value)?;

        let discount = match stored.discount_type.as_str() {
            "percent" if (Decimal::ONE..=Decimal::ONE_HUNDRED).contains(&value) => {
                Discount::Percent(value)
            }
            "percent" => return Err(PromoRuleError::InvalidPercent),
            "fixed" if value >= Decimal::ZERO => Discount::Fixed(value),
            "fixed" => return Err(PromoRuleError::NegativeAmount),
            other => return Err(PromoRuleError::UnknownDiscountType(other.to_string())),
        };

        let priority = u32::try_from(stored.priority)
            .ok()
            .ok_or(PromoRuleError::NegativePriority)?;

        let service_ids = stored
            .service_ids
            .into_iter()
            .map(|id| ServiceUuid::parse(&id).ok_or(PromoRuleError::InvalidServiceId(id)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: stored.id,
            label: stored.label,
            enabled: stored.enabled,
            priority,
            days,
            start_hour,
            end_hour,
            discount,
            service_ids,
        })
    }
}

fn parse_decimal(number: &serde_json::Number) -> Result<Decimal, PromoRuleError> {
    let text = number.to_string();

    match Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)) {
        Ok(value) => Ok(value.normalize()),
        Err(_) => Err(PromoRuleError::InvalidDiscountValue(text)),
    }
}

/// Parse one stored rule.
pub fn parse_rule(value: serde_json::Value) -> Result<PromoRule, PromoRuleError> {
    let stored: StoredPromoRule = serde_json::from_value(value)
        .map_err(|error| PromoRuleError::Malformed(error.to_string()))?;

    PromoRule::try_from(stored)
}

/// Parse a business's stored rule array, dropping invalid entries.
///
/// Anything that is not an array yields no rules. Only the first
/// [`MAX_RULES`] entries are considered, and a repeated id keeps its first
/// occurrence.
pub fn parse_rules(value: &serde_json::Value) -> Vec<PromoRule> {
    let Some(entries) = value.as_array() else {
        if !value.is_null() {
            warn!("promo rules are not an array, ignoring");
        }

        return Vec::new();
    };

    if entries.len() > MAX_RULES {
        warn!(
            count = entries.len(),
            limit = MAX_RULES,
            "too many promo rules, ignoring the excess"
        );
    }

    let mut rules: Vec<PromoRule> = Vec::with_capacity(entries.len().min(MAX_RULES));

    for (index, entry) in entries.iter().take(MAX_RULES).enumerate() {
        let parsed = parse_rule(entry.clone()).and_then(|rule| {
            if rules.iter().any(|existing| existing.id == rule.id) {
                Err(PromoRuleError::DuplicateId)
            } else {
                Ok(rule)
            }
        });

        match parsed {
            Ok(rule) => rules.push(rule),
            Err(error) => warn!(index, %error, "dropping invalid promo rule"),
        }
    }

    rules
}

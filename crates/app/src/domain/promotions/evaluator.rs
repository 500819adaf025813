//! Promo Evaluation

use jiff::{Timestamp, tz::TimeZone};
use mockall::automock;

use crate::domain::{catalog::records::ServiceUuid, promotions::rules::PromoRule};

/// Why an evaluation did or did not apply a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationReason {
    NoRules,
    RuleDisabled,
    RuleMatched,
    NoMatchingRule,
}

/// Outcome of evaluating a business's rules against one candidate slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoEvaluation {
    /// The rule that applies, if any.
    pub rule: Option<PromoRule>,

    pub original_price: u64,

    pub final_price: u64,

    pub discount_amount: u64,

    pub reason: EvaluationReason,
}

impl PromoEvaluation {
    fn unapplied(price: u64, reason: EvaluationReason) -> Self {
        Self {
            rule: None,
            original_price: price,
            final_price: price,
            discount_amount: 0,
            reason,
        }
    }

    pub fn applied(&self) -> bool {
        self.rule.is_some()
    }
}

/// Decides whether a promo rule applies to a candidate slot.
///
/// Implementations must be pure: the engine evaluates speculatively and
/// takes no compensating action when nothing matches.
#[automock]
pub trait PromoEvaluator: Send + Sync {
    /// `service` is `None` when unspecified and `price` is 0 when unknown.
    fn evaluate(
        &self,
        rules: &[PromoRule],
        slot: Timestamp,
        service: Option<ServiceUuid>,
        price: u64,
        time_zone: &TimeZone,
    ) -> PromoEvaluation;
}

/// Matches rules by business-local weekday, hour window and service.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleWindowEvaluator;

impl PromoEvaluator for RuleWindowEvaluator {
    fn evaluate(
        &self,
        rules: &[PromoRule],
        slot: Timestamp,
        service: Option<ServiceUuid>,
        price: u64,
        time_zone: &TimeZone,
    ) -> PromoEvaluation {
        if rules.is_empty() {
            return PromoEvaluation::unapplied(price, EvaluationReason::NoRules);
        }

        let mut active: Vec<&PromoRule> = rules.iter().filter(|rule| rule.enabled).collect();

        if active.is_empty() {
            return PromoEvaluation::unapplied(price, EvaluationReason::RuleDisabled);
        }

        active.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));

        let local = time_zone.to_datetime(slot);

        let matched = active.into_iter().find(|rule| {
            rule.covers_day(local.weekday())
                && rule.covers_hour(local.hour())
                && rule.covers_service(service)
        });

        let Some(rule) = matched else {
            return PromoEvaluation::unapplied(price, EvaluationReason::NoMatchingRule);
        };

        let final_price = rule.discount.apply(price);

        PromoEvaluation {
            rule: Some(rule.clone()),
            original_price: price,
            final_price,
            discount_amount: price - final_price,
            reason: EvaluationReason::RuleMatched,
        }
    }
}

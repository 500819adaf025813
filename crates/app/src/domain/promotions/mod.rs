//! Promotions

pub mod evaluator;
pub mod rules;

pub use evaluator::*;
pub use rules::{Discount, PromoRule, PromoRuleError, PromoRuleUuid, parse_rules};

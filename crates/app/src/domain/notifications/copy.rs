//! Smart promotion notification content.

use rust_decimal::Decimal;
use serde_json::json;

use crate::domain::{
    appointments::records::AccountUuid,
    attribution::records::AttributionToken,
    businesses::records::{BusinessRecord, BusinessUuid},
    notifications::{data::NewNotification, push::PushMessage},
    promotions::{Discount, PromoRule, PromoRuleUuid},
};

pub const TITLE: &str = "A deal at your usual time";

pub const NOTIFICATION_KIND: &str = "smart_promo_offer";

pub const REFERENCE_TYPE: &str = "smart_promo";

/// Inputs to a promotion message.
#[derive(Debug, Clone, Copy)]
pub struct PromoOffer<'a> {
    pub business: &'a BusinessRecord,
    pub account: AccountUuid,
    pub rule: &'a PromoRule,

    /// Habitual service name, when the service is active in the catalog.
    pub service_name: Option<&'a str>,

    pub token: AttributionToken,
}

/// A promotion ready to send on both channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoMessage {
    pub account: AccountUuid,
    pub business: BusinessUuid,
    pub title: String,
    pub body: String,
    pub url: String,
    pub tag: String,
    pub token: AttributionToken,

    /// Rule recorded against the attribution; `None` for non-UUID rule ids.
    pub promo_rule: Option<PromoRuleUuid>,
}

impl PromoMessage {
    pub fn compose(offer: PromoOffer<'_>, booking_path_prefix: &str) -> Self {
        let business = offer.business;

        let url = format!(
            "{}/{}?sn={}",
            booking_path_prefix.trim_end_matches('/'),
            business.slug,
            offer.token
        );

        let body = match offer.service_name {
            Some(name) => format!(
                "{} off {name}. Book before it ends.",
                describe(offer.rule.discount)
            ),
            None => format!("{} off. Book before it ends.", describe(offer.rule.discount)),
        };

        Self {
            account: offer.account,
            business: business.id,
            title: TITLE.to_string(),
            body,
            url,
            tag: format!("smart-promo-{}-{}", business.id, offer.account),
            token: offer.token,
            promo_rule: offer.rule.uuid(),
        }
    }

    pub fn push(&self) -> PushMessage {
        PushMessage {
            title: self.title.clone(),
            body: self.body.clone(),
            url: self.url.clone(),
            tag: self.tag.clone(),
        }
    }

    pub fn in_app(&self) -> NewNotification {
        NewNotification {
            account: self.account,
            business: self.business,
            kind: NOTIFICATION_KIND.to_string(),
            title: self.title.clone(),
            message: self.body.clone(),
            reference_type: REFERENCE_TYPE.to_string(),
            metadata: json!({
                "url": self.url,
                "token": self.token.to_string(),
                "promo_rule_id": self.promo_rule.map(|id| id.to_string()),
            }),
        }
    }
}

fn describe(discount: Discount) -> String {
    match discount {
        Discount::Percent(percent) => format!("{}%", percent.normalize()),
        Discount::Fixed(amount) => describe_amount(amount),
    }
}

fn describe_amount(amount: Decimal) -> String {
    let text = amount.normalize().to_string();

    match text.split_once('.') {
        Some((whole, fraction)) => format!("{}.{fraction}", group_thousands(whole)),
        None => group_thousands(&text),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }

        grouped.push(digit);
    }

    grouped
}

//! Attribution Records

use std::fmt::{Display, Formatter, Result as FmtResult};

use jiff::Timestamp;
use uuid::Uuid;

use crate::{
    domain::{
        appointments::records::{AccountUuid, ClientUuid},
        businesses::records::BusinessUuid,
        habits::HabitBucketKey,
        notifications::records::NotificationUuid,
        promotions::PromoRuleUuid,
    },
    uuids::TypedUuid,
};

/// Attribution UUID, internal only.
pub type AttributionUuid = TypedUuid<AttributionRecord>;

/// Single-use correlation token, the only attribution identifier placed in
/// outbound links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributionToken(Uuid);

impl AttributionToken {
    /// Random token, unrelated to the record id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub const fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Display for AttributionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

/// Reservation to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttribution {
    pub id: AttributionUuid,
    pub token: AttributionToken,
    pub business: BusinessUuid,
    pub client: ClientUuid,
    pub account: AccountUuid,
    pub bucket: HabitBucketKey,
    pub promo_rule: Option<PromoRuleUuid>,
    pub expires_at: Timestamp,
}

/// Stored attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributionRecord {
    pub id: AttributionUuid,

    pub token: AttributionToken,

    pub business: BusinessUuid,

    pub client: ClientUuid,

    pub account: AccountUuid,

    /// Habit bucket that produced the notification.
    pub bucket: HabitBucketKey,

    pub promo_rule: Option<PromoRuleUuid>,

    /// Set once a channel delivered; `None` while reserved.
    pub sent_at: Option<Timestamp>,

    pub notification: Option<NotificationUuid>,

    pub expires_at: Timestamp,
}

impl AttributionRecord {
    /// Record as it exists right after a reservation.
    pub fn reserved(attribution: NewAttribution) -> Self {
        Self {
            id: attribution.id,
            token: attribution.token,
            business: attribution.business,
            client: attribution.client,
            account: attribution.account,
            bucket: attribution.bucket,
            promo_rule: attribution.promo_rule,
            sent_at: None,
            notification: None,
            expires_at: attribution.expires_at,
        }
    }

    /// Whether the record holds the account in cooldown for sends after `since`.
    pub fn sent_after(&self, since: Timestamp) -> bool {
        self.sent_at.is_some_and(|sent_at| sent_at > since)
    }
}

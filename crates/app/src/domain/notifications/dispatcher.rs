//! Two-channel dispatch.

use std::sync::Arc;

use tracing::{Instrument, info_span, warn};

use crate::domain::notifications::{
    NotificationsService, copy::PromoMessage, push::PushSender, records::NotificationUuid,
};

/// Per-channel result of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Push reached at least one device.
    pub push_delivered: bool,

    /// Id of the in-app notification, when it was created.
    pub in_app: Option<NotificationUuid>,
}

impl DispatchOutcome {
    /// Either channel succeeded.
    pub fn delivered(&self) -> bool {
        self.push_delivered || self.in_app.is_some()
    }
}

/// Sends push and in-app notifications concurrently.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifications: Arc<dyn NotificationsService>,
    push: Arc<dyn PushSender>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher").finish_non_exhaustive()
    }
}

impl NotificationDispatcher {
    pub fn new(notifications: Arc<dyn NotificationsService>, push: Arc<dyn PushSender>) -> Self {
        Self {
            notifications,
            push,
        }
    }

    /// Channel errors are logged and reduced to the outcome; neither channel
    /// can suppress the other.
    pub async fn dispatch(&self, message: &PromoMessage) -> DispatchOutcome {
        let push_message = message.push();

        let push = async {
            match self.push.send(message.account, &push_message).await {
                Ok(report) => {
                    if !report.delivered() {
                        warn!(failed = report.failed, "push reached no devices");
                    }

                    report.delivered()
                }
                Err(error) => {
                    warn!(%error, "push channel failed");
                    false
                }
            }
        }
        .instrument(info_span!("dispatch.push"));

        let in_app = async {
            match self
                .notifications
                .create_notification(message.in_app())
                .await
            {
                Ok(id) => Some(id),
                Err(error) => {
                    warn!(%error, "in-app channel failed");
                    None
                }
            }
        }
        .instrument(info_span!("dispatch.in_app"));

        let (push_delivered, in_app) = tokio::join!(push, in_app);

        DispatchOutcome {
            push_delivered,
            in_app,
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::Weekday;
    use rust_decimal::Decimal;
    use smallvec::smallvec;

    use crate::domain::{
        appointments::records::AccountUuid,
        attribution::records::AttributionToken,
        businesses::records::{BusinessRecord, BusinessUuid},
        notifications::{
            MockNotificationsService, NotificationsServiceError,
            copy::PromoOffer,
            push::{MockPushSender, PushError, PushReport},
        },
        promotions::{Discount, PromoRule},
    };

    use super::*;

    fn message() -> PromoMessage {
        let business = BusinessRecord {
            id: BusinessUuid::new(),
            slug: "downtown".to_string(),
            timezone: None,
            rules: Vec::new(),
        };

        let rule = PromoRule {
            id: "rule-1".to_string(),
            label: "Midweek".to_string(),
            enabled: true,
            priority: 0,
            days: smallvec![Weekday::Wednesday],
            start_hour: 9,
            end_hour: 18,
            discount: Discount::Percent(Decimal::from(15)),
            service_ids: Vec::new(),
        };

        PromoMessage::compose(
            PromoOffer {
                business: &business,
                account: AccountUuid::new(),
                rule: &rule,
                service_name: None,
                token: AttributionToken::generate(),
            },
            "/book",
        )
    }

    fn push_reporting(sent: u32) -> MockPushSender {
        let mut push = MockPushSender::new();

        push.expect_send()
            .once()
            .returning(move |_, _| Ok(PushReport { sent, failed: 0 }));

        push
    }

    fn in_app_returning(
        result: fn() -> Result<NotificationUuid, NotificationsServiceError>,
    ) -> MockNotificationsService {
        let mut notifications = MockNotificationsService::new();

        notifications
            .expect_create_notification()
            .once()
            .returning(move |_| result());

        notifications
    }

    #[tokio::test]
    async fn both_channels_succeed() {
        let id = NotificationUuid::new();

        let mut notifications = MockNotificationsService::new();

        notifications
            .expect_create_notification()
            .once()
            .withf(|n| n.kind == "smart_promo_offer")
            .return_once(move |_| Ok(id));

        let dispatcher =
            NotificationDispatcher::new(Arc::new(notifications), Arc::new(push_reporting(2)));

        let outcome = dispatcher.dispatch(&message()).await;

        assert_eq!(
            outcome,
            DispatchOutcome {
                push_delivered: true,
                in_app: Some(id),
            }
        );
        assert!(outcome.delivered());
    }

    #[tokio::test]
    async fn push_only_still_delivers() {
        let dispatcher = NotificationDispatcher::new(
            Arc::new(in_app_returning(|| Err(NotificationsServiceError::InvalidData))),
            Arc::new(push_reporting(1)),
        );

        let outcome = dispatcher.dispatch(&message()).await;

        assert!(outcome.push_delivered);
        assert_eq!(outcome.in_app, None);
        assert!(outcome.delivered());
    }

    #[tokio::test]
    async fn in_app_only_still_delivers() {
        let mut push = MockPushSender::new();

        push.expect_send().once().returning(|_, _| {
            Err(PushError::UnexpectedResponse("gateway down".to_string()))
        });

        let dispatcher = NotificationDispatcher::new(
            Arc::new(in_app_returning(|| Ok(NotificationUuid::new()))),
            Arc::new(push),
        );

        let outcome = dispatcher.dispatch(&message()).await;

        assert!(!outcome.push_delivered);
        assert!(outcome.in_app.is_some());
        assert!(outcome.delivered());
    }

    #[tokio::test]
    async fn zero_devices_and_failed_in_app_is_not_delivered() {
        let dispatcher = NotificationDispatcher::new(
            Arc::new(in_app_returning(|| Err(NotificationsServiceError::InvalidData))),
            Arc::new(push_reporting(0)),
        );

        let outcome = dispatcher.dispatch(&message()).await;

        assert_eq!(outcome, DispatchOutcome::default());
        assert!(!outcome.delivered());
    }
}

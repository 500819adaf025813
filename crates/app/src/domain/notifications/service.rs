//! Notifications service.

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::notifications::{
        data::NewNotification, errors::NotificationsServiceError, records::NotificationUuid,
        repository::PgNotificationsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgNotificationsService {
    repository: PgNotificationsRepository,
}

impl PgNotificationsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            repository: PgNotificationsRepository::new(db.pool().clone()),
        }
    }
}

#[async_trait]
impl NotificationsService for PgNotificationsService {
    #[tracing::instrument(
        name = "notifications.service.create_notification",
        skip(self, notification),
        fields(
            business_id = %notification.business,
            account_id = %notification.account,
            kind = %notification.kind
        ),
        err
    )]
    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<NotificationUuid, NotificationsServiceError> {
        let id = self
            .repository
            .create_notification(NotificationUuid::new(), notification)
            .await?;

        info!(notification_id = %id, "created notification");

        Ok(id)
    }
}

#[automock]
#[async_trait]
/// In-app notification channel.
pub trait NotificationsService: Send + Sync {
    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<NotificationUuid, NotificationsServiceError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        domain::{appointments::records::AccountUuid, businesses::records::BusinessUuid},
        test::{TestContext, fixtures},
    };

    use super::*;

    fn notification(account: AccountUuid, business: BusinessUuid) -> NewNotification {
        NewNotification {
            account,
            business,
            kind: "smart_promo_offer".to_string(),
            title: "A deal at your usual time".to_string(),
            message: "20% off. Book before it ends.".to_string(),
            reference_type: "smart_promo".to_string(),
            metadata: json!({ "url": "/book/downtown?sn=abc" }),
        }
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn create_notification_persists_row() -> TestResult {
        let ctx = TestContext::new().await;

        let business = fixtures::insert_business(&ctx.db, "downtown", None).await?;
        let account = fixtures::insert_account(&ctx.db).await?;

        let id = ctx
            .notifications
            .create_notification(notification(account, business))
            .await?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE id = $1 AND user_id = $2")
                .bind(id.into_uuid())
                .bind(account.into_uuid())
                .fetch_one(ctx.db.pool())
                .await?;

        assert_eq!(count, 1);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn unknown_business_returns_invalid_reference() -> TestResult {
        let ctx = TestContext::new().await;
        let account = fixtures::insert_account(&ctx.db).await?;

        let result = ctx
            .notifications
            .create_notification(notification(account, BusinessUuid::new()))
            .await;

        assert!(
            matches!(result, Err(NotificationsServiceError::InvalidReference)),
            "expected InvalidReference, got {result:?}"
        );

        Ok(())
    }
}

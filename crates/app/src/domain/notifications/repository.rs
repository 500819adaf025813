//! Notifications Repository

use sqlx::{PgPool, Postgres, query_scalar};
use uuid::Uuid;

use crate::domain::notifications::{data::NewNotification, records::NotificationUuid};

const CREATE_NOTIFICATION_SQL: &str = include_str!("sql/create_notification.sql");

#[derive(Debug, Clone)]
pub(crate) struct PgNotificationsRepository {
    pool: PgPool,
}

impl PgNotificationsRepository {
    #[must_use]
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) async fn create_notification(
        &self,
        id: NotificationUuid,
        notification: NewNotification,
    ) -> Result<NotificationUuid, sqlx::Error> {
        let id: Uuid = query_scalar::<Postgres, Uuid>(CREATE_NOTIFICATION_SQL)
            .bind(id.into_uuid())
            .bind(notification.account.into_uuid())
            .bind(notification.business.into_uuid())
            .bind(notification.kind)
            .bind(notification.title)
            .bind(notification.message)
            .bind(notification.reference_type)
            .bind(notification.metadata)
            .fetch_one(&self.pool)
            .await?;

        Ok(NotificationUuid::from_uuid(id))
    }
}

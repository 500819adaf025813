//! Attribution service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::Span;

use crate::{
    database::Db,
    domain::{
        appointments::records::AccountUuid,
        attribution::{
            errors::AttributionServiceError,
            records::{AttributionRecord, AttributionUuid, NewAttribution},
            repository::PgAttributionRepository,
        },
        businesses::records::BusinessUuid,
        notifications::records::NotificationUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgAttributionService {
    repository: PgAttributionRepository,
}

impl PgAttributionService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            repository: PgAttributionRepository::new(db.pool().clone()),
        }
    }
}

#[async_trait]
impl AttributionService for PgAttributionService {
    #[tracing::instrument(
        name = "attribution.service.recently_notified_accounts",
        skip(self, accounts),
        fields(
            business_id = %business,
            account_count = accounts.len(),
            cooling_down = tracing::field::Empty
        ),
        err
    )]
    async fn recently_notified_accounts(
        &self,
        business: BusinessUuid,
        accounts: &[AccountUuid],
        since: Timestamp,
    ) -> Result<Vec<AccountUuid>, AttributionServiceError> {
        if accounts.is_empty() {
            return Ok(Vec::new());
        }

        let cooling_down = self
            .repository
            .recently_notified_accounts(business, accounts, since)
            .await?;

        Span::current().record("cooling_down", tracing::field::display(cooling_down.len()));

        Ok(cooling_down)
    }

    #[tracing::instrument(
        name = "attribution.service.unsettled_reservations",
        skip(self),
        fields(business_id = %business),
        err
    )]
    async fn unsettled_reservations(
        &self,
        business: BusinessUuid,
    ) -> Result<Vec<AttributionRecord>, AttributionServiceError> {
        self.repository
            .unsettled_reservations(business)
            .await
            .map_err(Into::into)
    }

    #[tracing::instrument(
        name = "attribution.service.reserve",
        skip(self, attribution),
        fields(
            business_id = %attribution.business,
            account_id = %attribution.account,
            attribution_id = %attribution.id
        ),
        err
    )]
    async fn reserve(
        &self,
        attribution: NewAttribution,
    ) -> Result<AttributionRecord, AttributionServiceError> {
        self.repository
            .insert_reservation(attribution)
            .await
            .map_err(Into::into)
    }

    #[tracing::instrument(
        name = "attribution.service.mark_sent",
        skip(self),
        fields(business_id = %business, attribution_id = %id),
        err
    )]
    async fn mark_sent(
        &self,
        business: BusinessUuid,
        id: AttributionUuid,
        sent_at: Timestamp,
        notification: Option<NotificationUuid>,
    ) -> Result<(), AttributionServiceError> {
        let updated = self
            .repository
            .mark_sent(business, id, sent_at, notification)
            .await?;

        if updated == 0 {
            return Err(AttributionServiceError::NotFound);
        }

        Ok(())
    }

    #[tracing::instrument(
        name = "attribution.service.release",
        skip(self),
        fields(business_id = %business, attribution_id = %id),
        err
    )]
    async fn release(
        &self,
        business: BusinessUuid,
        id: AttributionUuid,
    ) -> Result<(), AttributionServiceError> {
        let deleted = self.repository.delete_reservation(business, id).await?;

        if deleted == 0 {
            return Err(AttributionServiceError::NotFound);
        }

        Ok(())
    }
}

#[automock]
#[async_trait]
/// Persistence of attribution records.
pub trait AttributionService: Send + Sync {
    /// Accounts among `accounts` with an attribution sent strictly after `since`.
    async fn recently_notified_accounts(
        &self,
        business: BusinessUuid,
        accounts: &[AccountUuid],
        since: Timestamp,
    ) -> Result<Vec<AccountUuid>, AttributionServiceError>;

    /// Reservations of `business` that were never marked sent or deleted.
    async fn unsettled_reservations(
        &self,
        business: BusinessUuid,
    ) -> Result<Vec<AttributionRecord>, AttributionServiceError>;

    /// Insert a reservation with no `sent_at`.
    async fn reserve(
        &self,
        attribution: NewAttribution,
    ) -> Result<AttributionRecord, AttributionServiceError>;

    /// Promote a reservation to sent. Fails with `NotFound` unless the record
    /// exists and is still reserved.
    async fn mark_sent(
        &self,
        business: BusinessUuid,
        id: AttributionUuid,
        sent_at: Timestamp,
        notification: Option<NotificationUuid>,
    ) -> Result<(), AttributionServiceError>;

    /// Delete a reservation. Fails with `NotFound` unless the record exists and
    /// is still reserved.
    async fn release(
        &self,
        business: BusinessUuid,
        id: AttributionUuid,
    ) -> Result<(), AttributionServiceError>;
}

//! Catalog service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        businesses::records::BusinessUuid,
        catalog::{
            errors::CatalogServiceError, records::ServiceRecord, repository::PgServicesRepository,
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgCatalogService {
    repository: PgServicesRepository,
}

impl PgCatalogService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            repository: PgServicesRepository::new(db.pool().clone()),
        }
    }
}

#[async_trait]
impl CatalogService for PgCatalogService {
    #[tracing::instrument(
        name = "catalog.service.list_services",
        skip(self),
        fields(business_id = %business),
        err
    )]
    async fn list_services(
        &self,
        business: BusinessUuid,
    ) -> Result<Vec<ServiceRecord>, CatalogServiceError> {
        self.repository
            .list_services(business)
            .await
            .map_err(Into::into)
    }
}

#[automock]
#[async_trait]
/// Read access to a business's service catalog.
pub trait CatalogService: Send + Sync {
    /// Every service of the business, active or not.
    async fn list_services(
        &self,
        business: BusinessUuid,
    ) -> Result<Vec<ServiceRecord>, CatalogServiceError>;
}

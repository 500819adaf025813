//! Preferences service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        appointments::records::AccountUuid,
        businesses::records::BusinessUuid,
        preferences::{
            errors::PreferencesServiceError, records::NotificationPreferenceRecord,
            repository::PgPreferencesRepository,
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgPreferencesService {
    repository: PgPreferencesRepository,
}

impl PgPreferencesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            repository: PgPreferencesRepository::new(db.pool().clone()),
        }
    }
}

#[async_trait]
impl PreferencesService for PgPreferencesService {
    #[tracing::instrument(
        name = "preferences.service.load_preferences",
        skip(self, accounts),
        fields(business_id = %business, account_count = accounts.len()),
        err
    )]
    async fn load_preferences(
        &self,
        business: BusinessUuid,
        accounts: &[AccountUuid],
    ) -> Result<Vec<NotificationPreferenceRecord>, PreferencesServiceError> {
        if accounts.is_empty() {
            return Ok(Vec::new());
        }

        self.repository
            .load_preferences(business, accounts)
            .await
            .map_err(Into::into)
    }
}

#[automock]
#[async_trait]
/// Read access to smart promotion preferences.
pub trait PreferencesService: Send + Sync {
    /// Stored preferences of the given accounts; accounts without a row are
    /// omitted.
    async fn load_preferences(
        &self,
        business: BusinessUuid,
        accounts: &[AccountUuid],
    ) -> Result<Vec<NotificationPreferenceRecord>, PreferencesServiceError>;
}

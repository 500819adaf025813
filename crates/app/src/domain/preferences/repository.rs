//! Preferences Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, PgPool, Postgres, Row, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::domain::{
    appointments::records::AccountUuid, businesses::records::BusinessUuid,
    preferences::records::NotificationPreferenceRecord,
};

const LOAD_PREFERENCES_SQL: &str = include_str!("sql/load_preferences.sql");

#[derive(Debug, Clone)]
pub(crate) struct PgPreferencesRepository {
    pool: PgPool,
}

impl PgPreferencesRepository {
    #[must_use]
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) async fn load_preferences(
        &self,
        business: BusinessUuid,
        accounts: &[AccountUuid],
    ) -> Result<Vec<NotificationPreferenceRecord>, sqlx::Error> {
        let accounts: Vec<Uuid> = accounts.iter().map(|a| a.into_uuid()).collect();

        query_as::<Postgres, NotificationPreferenceRecord>(LOAD_PREFERENCES_SQL)
            .bind(business.into_uuid())
            .bind(accounts)
            .fetch_all(&self.pool)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for NotificationPreferenceRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            account: AccountUuid::from_uuid(row.try_get("user_id")?),
            enabled: row.try_get("smart_promos_enabled")?,
            paused_until: row
                .try_get::<Option<SqlxTimestamp>, _>("smart_promos_paused_until")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}

//! Appointments Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, PgPool, Postgres, Row, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::domain::{
    appointments::records::{AccountUuid, ClientUuid, CompletedAppointmentRecord},
    businesses::records::BusinessUuid,
    catalog::records::ServiceUuid,
};

const LOAD_COMPLETED_HISTORY_SQL: &str = include_str!("sql/load_completed_history.sql");

#[derive(Debug, Clone)]
pub(crate) struct PgAppointmentsRepository {
    pool: PgPool,
}

impl PgAppointmentsRepository {
    #[must_use]
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) async fn load_completed_history(
        &self,
        business: BusinessUuid,
        since: Timestamp,
        until: Timestamp,
        limit: u32,
    ) -> Result<Vec<CompletedAppointmentRecord>, sqlx::Error> {
        query_as::<Postgres, CompletedAppointmentRecord>(LOAD_COMPLETED_HISTORY_SQL)
            .bind(business.into_uuid())
            .bind(SqlxTimestamp::from(since))
            .bind(SqlxTimestamp::from(until))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for CompletedAppointmentRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            client: ClientUuid::from_uuid(row.try_get("client_id")?),
            service: row
                .try_get::<Option<Uuid>, _>("service_id")?
                .map(ServiceUuid::from_uuid),
            scheduled_at: row.try_get::<SqlxTimestamp, _>("scheduled_at")?.to_jiff(),
            account: row
                .try_get::<Option<Uuid>, _>("user_id")?
                .map(AccountUuid::from_uuid),
        })
    }
}

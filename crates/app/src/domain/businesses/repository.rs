//! Businesses Repository

use sqlx::{FromRow, PgPool, Postgres, Row, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::domain::{
    businesses::records::{BusinessRecord, BusinessUuid},
    promotions::parse_rules,
};

const LIST_ELIGIBLE_BUSINESSES_SQL: &str = include_str!("sql/list_eligible_businesses.sql");

#[derive(Debug, Clone)]
pub(crate) struct PgBusinessesRepository {
    pool: PgPool,
}

impl PgBusinessesRepository {
    #[must_use]
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) async fn list_eligible_businesses(
        &self,
        only: Option<BusinessUuid>,
        limit: u32,
    ) -> Result<Vec<BusinessRecord>, sqlx::Error> {
        query_as::<Postgres, BusinessRecord>(LIST_ELIGIBLE_BUSINESSES_SQL)
            .bind(i64::from(limit))
            .bind(only.map(BusinessUuid::into_uuid))
            .fetch_all(&self.pool)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for BusinessRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let id: Uuid = row.try_get("id")?;
        let rules: serde_json::Value = row.try_get("promotional_slots")?;

        Ok(Self {
            id: BusinessUuid::from_uuid(id),
            slug: row.try_get("slug")?,
            timezone: row.try_get("timezone")?,
            rules: parse_rules(&rules),
        })
    }
}

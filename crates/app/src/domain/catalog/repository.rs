//! Services Repository

use sqlx::{FromRow, PgPool, Postgres, Row, postgres::PgRow, query_as};

use crate::domain::{
    businesses::records::BusinessUuid,
    catalog::records::{ServiceRecord, ServiceUuid},
};

const LIST_SERVICES_SQL: &str = include_str!("sql/list_services.sql");

#[derive(Debug, Clone)]
pub(crate) struct PgServicesRepository {
    pool: PgPool,
}

impl PgServicesRepository {
    #[must_use]
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) async fn list_services(
        &self,
        business: BusinessUuid,
    ) -> Result<Vec<ServiceRecord>, sqlx::Error> {
        query_as::<Postgres, ServiceRecord>(LIST_SERVICES_SQL)
            .bind(business.into_uuid())
            .fetch_all(&self.pool)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for ServiceRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: ServiceUuid::from_uuid(row.try_get("id")?),
            name: row.try_get("name")?,
            price: try_get_amount(row, "price")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

pub(crate) fn try_get_amount(row: &PgRow, col: &str) -> Result<u64, sqlx::Error> {
    let amount: i64 = row.try_get(col)?;

    u64::try_from(amount).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

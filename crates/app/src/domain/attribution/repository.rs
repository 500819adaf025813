//! Attribution Repository

use jiff::{Timestamp, civil::Weekday};
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, PgPool, Postgres, Row, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::domain::{
    appointments::records::{AccountUuid, ClientUuid},
    attribution::records::{AttributionRecord, AttributionToken, AttributionUuid, NewAttribution},
    businesses::records::BusinessUuid,
    habits::HabitBucketKey,
    notifications::records::NotificationUuid,
    promotions::PromoRuleUuid,
};

const INSERT_RESERVATION_SQL: &str = include_str!("sql/insert_reservation.sql");
const MARK_SENT_SQL: &str = include_str!("sql/mark_sent.sql");
const DELETE_RESERVATION_SQL: &str = include_str!("sql/delete_reservation.sql");
const RECENTLY_NOTIFIED_ACCOUNTS_SQL: &str = include_str!("sql/recently_notified_accounts.sql");
const UNSETTLED_RESERVATIONS_SQL: &str = include_str!("sql/unsettled_reservations.sql");

#[derive(Debug, Clone)]
pub(crate) struct PgAttributionRepository {
    pool: PgPool,
}

impl PgAttributionRepository {
    #[must_use]
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) async fn recently_notified_accounts(
        &self,
        business: BusinessUuid,
        accounts: &[AccountUuid],
        since: Timestamp,
    ) -> Result<Vec<AccountUuid>, sqlx::Error> {
        let accounts: Vec<Uuid> = accounts.iter().map(|a| a.into_uuid()).collect();

        let rows: Vec<Uuid> = query_scalar::<Postgres, Uuid>(RECENTLY_NOTIFIED_ACCOUNTS_SQL)
            .bind(business.into_uuid())
            .bind(accounts)
            .bind(SqlxTimestamp::from(since))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(AccountUuid::from_uuid).collect())
    }

    pub(crate) async fn unsettled_reservations(
        &self,
        business: BusinessUuid,
    ) -> Result<Vec<AttributionRecord>, sqlx::Error> {
        query_as::<Postgres, AttributionRecord>(UNSETTLED_RESERVATIONS_SQL)
            .bind(business.into_uuid())
            .fetch_all(&self.pool)
            .await
    }

    pub(crate) async fn insert_reservation(
        &self,
        attribution: NewAttribution,
    ) -> Result<AttributionRecord, sqlx::Error> {
        query_as::<Postgres, AttributionRecord>(INSERT_RESERVATION_SQL)
            .bind(attribution.id.into_uuid())
            .bind(attribution.token.into_uuid())
            .bind(attribution.business.into_uuid())
            .bind(attribution.client.into_uuid())
            .bind(attribution.account.into_uuid())
            .bind(i16::from(attribution.bucket.weekday_number()))
            .bind(i16::from(attribution.bucket.hour()))
            .bind(attribution.promo_rule.map(PromoRuleUuid::into_uuid))
            .bind(SqlxTimestamp::from(attribution.expires_at))
            .fetch_one(&self.pool)
            .await
    }

    /// Returns the number of reservations updated.
    pub(crate) async fn mark_sent(
        &self,
        business: BusinessUuid,
        id: AttributionUuid,
        sent_at: Timestamp,
        notification: Option<NotificationUuid>,
    ) -> Result<u64, sqlx::Error> {
        let result = query(MARK_SENT_SQL)
            .bind(id.into_uuid())
            .bind(business.into_uuid())
            .bind(SqlxTimestamp::from(sent_at))
            .bind(notification.map(NotificationUuid::into_uuid))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Returns the number of reservations deleted.
    pub(crate) async fn delete_reservation(
        &self,
        business: BusinessUuid,
        id: AttributionUuid,
    ) -> Result<u64, sqlx::Error> {
        let result = query(DELETE_RESERVATION_SQL)
            .bind(id.into_uuid())
            .bind(business.into_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

impl<'r> FromRow<'r, PgRow> for AttributionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: AttributionUuid::from_uuid(row.try_get("id")?),
            token: AttributionToken::from_uuid(row.try_get("token")?),
            business: BusinessUuid::from_uuid(row.try_get("business_id")?),
            client: ClientUuid::from_uuid(row.try_get("client_id")?),
            account: AccountUuid::from_uuid(row.try_get("user_id")?),
            bucket: try_get_bucket(row)?,
            promo_rule: row
                .try_get::<Option<Uuid>, _>("promo_rule_id")?
                .map(PromoRuleUuid::from_uuid),
            sent_at: row
                .try_get::<Option<SqlxTimestamp>, _>("sent_at")?
                .map(SqlxTimestamp::to_jiff),
            notification: row
                .try_get::<Option<Uuid>, _>("notification_id")?
                .map(NotificationUuid::from_uuid),
            expires_at: row.try_get::<SqlxTimestamp, _>("expires_at")?.to_jiff(),
        })
    }
}

fn try_get_bucket(row: &PgRow) -> Result<HabitBucketKey, sqlx::Error> {
    let dow: i16 = row.try_get("habit_bucket_dow")?;
    let hour: i16 = row.try_get("habit_bucket_hour")?;

    let weekday = i8::try_from(dow)
        .ok()
        .and_then(|dow| Weekday::from_sunday_zero_offset(dow).ok());

    let key = weekday.and_then(|weekday| {
        i8::try_from(hour)
            .ok()
            .and_then(|hour| HabitBucketKey::new(weekday, hour))
    });

    key.ok_or_else(|| sqlx::Error::ColumnDecode {
        index: "habit_bucket_dow".to_string(),
        source: format!("invalid habit bucket ({dow}, {hour})").into(),
    })
}

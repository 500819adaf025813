//! Businesses service.

use async_trait::async_trait;
use mockall::automock;
use tracing::Span;

use crate::{
    database::Db,
    domain::businesses::{
        errors::BusinessesServiceError,
        records::{BusinessRecord, BusinessUuid},
        repository::PgBusinessesRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgBusinessesService {
    repository: PgBusinessesRepository,
}

impl PgBusinessesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            repository: PgBusinessesRepository::new(db.pool().clone()),
        }
    }
}

#[async_trait]
impl BusinessesService for PgBusinessesService {
    #[tracing::instrument(
        name = "businesses.service.list_eligible_businesses",
        skip(self),
        fields(business_count = tracing::field::Empty),
        err
    )]
    async fn list_eligible_businesses(
        &self,
        only: Option<BusinessUuid>,
        limit: u32,
    ) -> Result<Vec<BusinessRecord>, BusinessesServiceError> {
        let businesses = self.repository.list_eligible_businesses(only, limit).await?;

        Span::current().record(
            "business_count",
            tracing::field::display(businesses.len()),
        );

        Ok(businesses)
    }
}

#[automock]
#[async_trait]
/// Selects the businesses a smart promotions run should visit.
pub trait BusinessesService: Send + Sync {
    /// Active, opted-in businesses with a slug and at least one enabled
    /// rule, ordered by id and capped at `limit`.
    async fn list_eligible_businesses(
        &self,
        only: Option<BusinessUuid>,
        limit: u32,
    ) -> Result<Vec<BusinessRecord>, BusinessesServiceError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use crate::test::{TestContext, fixtures};

    use super::*;

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn only_opted_in_businesses_with_enabled_rules_are_listed() -> TestResult {
        let ctx = TestContext::new().await;

        let eligible = fixtures::insert_business(&ctx.db, "eligible", Some("UTC")).await?;

        let disabled_rules = fixtures::insert_business(&ctx.db, "disabled-rules", None).await?;
        fixtures::set_promo_rules(
            &ctx.db,
            disabled_rules,
            json!([fixtures::promo_rule_json("r1", false, &[3], 0, 24)]),
        )
        .await?;

        let opted_out = fixtures::insert_business(&ctx.db, "opted-out", None).await?;
        fixtures::set_smart_notifications(&ctx.db, opted_out, false).await?;

        let businesses = ctx.businesses.list_eligible_businesses(None, 200).await?;

        let ids: Vec<BusinessUuid> = businesses.iter().map(|b| b.id).collect();

        assert_eq!(ids, vec![eligible]);
        assert_eq!(businesses.first().map(|b| b.rules.len()), Some(1));

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn listing_is_ordered_capped_and_filterable() -> TestResult {
        let ctx = TestContext::new().await;

        let mut ids = Vec::new();

        for slug in ["a", "b", "c"] {
            ids.push(fixtures::insert_business(&ctx.db, slug, None).await?);
        }

        ids.sort();

        let capped = ctx.businesses.list_eligible_businesses(None, 2).await?;
        let capped: Vec<BusinessUuid> = capped.iter().map(|b| b.id).collect();

        assert_eq!(capped, ids.iter().copied().take(2).collect::<Vec<_>>());

        let target = ids.last().copied();

        let only = ctx.businesses.list_eligible_businesses(target, 200).await?;

        assert_eq!(
            only.iter().map(|b| b.id).collect::<Vec<_>>(),
            target.into_iter().collect::<Vec<_>>()
        );

        Ok(())
    }
}

//! Per-business single-flight leases.

use async_trait::async_trait;
use sqlx::{Postgres, Transaction, query_scalar};
use thiserror::Error;

use crate::{database::Db, domain::businesses::records::BusinessUuid};

const TRY_BUSINESS_LOCK_SQL: &str = include_str!("sql/try_business_lock.sql");

#[derive(Debug, Error)]
pub enum LeaseError {
    #[error("storage error")]
    Sql(#[from] sqlx::Error),
}

/// Whatever keeps a lease held.
#[async_trait]
pub trait LeaseGuard: Send {
    async fn release(self: Box<Self>) -> Result<(), LeaseError>;
}

/// Exclusive right to process one business.
///
/// Call [`BusinessLease::release`] when done; dropping the lease releases it
/// too, but without reporting errors.
pub struct BusinessLease {
    business: BusinessUuid,
    guard: Box<dyn LeaseGuard>,
}

impl BusinessLease {
    pub fn new(business: BusinessUuid, guard: impl LeaseGuard + 'static) -> Self {
        Self {
            business,
            guard: Box::new(guard),
        }
    }

    pub fn business(&self) -> BusinessUuid {
        self.business
    }

    pub async fn release(self) -> Result<(), LeaseError> {
        self.guard.release().await
    }
}

impl std::fmt::Debug for BusinessLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusinessLease")
            .field("business", &self.business)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait BusinessLeases: Send + Sync {
    /// `None` when another run holds the business.
    async fn try_acquire(&self, business: BusinessUuid)
    -> Result<Option<BusinessLease>, LeaseError>;
}

/// Leases backed by transaction-scoped advisory locks.
///
/// The lock lives as long as the lease's transaction; releasing the lease
/// rolls the transaction back.
#[derive(Debug, Clone)]
pub struct PgBusinessLeases {
    db: Db,
}

impl PgBusinessLeases {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LeaseGuard for Transaction<'static, Postgres> {
    async fn release(self: Box<Self>) -> Result<(), LeaseError> {
        (*self).rollback().await?;

        Ok(())
    }
}

#[async_trait]
impl BusinessLeases for PgBusinessLeases {
    #[tracing::instrument(
        name = "leases.try_acquire",
        skip(self),
        fields(business_id = %business),
        err
    )]
    async fn try_acquire(
        &self,
        business: BusinessUuid,
    ) -> Result<Option<BusinessLease>, LeaseError> {
        let mut tx = self.db.begin().await?;

        let locked = query_scalar::<Postgres, bool>(TRY_BUSINESS_LOCK_SQL)
            .bind(business.to_string())
            .fetch_one(&mut *tx)
            .await?;

        if !locked {
            tx.rollback().await?;

            return Ok(None);
        }

        Ok(Some(BusinessLease::new(business, tx)))
    }
}

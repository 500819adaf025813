//! Reservation, commit and rollback of attribution records.

use std::{sync::Arc, time::Duration};

use jiff::{SignedDuration, Timestamp};
use thiserror::Error;
use tracing::{error, warn};

use crate::domain::{
    appointments::records::{AccountUuid, ClientUuid},
    attribution::{
        AttributionService, AttributionServiceError,
        records::{AttributionRecord, AttributionToken, AttributionUuid, NewAttribution},
    },
    businesses::records::BusinessUuid,
    habits::HabitBucketKey,
    notifications::{DispatchOutcome, records::NotificationUuid},
    promotions::PromoRuleUuid,
};

/// Attempts per settlement write before giving up.
const SETTLE_ATTEMPTS: u32 = 3;

const SETTLE_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Where a settled attribution attempt ended up.
///
/// The reserved state is a [`Reservation`] and never leaves the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributionState {
    /// At least one channel delivered; the record holds the account in cooldown.
    Sent,

    /// No channel delivered; the record was deleted.
    RolledBack,
}

/// What to reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributionRequest {
    pub business: BusinessUuid,
    pub client: ClientUuid,
    pub account: AccountUuid,
    pub bucket: HabitBucketKey,
    pub promo_rule: Option<PromoRuleUuid>,
}

/// A reservation awaiting settlement.
#[derive(Debug)]
#[must_use = "a reservation must be settled by committing or rolling it back"]
pub struct Reservation {
    record: AttributionRecord,
}

impl Reservation {
    pub fn id(&self) -> AttributionUuid {
        self.record.id
    }

    pub fn token(&self) -> AttributionToken {
        self.record.token
    }

    pub fn expires_at(&self) -> Timestamp {
        self.record.expires_at
    }
}

/// A settlement that could not be written.
#[derive(Debug, Error)]
#[error("failed to settle attribution as {intended:?}")]
pub struct SettleError {
    /// The state the record should have reached.
    pub intended: AttributionState,

    #[source]
    pub source: AttributionServiceError,
}

/// Unsettled reservations found and resolved by [`AttributionLedger::recover`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Recovery {
    /// Unexpired reservations kept as sends.
    pub committed: usize,

    /// Expired reservations deleted.
    pub released: usize,
}

impl Recovery {
    pub fn is_empty(&self) -> bool {
        self.committed == 0 && self.released == 0
    }
}

/// Owns every attribution state transition.
#[derive(Clone)]
pub struct AttributionLedger {
    store: Arc<dyn AttributionService>,
    ttl: SignedDuration,
}

impl std::fmt::Debug for AttributionLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributionLedger")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl AttributionLedger {
    pub fn new(store: Arc<dyn AttributionService>, ttl: SignedDuration) -> Self {
        Self { store, ttl }
    }

    /// Accounts with a send after `since`.
    pub async fn cooling_down(
        &self,
        business: BusinessUuid,
        accounts: &[AccountUuid],
        since: Timestamp,
    ) -> Result<Vec<AccountUuid>, AttributionServiceError> {
        self.store
            .recently_notified_accounts(business, accounts, since)
            .await
    }

    /// Persist a reservation with a fresh token, expiring `ttl` after `now`.
    pub async fn reserve(
        &self,
        request: AttributionRequest,
        now: Timestamp,
    ) -> Result<Reservation, AttributionServiceError> {
        let expires_at = now.checked_add(self.ttl).unwrap_or(Timestamp::MAX);

        let record = self
            .store
            .reserve(NewAttribution {
                id: AttributionUuid::new(),
                token: AttributionToken::generate(),
                business: request.business,
                client: request.client,
                account: request.account,
                bucket: request.bucket,
                promo_rule: request.promo_rule,
                expires_at,
            })
            .await?;

        Ok(Reservation { record })
    }

    /// Reserved -> Sent.
    pub async fn commit(
        &self,
        reservation: Reservation,
        sent_at: Timestamp,
        notification: Option<NotificationUuid>,
    ) -> Result<AttributionState, SettleError> {
        let record = reservation.record;

        retrying(|| {
            self.store
                .mark_sent(record.business, record.id, sent_at, notification)
        })
        .await
        .map_err(|source| SettleError {
            intended: AttributionState::Sent,
            source,
        })?;

        Ok(AttributionState::Sent)
    }

    /// Reserved -> RolledBack. The record is deleted, as if never attempted.
    pub async fn roll_back(&self, reservation: Reservation) -> Result<AttributionState, SettleError> {
        let record = reservation.record;

        retrying(|| self.store.release(record.business, record.id))
            .await
            .map_err(|source| SettleError {
                intended: AttributionState::RolledBack,
                source,
            })?;

        Ok(AttributionState::RolledBack)
    }

    /// Resolve reservations a previous run left unsettled.
    ///
    /// Must only be called while holding the business lease, so that every
    /// unsettled reservation belongs to a finished run. Such a reservation may
    /// have been delivered, so while unexpired it is kept as a send dated at
    /// its reservation time. Expired ones are deleted.
    pub async fn recover(
        &self,
        business: BusinessUuid,
        now: Timestamp,
    ) -> Result<Recovery, AttributionServiceError> {
        let mut recovery = Recovery::default();

        for record in self.store.unsettled_reservations(business).await? {
            if record.expires_at > now {
                let reserved_at = record
                    .expires_at
                    .checked_sub(self.ttl)
                    .unwrap_or(Timestamp::MIN)
                    .min(now);

                self.store
                    .mark_sent(business, record.id, reserved_at, None)
                    .await?;

                recovery.committed += 1;
            } else {
                self.store.release(business, record.id).await?;

                recovery.released += 1;
            }
        }

        if !recovery.is_empty() {
            warn!(
                business_id = %business,
                committed = recovery.committed,
                released = recovery.released,
                "recovered unsettled attributions"
            );
        }

        Ok(recovery)
    }

    /// Commit when any channel delivered, otherwise roll back.
    pub async fn settle(
        &self,
        reservation: Reservation,
        outcome: &DispatchOutcome,
        now: Timestamp,
    ) -> Result<AttributionState, SettleError> {
        let id = reservation.id();

        let settled = if outcome.delivered() {
            self.commit(reservation, now, outcome.in_app).await
        } else {
            self.roll_back(reservation).await
        };

        if let Err(error) = &settled {
            error!(
                attribution_id = %id,
                intended = ?error.intended,
                error = %error.source,
                "failed to settle attribution"
            );
        }

        settled
    }
}

/// Run a settlement write up to [`SETTLE_ATTEMPTS`] times.
async fn retrying<F, Fut>(mut write: F) -> Result<(), AttributionServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), AttributionServiceError>>,
{
    let mut attempt = 1;

    loop {
        match write().await {
            Ok(()) => return Ok(()),
            Err(AttributionServiceError::NotFound) => return Err(AttributionServiceError::NotFound),
            Err(error) if attempt < SETTLE_ATTEMPTS => {
                warn!(%error, attempt, "attribution write failed, retrying");

                tokio::time::sleep(SETTLE_RETRY_DELAY * attempt).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

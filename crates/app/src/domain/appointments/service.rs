//! Appointments service.

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use tracing::Span;

use crate::{
    database::Db,
    domain::{
        appointments::{
            errors::AppointmentsServiceError, records::CompletedAppointmentRecord,
            repository::PgAppointmentsRepository,
        },
        businesses::records::BusinessUuid,
    },
};

/// Bounds of a history read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    /// How far back to look from `now`.
    pub lookback: SignedDuration,

    /// Maximum number of rows returned; older rows beyond it are dropped.
    pub row_cap: u32,
}

#[derive(Debug, Clone)]
pub struct PgAppointmentsService {
    repository: PgAppointmentsRepository,
}

impl PgAppointmentsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            repository: PgAppointmentsRepository::new(db.pool().clone()),
        }
    }
}

#[async_trait]
impl AppointmentsService for PgAppointmentsService {
    #[tracing::instrument(
        name = "appointments.service.load_completed_history",
        skip(self, window),
        fields(business_id = %business, row_count = tracing::field::Empty),
        err
    )]
    async fn load_completed_history(
        &self,
        business: BusinessUuid,
        now: Timestamp,
        window: HistoryWindow,
    ) -> Result<Vec<CompletedAppointmentRecord>, AppointmentsServiceError> {
        let since = now.checked_sub(window.lookback).unwrap_or(Timestamp::MIN);

        let rows = self
            .repository
            .load_completed_history(business, since, now, window.row_cap)
            .await?;

        Span::current().record("row_count", tracing::field::display(rows.len()));

        Ok(rows)
    }
}

#[automock]
#[async_trait]
/// Read access to completed appointment history.
pub trait AppointmentsService: Send + Sync {
    /// Completed appointments with a client in `[now - lookback, now]`,
    /// most recent first, capped at the window's row cap.
    async fn load_completed_history(
        &self,
        business: BusinessUuid,
        now: Timestamp,
        window: HistoryWindow,
    ) -> Result<Vec<CompletedAppointmentRecord>, AppointmentsServiceError>;
}

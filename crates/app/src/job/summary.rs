//! Run summary.

use std::ops::{Add, AddAssign};

use serde::Serialize;

use crate::domain::eligibility::Ineligibility;

/// Coarse counters reported by a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub businesses_processed: u64,
    pub clients_evaluated: u64,
    pub candidates_found: u64,
    pub sent: u64,
    pub skipped: u64,
    pub errors: u64,
}

impl RunSummary {
    /// A selected business, before any of its accounts are counted.
    pub(crate) fn business() -> Self {
        Self {
            businesses_processed: 1,
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, outcome: CandidateOutcome) {
        self.clients_evaluated += 1;

        match outcome {
            CandidateOutcome::Ineligible(_)
            | CandidateOutcome::NoHabit
            | CandidateOutcome::NoSlot
            | CandidateOutcome::NoPromo => self.skipped += 1,
            CandidateOutcome::ReservationFailed | CandidateOutcome::Undelivered => {
                self.candidates_found += 1;
                self.errors += 1;
            }
            CandidateOutcome::UndeliveredNotReleased => {
                self.candidates_found += 1;
                self.errors += 2;
            }
            CandidateOutcome::Sent => {
                self.candidates_found += 1;
                self.sent += 1;
            }
            CandidateOutcome::SentNotRecorded => {
                self.candidates_found += 1;
                self.sent += 1;
                self.errors += 1;
            }
        }
    }
}

impl Add for RunSummary {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            businesses_processed: self.businesses_processed + other.businesses_processed,
            clients_evaluated: self.clients_evaluated + other.clients_evaluated,
            candidates_found: self.candidates_found + other.candidates_found,
            sent: self.sent + other.sent,
            skipped: self.skipped + other.skipped,
            errors: self.errors + other.errors,
        }
    }
}

impl AddAssign for RunSummary {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

/// How a single account ended up in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CandidateOutcome {
    Ineligible(Ineligibility),
    NoHabit,
    NoSlot,
    NoPromo,

    /// The reservation could not be written; nothing was sent.
    ReservationFailed,

    Sent,

    /// Delivered, but the reservation could not be marked sent.
    SentNotRecorded,

    /// No channel delivered; the reservation was removed.
    Undelivered,

    /// No channel delivered and the reservation could not be removed.
    UndeliveredNotReleased,
}

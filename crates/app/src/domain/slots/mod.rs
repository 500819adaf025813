//! Slot Projection

use jiff::{RoundMode, SignedDuration, Timestamp, Unit, ZonedRound, tz::TimeZone};

use crate::domain::habits::HabitBucketKey;

const STEP: SignedDuration = SignedDuration::from_hours(1);

/// Projects a habit bucket onto the next concrete instant.
#[derive(Debug, Clone, Copy)]
pub struct SlotProjector {
    window: SignedDuration,
}

impl SlotProjector {
    #[must_use]
    pub fn new(window: SignedDuration) -> Self {
        Self { window }
    }

    /// Earliest whole local hour after `now` that falls in `bucket`, no later
    /// than `now + window`.
    ///
    /// Candidates advance one absolute hour at a time, so a local hour skipped
    /// by a DST gap never matches and a repeated one matches on its first
    /// occurrence.
    pub fn project(
        &self,
        bucket: HabitBucketKey,
        now: Timestamp,
        time_zone: &TimeZone,
    ) -> Option<Timestamp> {
        let horizon = now.checked_add(self.window).ok()?;

        let mut cursor = now
            .to_zoned(time_zone.clone())
            .round(
                ZonedRound::new()
                    .smallest(Unit::Hour)
                    .mode(RoundMode::Trunc),
            )
            .ok()?
            .timestamp()
            .checked_add(STEP)
            .ok()?;

        while cursor <= horizon {
            if HabitBucketKey::at(cursor, time_zone) == bucket {
                return Some(cursor);
            }

            cursor = cursor.checked_add(STEP).ok()?;
        }

        None
    }
}

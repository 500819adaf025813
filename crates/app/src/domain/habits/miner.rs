use jiff::{Timestamp, tz::TimeZone};
use rustc_hash::FxHashMap;

use crate::domain::{
    catalog::records::ServiceUuid,
    habits::{
        bucket::{HabitBucket, HabitBucketKey},
        profile::ClientHabitProfile,
    },
};

/// An account's dominant booking habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Habit {
    pub bucket: HabitBucketKey,

    /// Samples in the bucket.
    pub support: u32,

    pub last_seen: Timestamp,

    /// Habitual service, `None` when no sample in the bucket had one.
    pub service: Option<ServiceUuid>,
}

#[derive(Debug, Clone, Copy)]
pub struct HabitMiner {
    min_support: u32,
}

impl HabitMiner {
    #[must_use]
    pub fn new(min_support: u32) -> Self {
        Self { min_support }
    }

    /// Bucket every sample in business-local time and pick the dominant
    /// bucket. Returns `None` when that bucket has fewer samples than the
    /// minimum support.
    pub fn mine(&self, profile: &ClientHabitProfile, time_zone: &TimeZone) -> Option<Habit> {
        let mut buckets: FxHashMap<HabitBucketKey, HabitBucket> = FxHashMap::default();

        for sample in &profile.samples {
            let key = HabitBucketKey::at(sample.at, time_zone);

            buckets
                .entry(key)
                .or_insert_with(|| HabitBucket::new(key, sample.at))
                .add(sample.at, sample.service);
        }

        let dominant = buckets.values().max_by(|a, b| a.rank(b))?;

        if dominant.count < self.min_support {
            return None;
        }

        Some(Habit {
            bucket: dominant.key,
            support: dominant.count,
            last_seen: dominant.last_seen,
            service: dominant.dominant_service(),
        })
    }
}

use std::{cmp::Ordering, hash::Hash};

use jiff::{Timestamp, civil::Weekday, tz::TimeZone};
use rustc_hash::FxHashMap;

use crate::domain::catalog::records::ServiceUuid;

/// Business-local (weekday, hour) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HabitBucketKey {
    weekday: Weekday,
    hour: i8,
}

impl HabitBucketKey {
    /// `hour` must be 0-23.
    pub fn new(weekday: Weekday, hour: i8) -> Option<Self> {
        (0..=23)
            .contains(&hour)
            .then_some(Self { weekday, hour })
    }

    /// Bucket an instant in the given time zone.
    pub fn at(instant: Timestamp, time_zone: &TimeZone) -> Self {
        let local = time_zone.to_datetime(instant);

        Self {
            weekday: local.weekday(),
            hour: local.hour(),
        }
    }

    pub fn weekday(self) -> Weekday {
        self.weekday
    }

    /// Weekday number, Sunday = 0.
    pub fn weekday_number(self) -> i8 {
        self.weekday.to_sunday_zero_offset()
    }

    pub fn hour(self) -> i8 {
        self.hour
    }
}

/// Sunday-first weekday, then hour.
impl Ord for HabitBucketKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weekday_number()
            .cmp(&other.weekday_number())
            .then_with(|| self.hour.cmp(&other.hour))
    }
}

impl PartialOrd for HabitBucketKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Samples that fell into one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitBucket {
    pub key: HabitBucketKey,

    pub count: u32,

    /// Most recent sample instant.
    pub last_seen: Timestamp,

    /// Sample count per service; samples without a service are not listed.
    pub services: FxHashMap<ServiceUuid, u32>,
}

impl HabitBucket {
    pub(super) fn new(key: HabitBucketKey, at: Timestamp) -> Self {
        Self {
            key,
            count: 0,
            last_seen: at,
            services: FxHashMap::default(),
        }
    }

    pub(super) fn add(&mut self, at: Timestamp, service: Option<ServiceUuid>) {
        self.count += 1;
        self.last_seen = self.last_seen.max(at);

        if let Some(service) = service {
            *self.services.entry(service).or_default() += 1;
        }
    }

    /// Most booked service, smallest id on ties.
    pub fn dominant_service(&self) -> Option<ServiceUuid> {
        dominant(&self.services)
    }

    /// Ranking used to pick an account's habit: count, then recency, then
    /// the earlier bucket in the week.
    pub(super) fn rank(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| self.last_seen.cmp(&other.last_seen))
            .then_with(|| other.key.cmp(&self.key))
    }
}

fn dominant<K: Ord + Copy + Hash>(counts: &FxHashMap<K, u32>) -> Option<K> {
    counts
        .iter()
        .max_by(|(a, a_count), (b, b_count)| a_count.cmp(b_count).then_with(|| b.cmp(a)))
        .map(|(key, _)| *key)
}

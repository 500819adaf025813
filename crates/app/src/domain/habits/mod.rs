//! Habit Mining
//!
//! A habit is the business-local (weekday, hour) at which an account most
//! often completed appointments, together with the service it usually
//! booked at that time.

mod bucket;
mod miner;
mod profile;

pub use bucket::{HabitBucket, HabitBucketKey};
pub use miner::{Habit, HabitMiner};
pub use profile::{ClientHabitProfile, HabitSample, group_by_account};

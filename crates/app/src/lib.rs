//! Smart promotional notifications: habit mining, slot projection and
//! attributed two-channel delivery.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod job;
pub mod observability;

#[cfg(test)]
mod test;

mod uuids;

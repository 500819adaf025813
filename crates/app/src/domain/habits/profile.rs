use jiff::Timestamp;
use rustc_hash::FxHashMap;

use crate::domain::{
    appointments::records::{AccountUuid, ClientUuid, CompletedAppointmentRecord},
    catalog::records::ServiceUuid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HabitSample {
    pub service: Option<ServiceUuid>,
    pub at: Timestamp,
}

/// History of one account at one business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHabitProfile {
    pub account: AccountUuid,

    /// Client row of the account's most recent appointment.
    pub client: ClientUuid,

    /// Instant of the most recent appointment.
    pub last_seen: Timestamp,

    pub samples: Vec<HabitSample>,
}

/// Group history by linked account.
///
/// Rows without an account are dropped. Profiles come back ordered by their
/// most recent appointment, newest first, with the account id breaking ties.
pub fn group_by_account(history: &[CompletedAppointmentRecord]) -> Vec<ClientHabitProfile> {
    let mut index: FxHashMap<AccountUuid, usize> = FxHashMap::default();
    let mut profiles: Vec<ClientHabitProfile> = Vec::new();

    for record in history {
        let Some(account) = record.account else {
            continue;
        };

        let sample = HabitSample {
            service: record.service,
            at: record.scheduled_at,
        };

        let slot = *index.entry(account).or_insert_with(|| {
            profiles.push(ClientHabitProfile {
                account,
                client: record.client,
                last_seen: record.scheduled_at,
                samples: Vec::new(),
            });

            profiles.len() - 1
        });

        let Some(profile) = profiles.get_mut(slot) else {
            continue;
        };

        if record.scheduled_at > profile.last_seen {
            profile.last_seen = record.scheduled_at;
            profile.client = record.client;
        }

        profile.samples.push(sample);
    }

    profiles.sort_by(|a, b| {
        b.last_seen
            .cmp(&a.last_seen)
            .then_with(|| a.account.cmp(&b.account))
    });

    profiles
}

//! Appointment Records

use jiff::Timestamp;

use crate::{domain::catalog::records::ServiceUuid, uuids::TypedUuid};

/// Client row of a business.
#[derive(Debug)]
pub enum Client {}

/// User account a client row may be linked to.
#[derive(Debug)]
pub enum Account {}

/// Client UUID
pub type ClientUuid = TypedUuid<Client>;

/// Account UUID
pub type AccountUuid = TypedUuid<Account>;

/// A completed appointment, as read for habit mining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedAppointmentRecord {
    pub client: ClientUuid,

    pub service: Option<ServiceUuid>,

    pub scheduled_at: Timestamp,

    /// Linked account; anonymous clients have none and are never mined.
    pub account: Option<AccountUuid>,
}

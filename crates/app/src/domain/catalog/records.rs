//! Service Records

use crate::uuids::TypedUuid;

/// Service UUID
pub type ServiceUuid = TypedUuid<ServiceRecord>;

/// A bookable service offered by a business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub id: ServiceUuid,

    pub name: String,

    /// Price in minor units.
    pub price: u64,

    pub is_active: bool,
}

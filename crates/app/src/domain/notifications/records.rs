//! Notification Records

use crate::uuids::TypedUuid;

/// In-app notification row.
#[derive(Debug)]
pub enum Notification {}

/// Notification UUID
pub type NotificationUuid = TypedUuid<Notification>;

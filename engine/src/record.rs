//! Record and event types flowing through a sync request.

use crate::{DeviceId, LocationId, Timestamp, Uuid};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The entity types a device can pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Participant,
    Visit,
    Template,
    Image,
}

impl EntityKind {
    /// All kinds, in the order a full sync cycle pulls them.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Participant,
        EntityKind::Visit,
        EntityKind::Template,
        EntityKind::Image,
    ];

    /// Whether records of this kind carry a meaningful origin-device
    /// attribute that the optimize pass can exclude on.
    pub fn supports_device_exclusion(&self) -> bool {
        matches!(self, EntityKind::Template | EntityKind::Image)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Participant => "participant",
            EntityKind::Visit => "visit",
            EntityKind::Template => "template",
            EntityKind::Image => "image",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A syncable record as seen by the engine.
///
/// Deletion is a soft flag, never physical removal, so a delta can carry
/// "remove this on the device" as a typed event rather than an absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRecord {
    /// Unique identifier for this record
    pub uuid: Uuid,
    /// When the record was last modified (milliseconds since epoch)
    pub last_modified: Timestamp,
    /// Soft delete flag
    pub voided: bool,
    /// Locations this record belongs to (always at least one)
    pub location_ids: BTreeSet<LocationId>,
    /// Device that first created the record, when known
    pub origin_device_id: Option<DeviceId>,
    /// Type-specific payload (demographics, observations, encoded bytes)
    pub payload: serde_json::Value,
}

impl SyncRecord {
    /// Create a record belonging to a single location.
    pub fn new(
        uuid: impl Into<Uuid>,
        last_modified: Timestamp,
        location_id: impl Into<LocationId>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            last_modified,
            voided: false,
            location_ids: BTreeSet::from([location_id.into()]),
            origin_device_id: None,
            payload,
        }
    }

    /// Mark the record as voided.
    pub fn voided(mut self) -> Self {
        self.voided = true;
        self
    }

    /// Attach the originating device.
    pub fn from_device(mut self, device_id: impl Into<DeviceId>) -> Self {
        self.origin_device_id = Some(device_id.into());
        self
    }

    /// Whether any of the record's locations fall inside the given set.
    pub fn in_locations(&self, locations: &BTreeSet<LocationId>) -> bool {
        self.location_ids.iter().any(|id| locations.contains(id))
    }

    /// Whether the record originates from the given device.
    pub fn originates_from(&self, device_id: &str) -> bool {
        self.origin_device_id.as_deref() == Some(device_id)
    }
}

/// Kind of change carried by a sync event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Update,
    Delete,
}

/// One change delivered to a device.
///
/// DELETE events carry no payload; the uuid is enough for the device to
/// drop its local copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub uuid: Uuid,
    pub last_modified: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl TypedEvent {
    /// An update event carrying the record's payload.
    pub fn update(uuid: impl Into<Uuid>, last_modified: Timestamp, payload: serde_json::Value) -> Self {
        Self {
            event_type: EventType::Update,
            uuid: uuid.into(),
            last_modified,
            payload: Some(payload),
        }
    }

    /// A delete event; no payload.
    pub fn delete(uuid: impl Into<Uuid>, last_modified: Timestamp) -> Self {
        Self {
            event_type: EventType::Delete,
            uuid: uuid.into(),
            last_modified,
            payload: None,
        }
    }

    /// Convert a paged record into its device-facing event.
    pub fn from_record(record: SyncRecord) -> Self {
        if record.voided {
            Self::delete(record.uuid, record.last_modified)
        } else {
            Self::update(record.uuid, record.last_modified, record.payload)
        }
    }
}

/// Per-entity-type totals for a location set.
///
/// `ignored_count` is absent (not zero) when optimize is off or the kind
/// has no origin-device attribute to exclude on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCounts {
    pub total: u64,
    pub active_count: u64,
    pub voided_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored_count: Option<u64>,
}

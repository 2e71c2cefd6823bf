//! Response assembly: one envelope per entity type.

use crate::{
    error::Result, image, page, DeviceId, EntityKind, Error, ImageStore, LocationId, SyncCounts,
    SyncCursor, SyncRecord, SyncScope, TimestampSource, TypedEvent,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A device's request for one page of one (or more) entity types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub scope: SyncScope,
    pub cursor: SyncCursor,
    pub device_id: DeviceId,
    #[serde(default)]
    pub optimize: bool,
}

/// Everything a device needs from one page of one entity type: the events,
/// the progress counts, and where to resume.
///
/// The request's scope, cursor, and optimize flag are echoed back so a
/// device can correlate responses without tracking requests in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponseEnvelope {
    pub scope: SyncScope,
    pub optimize: bool,
    pub cursor: SyncCursor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<SyncCursor>,
    pub counts: SyncCounts,
    pub records: Vec<TypedEvent>,
}

/// Compose a page, its counts, and (for images) the blob diff into one
/// envelope.
///
/// `candidates` are the records visible to this request; a SQL caller may
/// pre-apply the location and lower-bound predicates. `counts` must be
/// computed over the same location membership, cursor-independent (see
/// [`crate::counts::counts`] for the in-memory path).
pub fn assemble(
    kind: EntityKind,
    request: &SyncRequest,
    locations: &BTreeSet<LocationId>,
    candidates: Vec<SyncRecord>,
    counts: SyncCounts,
    image_store: Option<&dyn ImageStore>,
) -> Result<SyncResponseEnvelope> {
    let page = page::page(
        candidates,
        locations,
        &request.cursor,
        &request.device_id,
        request.optimize,
    )?;

    let records = match kind {
        EntityKind::Image => {
            let store = image_store
                .ok_or_else(|| Error::Unavailable("image store not configured".into()))?;
            image::image_events(&page.records, store, TimestampSource::Record)?
        }
        _ => page.records.into_iter().map(TypedEvent::from_record).collect(),
    };

    Ok(SyncResponseEnvelope {
        scope: request.scope.clone(),
        optimize: request.optimize,
        cursor: request.cursor.clone(),
        next_cursor: page.next_cursor,
        counts,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{counts::counts, EventType, MemoryImageStore};
    use serde_json::json;

    fn request(limit: i64, optimize: bool) -> SyncRequest {
        SyncRequest {
            scope: SyncScope::Site {
                site: "site-1".into(),
            },
            cursor: SyncCursor::initial(limit),
            device_id: "tablet-1".into(),
            optimize,
        }
    }

    fn site_1() -> BTreeSet<LocationId> {
        BTreeSet::from(["site-1".to_string()])
    }

    #[test]
    fn participant_envelope_mixes_updates_and_deletes() {
        let records = vec![
            SyncRecord::new("p-1", 100, "site-1", json!({"name": "Alice"})),
            SyncRecord::new("p-2", 200, "site-1", json!({"name": "Bob"})).voided(),
        ];
        let request = request(10, false);
        let counts = counts(
            &records,
            &site_1(),
            EntityKind::Participant,
            &request.device_id,
            false,
        );

        let envelope = assemble(
            EntityKind::Participant,
            &request,
            &site_1(),
            records,
            counts,
            None,
        )
        .unwrap();

        assert_eq!(envelope.records.len(), 2);
        assert_eq!(envelope.records[0].event_type, EventType::Update);
        assert_eq!(envelope.records[1].event_type, EventType::Delete);
        assert!(envelope.next_cursor.is_none());
        assert_eq!(envelope.counts.total, 2);
        assert_eq!(envelope.cursor, SyncCursor::initial(10));
    }

    #[test]
    fn image_envelope_requires_a_store() {
        let request = request(10, false);
        let counts = counts(&[], &site_1(), EntityKind::Image, &request.device_id, false);

        let result = assemble(EntityKind::Image, &request, &site_1(), vec![], counts, None);
        assert!(matches!(result, Err(Error::Unavailable(_))));
    }

    #[test]
    fn image_envelope_diffs_against_the_store() {
        let mut store = MemoryImageStore::new();
        store.insert("p-1", b"bytes".to_vec(), 50);

        let records = vec![
            SyncRecord::new("p-1", 100, "site-1", json!({})),
            SyncRecord::new("p-2", 200, "site-1", json!({})), // no file: skipped
            SyncRecord::new("p-3", 300, "site-1", json!({})).voided(),
        ];
        let request = request(10, false);
        let counts = counts(
            &records,
            &site_1(),
            EntityKind::Image,
            &request.device_id,
            false,
        );

        let envelope = assemble(
            EntityKind::Image,
            &request,
            &site_1(),
            records,
            counts,
            Some(&store),
        )
        .unwrap();

        assert_eq!(envelope.records.len(), 2);
        assert_eq!(envelope.records[0].uuid, "p-1");
        assert_eq!(envelope.records[0].event_type, EventType::Update);
        assert_eq!(envelope.records[1].uuid, "p-3");
        assert_eq!(envelope.records[1].event_type, EventType::Delete);
    }

    #[test]
    fn envelope_echoes_request() {
        let records = vec![SyncRecord::new("v-1", 100, "site-1", json!({}))];
        let request = SyncRequest {
            scope: SyncScope::Country {
                country: "Belgium".into(),
            },
            cursor: SyncCursor::initial(1),
            device_id: "tablet-9".into(),
            optimize: true,
        };
        let locations = site_1();
        let counts = counts(&records, &locations, EntityKind::Visit, &request.device_id, true);

        let envelope = assemble(
            EntityKind::Visit,
            &request,
            &locations,
            records,
            counts,
            None,
        )
        .unwrap();

        assert_eq!(envelope.scope, request.scope);
        assert!(envelope.optimize);
        // Full page of 1: next cursor present
        assert!(envelope.next_cursor.is_some());
    }

    #[test]
    fn request_wire_form() {
        let json = r#"{
            "scope": {"site": "site-1"},
            "cursor": {"limit": 25},
            "deviceId": "tablet-1"
        }"#;
        let request: SyncRequest = serde_json::from_str(json).unwrap();

        assert!(!request.optimize);
        assert_eq!(request.cursor.limit, 25);
        assert!(matches!(request.scope, SyncScope::Site { .. }));
    }
}

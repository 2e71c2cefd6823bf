//! The sync query engine: one page of changed records for one entity type.

use crate::{error::Result, DeviceId, LocationId, SyncCursor, SyncRecord};
use std::collections::BTreeSet;

/// One page of records plus the position to resume from.
///
/// `next_cursor` of `None` signals the device is caught up for this entity
/// type until the next sync cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub records: Vec<SyncRecord>,
    pub next_cursor: Option<SyncCursor>,
}

/// Compute the next page of changed records.
///
/// Candidates may be pre-filtered by the caller (a SQL layer typically
/// pushes the location and lower-bound predicates down); every filter here
/// is idempotent, so over-fetching is safe and under-filtering is not
/// relied on.
///
/// Steps: location filter, cursor lower bound with boundary uuid
/// exclusion, origin-device exclusion when optimize is on, ascending
/// `(last_modified, uuid)` sort, entity-offset skip, limit truncation,
/// next-cursor derivation.
pub fn page(
    candidates: impl IntoIterator<Item = SyncRecord>,
    locations: &BTreeSet<LocationId>,
    cursor: &SyncCursor,
    device_id: &DeviceId,
    optimize: bool,
) -> Result<Page> {
    cursor.validate()?;

    let mut matching: Vec<SyncRecord> = candidates
        .into_iter()
        .filter(|r| r.in_locations(locations))
        .filter(|r| cursor.admits(r))
        .filter(|r| !(optimize && r.originates_from(device_id)))
        .collect();

    matching.sort_by(|a, b| {
        a.last_modified
            .cmp(&b.last_modified)
            .then_with(|| a.uuid.cmp(&b.uuid))
    });

    let records: Vec<SyncRecord> = matching
        .into_iter()
        .skip(cursor.entity_offset as usize)
        .take(cursor.limit as usize)
        .collect();

    let next_cursor = cursor.advance(&records);

    Ok(Page {
        records,
        next_cursor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;

    fn record(uuid: &str, last_modified: u64, location: &str) -> SyncRecord {
        SyncRecord::new(uuid, last_modified, location, json!({}))
    }

    fn site(id: &str) -> BTreeSet<LocationId> {
        BTreeSet::from([id.to_string()])
    }

    #[test]
    fn filters_to_scope_locations() {
        let candidates = vec![
            record("a", 100, "site-1"),
            record("b", 200, "site-2"),
            record("c", 300, "site-1"),
        ];

        let page = page(
            candidates,
            &site("site-1"),
            &SyncCursor::initial(10),
            &"dev".to_string(),
            false,
        )
        .unwrap();

        let uuids: Vec<_> = page.records.iter().map(|r| r.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["a", "c"]);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn sorts_by_last_modified_then_uuid() {
        let candidates = vec![
            record("b", 200, "site-1"),
            record("c", 100, "site-1"),
            record("a", 200, "site-1"),
        ];

        let page = page(
            candidates,
            &site("site-1"),
            &SyncCursor::initial(10),
            &"dev".to_string(),
            false,
        )
        .unwrap();

        let uuids: Vec<_> = page.records.iter().map(|r| r.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["c", "a", "b"]);
    }

    #[test]
    fn optimize_excludes_device_own_records() {
        let device = "tablet-1".to_string();
        let candidates = vec![
            record("a", 100, "site-1").from_device("tablet-1"),
            record("b", 200, "site-1").from_device("tablet-2"),
            record("c", 300, "site-1"),
        ];

        let page = page(
            candidates.clone(),
            &site("site-1"),
            &SyncCursor::initial(10),
            &device,
            true,
        )
        .unwrap();
        let uuids: Vec<_> = page.records.iter().map(|r| r.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["b", "c"]);

        // optimize off: device-own records are included
        let page = page_off(candidates, &device);
        assert_eq!(page.records.len(), 3);
    }

    fn page_off(candidates: Vec<SyncRecord>, device: &DeviceId) -> Page {
        page(
            candidates,
            &site("site-1"),
            &SyncCursor::initial(10),
            device,
            false,
        )
        .unwrap()
    }

    #[test]
    fn tie_break_across_page_boundary() {
        // a and b share a timestamp; the boundary falls between them.
        let candidates = vec![record("a", 100, "site-1"), record("b", 100, "site-1")];

        let first = page(
            candidates.clone(),
            &site("site-1"),
            &SyncCursor::initial(1),
            &"dev".to_string(),
            false,
        )
        .unwrap();
        assert_eq!(first.records[0].uuid, "a");

        let next_cursor = first.next_cursor.unwrap();
        let second = page(
            candidates,
            &site("site-1"),
            &next_cursor,
            &"dev".to_string(),
            false,
        )
        .unwrap();
        let uuids: Vec<_> = second.records.iter().map(|r| r.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["b"]);
        assert!(second.next_cursor.is_none());
    }

    #[test]
    fn entity_offset_skips_sorted_rows() {
        let candidates = vec![
            record("a", 100, "site-1"),
            record("b", 200, "site-1"),
            record("c", 300, "site-1"),
        ];
        let cursor = SyncCursor {
            entity_offset: 1,
            ..SyncCursor::initial(10)
        };

        let page = page(candidates, &site("site-1"), &cursor, &"dev".to_string(), false).unwrap();
        let uuids: Vec<_> = page.records.iter().map(|r| r.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["b", "c"]);
    }

    #[test]
    fn invalid_limit_is_rejected() {
        let result = page(
            vec![record("a", 100, "site-1")],
            &site("site-1"),
            &SyncCursor::initial(0),
            &"dev".to_string(),
            false,
        );
        assert!(matches!(result, Err(Error::InvalidCursor(_))));
    }

    #[test]
    fn exactly_full_final_page_signals_one_more_empty_page() {
        let candidates = vec![record("a", 100, "site-1"), record("b", 200, "site-1")];

        let first = page(
            candidates.clone(),
            &site("site-1"),
            &SyncCursor::initial(2),
            &"dev".to_string(),
            false,
        )
        .unwrap();
        assert_eq!(first.records.len(), 2);
        let next_cursor = first.next_cursor.expect("full page advances");

        let second = page(
            candidates,
            &site("site-1"),
            &next_cursor,
            &"dev".to_string(),
            false,
        )
        .unwrap();
        assert!(second.records.is_empty());
        assert!(second.next_cursor.is_none());
    }
}

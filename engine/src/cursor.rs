//! Resumable sync cursor.
//!
//! Paging is ordered by `(last_modified, uuid)`. Timestamps have coarse
//! granularity and collide freely under bulk imports, so a cursor carries
//! both the boundary timestamp and the set of uuids already delivered at
//! that exact timestamp. A plain `>` bound would skip records written in
//! the same instant as the boundary; a plain `>=` bound without the uuid
//! set would resend them forever.

use crate::{error::Result, Error, SyncRecord, Timestamp, Uuid};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default page size when a client does not ask for one.
pub const DEFAULT_LIMIT: i64 = 100;

/// Largest page size a client may ask for.
pub const MAX_LIMIT: i64 = 1000;

/// Position in the sorted delta stream for one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCursor {
    /// Inclusive lower bound on last-modified time; `None` on initial sync.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_offset: Option<Timestamp>,
    /// Plain row offset applied after sorting; legacy clients page with it
    /// inside a single snapshot. Defaults to zero and is never advanced by
    /// the engine.
    #[serde(default)]
    pub entity_offset: u64,
    /// Maximum records per page.
    pub limit: i64,
    /// Uuids already delivered at exactly `last_modified_offset`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuids_at_offset: Option<BTreeSet<Uuid>>,
}

impl SyncCursor {
    /// A cursor at the start of the stream.
    pub fn initial(limit: i64) -> Self {
        Self {
            last_modified_offset: None,
            entity_offset: 0,
            limit,
            uuids_at_offset: None,
        }
    }

    /// Reject cursors the engine cannot page with.
    pub fn validate(&self) -> Result<()> {
        if self.limit <= 0 {
            return Err(Error::InvalidCursor(format!(
                "limit must be positive, got {}",
                self.limit
            )));
        }
        Ok(())
    }

    /// Whether a record lies past this cursor.
    ///
    /// Records before the boundary timestamp are out; records exactly at
    /// the boundary are in unless their uuid was already delivered.
    pub fn admits(&self, record: &SyncRecord) -> bool {
        let Some(offset) = self.last_modified_offset else {
            return true;
        };
        if record.last_modified < offset {
            return false;
        }
        if record.last_modified == offset {
            if let Some(seen) = &self.uuids_at_offset {
                return !seen.contains(&record.uuid);
            }
        }
        true
    }

    /// Derive the cursor for the next page from a sorted, truncated page.
    ///
    /// A short page means the stream is exhausted and returns `None`
    /// (caught up). A full page moves the boundary to the last record's
    /// timestamp and collects the uuids delivered at that timestamp —
    /// keeping the previous boundary set when the boundary did not advance,
    /// so a run of collisions longer than one page stays duplicate-free.
    pub fn advance(&self, page: &[SyncRecord]) -> Option<SyncCursor> {
        let last = page.last()?;
        if (page.len() as i64) < self.limit {
            return None;
        }

        let boundary = last.last_modified;
        let mut uuids: BTreeSet<Uuid> = page
            .iter()
            .filter(|r| r.last_modified == boundary)
            .map(|r| r.uuid.clone())
            .collect();
        if self.last_modified_offset == Some(boundary) {
            if let Some(seen) = &self.uuids_at_offset {
                uuids.extend(seen.iter().cloned());
            }
        }

        Some(SyncCursor {
            last_modified_offset: Some(boundary),
            entity_offset: 0,
            limit: self.limit,
            uuids_at_offset: Some(uuids),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(uuid: &str, last_modified: Timestamp) -> SyncRecord {
        SyncRecord::new(uuid, last_modified, "site-1", json!({}))
    }

    #[test]
    fn initial_cursor_admits_everything() {
        let cursor = SyncCursor::initial(10);
        assert!(cursor.admits(&record("a", 0)));
        assert!(cursor.admits(&record("b", u64::MAX)));
    }

    #[test]
    fn validate_rejects_non_positive_limit() {
        assert!(SyncCursor::initial(0).validate().is_err());
        assert!(SyncCursor::initial(-5).validate().is_err());
        assert!(SyncCursor::initial(1).validate().is_ok());
    }

    #[test]
    fn boundary_is_inclusive_with_uuid_exclusion() {
        let cursor = SyncCursor {
            last_modified_offset: Some(1000),
            entity_offset: 0,
            limit: 2,
            uuids_at_offset: Some(BTreeSet::from(["a".to_string()])),
        };

        assert!(!cursor.admits(&record("x", 999)));
        assert!(!cursor.admits(&record("a", 1000))); // already delivered
        assert!(cursor.admits(&record("b", 1000))); // same instant, new uuid
        assert!(cursor.admits(&record("a", 1001))); // past the boundary
    }

    #[test]
    fn short_page_means_caught_up() {
        let cursor = SyncCursor::initial(3);
        let page = vec![record("a", 100), record("b", 200)];
        assert!(cursor.advance(&page).is_none());

        let empty: Vec<SyncRecord> = vec![];
        assert!(cursor.advance(&empty).is_none());
    }

    #[test]
    fn full_page_carries_boundary_uuids() {
        let cursor = SyncCursor::initial(2);
        let page = vec![record("a", 100), record("b", 200)];

        let next = cursor.advance(&page).unwrap();
        assert_eq!(next.last_modified_offset, Some(200));
        assert_eq!(
            next.uuids_at_offset,
            Some(BTreeSet::from(["b".to_string()]))
        );
        assert_eq!(next.limit, 2);
    }

    #[test]
    fn colliding_page_collects_all_boundary_uuids() {
        let cursor = SyncCursor::initial(3);
        let page = vec![record("a", 100), record("b", 100), record("c", 100)];

        let next = cursor.advance(&page).unwrap();
        assert_eq!(next.last_modified_offset, Some(100));
        assert_eq!(
            next.uuids_at_offset,
            Some(BTreeSet::from([
                "a".to_string(),
                "b".to_string(),
                "c".to_string()
            ]))
        );
    }

    #[test]
    fn stationary_boundary_retains_previous_uuids() {
        // Page 2 of a collision run longer than one page: the boundary
        // timestamp does not move, so page 1's uuids must survive.
        let cursor = SyncCursor {
            last_modified_offset: Some(100),
            entity_offset: 0,
            limit: 2,
            uuids_at_offset: Some(BTreeSet::from(["a".to_string(), "b".to_string()])),
        };
        let page = vec![record("c", 100), record("d", 100)];

        let next = cursor.advance(&page).unwrap();
        assert_eq!(
            next.uuids_at_offset,
            Some(BTreeSet::from([
                "a".to_string(),
                "b".to_string(),
                "c".to_string(),
                "d".to_string()
            ]))
        );
    }

    #[test]
    fn advancing_boundary_drops_stale_uuids() {
        let cursor = SyncCursor {
            last_modified_offset: Some(100),
            entity_offset: 0,
            limit: 2,
            uuids_at_offset: Some(BTreeSet::from(["a".to_string()])),
        };
        let page = vec![record("b", 100), record("c", 300)];

        let next = cursor.advance(&page).unwrap();
        assert_eq!(next.last_modified_offset, Some(300));
        assert_eq!(
            next.uuids_at_offset,
            Some(BTreeSet::from(["c".to_string()]))
        );
    }

    #[test]
    fn serialization_roundtrip() {
        let cursor = SyncCursor {
            last_modified_offset: Some(1706745600000),
            entity_offset: 0,
            limit: 50,
            uuids_at_offset: Some(BTreeSet::from(["p-1".to_string()])),
        };
        let json = serde_json::to_string(&cursor).unwrap();
        assert!(json.contains("lastModifiedOffset"));
        assert!(json.contains("uuidsAtOffset"));

        let parsed: SyncCursor = serde_json::from_str(&json).unwrap();
        assert_eq!(cursor, parsed);
    }

    #[test]
    fn initial_cursor_wire_form_is_minimal() {
        let json = serde_json::to_string(&SyncCursor::initial(100)).unwrap();
        assert_eq!(json, r#"{"entityOffset":0,"limit":100}"#);

        // Absent fields deserialize to defaults
        let parsed: SyncCursor = serde_json::from_str(r#"{"limit":100}"#).unwrap();
        assert_eq!(parsed, SyncCursor::initial(100));
    }
}

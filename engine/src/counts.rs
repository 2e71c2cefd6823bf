//! Per-entity-type totals for a location set.
//!
//! Clients use these to display sync progress without pulling every
//! record. The membership predicate is the same location filter the query
//! engine uses, so counts and paged data always agree; the cursor plays
//! no part here.

use crate::{DeviceId, EntityKind, LocationId, SyncCounts, SyncRecord};
use std::collections::BTreeSet;

/// Count records of one kind within a location set.
///
/// `ignored_count` — how many records the optimize pass will skip — is
/// reported only for kinds with an origin-device attribute and only when
/// optimize is on; otherwise the field stays absent rather than zero.
pub fn counts<'a>(
    candidates: impl IntoIterator<Item = &'a SyncRecord>,
    locations: &BTreeSet<LocationId>,
    kind: EntityKind,
    device_id: &DeviceId,
    optimize: bool,
) -> SyncCounts {
    let mut active_count = 0u64;
    let mut voided_count = 0u64;
    let mut device_own = 0u64;

    for record in candidates {
        if !record.in_locations(locations) {
            continue;
        }
        if record.voided {
            voided_count += 1;
        } else {
            active_count += 1;
        }
        if record.originates_from(device_id) {
            device_own += 1;
        }
    }

    let ignored_count = if optimize && kind.supports_device_exclusion() {
        Some(device_own)
    } else {
        None
    };

    SyncCounts {
        total: active_count + voided_count,
        active_count,
        voided_count,
        ignored_count,
    }
}

//! # Outpost Engine
//!
//! The incremental pull-sync core for Outpost: offline mobile devices
//! pull deltas of participant, visit, biometric-template, and image
//! records from a central store, scoped to a set of locations, without
//! re-transferring unchanged data and without re-receiving their own
//! writes.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine knows nothing about databases, files, or HTTP;
//!   backing stores come in through traits and plain data
//! - **Deterministic**: the same candidates and cursor always produce the
//!   same page
//! - **One direction**: sync is strictly server-to-device; there is no
//!   conflict resolution because there are no concurrent writes to merge
//!
//! ## Core Concepts
//!
//! ### Scope
//!
//! A request is restricted to a set of locations, named as a single site,
//! a cluster within a country, or a whole country. [`LocationIndex`]
//! expands a [`SyncScope`] into concrete location ids.
//!
//! ### Cursor
//!
//! Pages are ordered by `(last_modified, uuid)`. A [`SyncCursor`] carries
//! the boundary timestamp plus the uuids already delivered at that exact
//! timestamp, so colliding timestamps cause neither omissions nor
//! duplicates. A short page means the device is caught up.
//!
//! ### Optimize
//!
//! With `optimize` on, records that originated on the requesting device
//! are excluded — the device already holds its own writes. The
//! [`counts::counts`] aggregator reports how many records that skips.
//!
//! ### Voided
//!
//! Deletion is a soft flag. Voided records sync as DELETE events; rows are
//! never physically removed, so a delta can always express "drop this".
//!
//! ## Quick Start
//!
//! ```rust
//! use outpost_engine::{
//!     assemble, counts, EntityKind, Location, LocationIndex, SyncCursor,
//!     SyncRecord, SyncRequest, SyncScope,
//! };
//! use serde_json::json;
//!
//! let index = LocationIndex::new(vec![Location::new("site-1", "Belgium")]);
//! let scope = SyncScope::Site { site: "site-1".into() };
//! let locations = index.resolve(&scope).unwrap();
//!
//! let records = vec![
//!     SyncRecord::new("p-1", 1000, "site-1", json!({"name": "Alice"})),
//!     SyncRecord::new("p-2", 2000, "site-1", json!({"name": "Bob"})).voided(),
//! ];
//!
//! let request = SyncRequest {
//!     scope,
//!     cursor: SyncCursor::initial(100),
//!     device_id: "tablet-1".into(),
//!     optimize: false,
//! };
//! let counts = counts::counts(
//!     &records, &locations, EntityKind::Participant, &request.device_id, false,
//! );
//! let envelope = assemble::assemble(
//!     EntityKind::Participant, &request, &locations, records, counts, None,
//! ).unwrap();
//!
//! assert_eq!(envelope.records.len(), 2);
//! assert!(envelope.next_cursor.is_none()); // caught up
//! ```

pub mod assemble;
pub mod counts;
pub mod cursor;
pub mod error;
pub mod fields;
pub mod image;
pub mod ledger;
pub mod page;
pub mod record;
pub mod scope;

// Re-export main types at crate root
pub use assemble::{SyncRequest, SyncResponseEnvelope};
pub use cursor::{SyncCursor, DEFAULT_LIMIT, MAX_LIMIT};
pub use error::Error;
pub use fields::AddressFieldMap;
pub use image::{ImageStore, MemoryImageStore, TimestampSource};
pub use ledger::{ErrorLedger, SyncError};
pub use page::Page;
pub use record::{EntityKind, EventType, SyncCounts, SyncRecord, TypedEvent};
pub use scope::{Location, LocationIndex, ScopeParams, SyncScope};

/// Type aliases for clarity
pub type LocationId = String;
pub type DeviceId = String;
pub type Uuid = String;
pub type ErrorKey = String;
pub type Timestamp = u64;

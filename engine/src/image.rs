//! Image sync: reconciling the blob store with participant state.
//!
//! Image deletion is modeled at the participant level (a voided
//! participant means "drop the image"), while the blob store remains
//! authoritative for the bytes. Emitting events therefore needs both
//! sources.

use crate::{error::Result, SyncRecord, Timestamp, TypedEvent};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::collections::HashMap;

/// Content-addressed image storage keyed by participant uuid.
///
/// Implementations map IO failures to [`Error::Unavailable`] so callers
/// can retry the page with the same cursor.
pub trait ImageStore {
    fn exists(&self, uuid: &str) -> Result<bool>;
    fn read(&self, uuid: &str) -> Result<Option<Vec<u8>>>;
    fn last_modified(&self, uuid: &str) -> Result<Option<Timestamp>>;
}

/// Which clock an UPDATE event carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    /// The participant record's last-modified time (server-driven sync).
    Record,
    /// The image file's modification time (local-directory sync tooling).
    File,
}

/// Emit update-or-delete image events for a page of participants.
///
/// Per participant: voided emits DELETE whether or not a file exists; an
/// active participant with no file emits nothing (absence pre-dates
/// registration, it is not a deletion); otherwise the file's bytes are
/// base64-encoded into an UPDATE.
pub fn image_events(
    participants: &[SyncRecord],
    store: &dyn ImageStore,
    timestamps: TimestampSource,
) -> Result<Vec<TypedEvent>> {
    let mut events = Vec::with_capacity(participants.len());

    for participant in participants {
        if participant.voided {
            events.push(TypedEvent::delete(
                participant.uuid.clone(),
                participant.last_modified,
            ));
            continue;
        }

        let Some(bytes) = store.read(&participant.uuid)? else {
            continue;
        };

        let last_modified = match timestamps {
            TimestampSource::Record => participant.last_modified,
            TimestampSource::File => store
                .last_modified(&participant.uuid)?
                .unwrap_or(participant.last_modified),
        };

        events.push(TypedEvent::update(
            participant.uuid.clone(),
            last_modified,
            serde_json::Value::String(BASE64.encode(&bytes)),
        ));
    }

    Ok(events)
}

/// In-memory image store for tests and embedded use.
#[derive(Debug, Clone, Default)]
pub struct MemoryImageStore {
    files: HashMap<String, (Vec<u8>, Timestamp)>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store image bytes for a participant.
    pub fn insert(&mut self, uuid: impl Into<String>, bytes: Vec<u8>, modified_at: Timestamp) {
        self.files.insert(uuid.into(), (bytes, modified_at));
    }
}

impl ImageStore for MemoryImageStore {
    fn exists(&self, uuid: &str) -> Result<bool> {
        Ok(self.files.contains_key(uuid))
    }

    fn read(&self, uuid: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.files.get(uuid).map(|(bytes, _)| bytes.clone()))
    }

    fn last_modified(&self, uuid: &str) -> Result<Option<Timestamp>> {
        Ok(self.files.get(uuid).map(|(_, modified)| *modified))
    }
}

/// An image store that always fails, for exercising retry paths.
#[cfg(test)]
pub(crate) struct BrokenImageStore;

#[cfg(test)]
impl ImageStore for BrokenImageStore {
    fn exists(&self, _uuid: &str) -> Result<bool> {
        Err(crate::Error::Unavailable("image volume offline".into()))
    }

    fn read(&self, _uuid: &str) -> Result<Option<Vec<u8>>> {
        Err(crate::Error::Unavailable("image volume offline".into()))
    }

    fn last_modified(&self, _uuid: &str) -> Result<Option<Timestamp>> {
        Err(crate::Error::Unavailable("image volume offline".into()))
    }
}

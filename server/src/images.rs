//! Filesystem-backed image store.
//!
//! Images are content-addressed by participant uuid as `<uuid>.jpg` under
//! one directory. The engine treats this through its [`ImageStore`] trait;
//! IO failures other than "no such file" surface as transient errors so
//! the device retries the page with the same cursor.

use outpost_engine::{error::Result as EngineResult, Error, ImageStore, Timestamp};
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Image store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path for a participant's image. Uuids containing path separators
    /// are never looked up.
    fn path_for(&self, uuid: &str) -> Option<PathBuf> {
        if uuid.is_empty() || uuid.contains(['/', '\\']) || uuid.contains("..") {
            return None;
        }
        Some(self.root.join(format!("{uuid}.jpg")))
    }
}

fn map_io(err: io::Error, path: &Path) -> Error {
    Error::Unavailable(format!("image store: {}: {err}", path.display()))
}

impl ImageStore for FsImageStore {
    fn exists(&self, uuid: &str) -> EngineResult<bool> {
        match self.path_for(uuid) {
            Some(path) => Ok(path.is_file()),
            None => Ok(false),
        }
    }

    fn read(&self, uuid: &str) -> EngineResult<Option<Vec<u8>>> {
        let Some(path) = self.path_for(uuid) else {
            return Ok(None);
        };
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(map_io(err, &path)),
        }
    }

    fn last_modified(&self, uuid: &str) -> EngineResult<Option<Timestamp>> {
        let Some(path) = self.path_for(uuid) else {
            return Ok(None);
        };
        match std::fs::metadata(&path) {
            Ok(metadata) => {
                let modified = metadata.modified().map_err(|e| map_io(e, &path))?;
                let millis = modified
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis() as Timestamp)
                    .unwrap_or(0);
                Ok(Some(millis))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(map_io(err, &path)),
        }
    }
}

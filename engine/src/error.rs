//! Error types for the Outpost engine.

use crate::{DeviceId, ErrorKey, LocationId};
use thiserror::Error;

/// All possible errors from the Outpost engine.
///
/// The taxonomy mirrors how callers are expected to react:
/// not-found and invalid-argument errors are terminal for a request,
/// while [`Error::Unavailable`] is safe to retry with the same cursor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Not-found errors
    #[error("site not found: {0}")]
    SiteNotFound(LocationId),

    #[error("no unresolved sync error for device '{device_id}' with keys: {keys:?}")]
    UnknownErrorKeys {
        device_id: DeviceId,
        keys: Vec<ErrorKey>,
    },

    // Invalid-argument errors
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("invalid scope: {0}")]
    InvalidScope(String),

    #[error("unknown address field: {0}")]
    UnknownAddressField(String),

    // Transient errors
    #[error("backing store unavailable: {0}")]
    Unavailable(String),
}

impl Error {
    /// Whether retrying the same request with the same cursor can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Unavailable(_))
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::SiteNotFound("site-9".into());
        assert_eq!(err.to_string(), "site not found: site-9");

        let err = Error::InvalidCursor("limit must be positive, got 0".into());
        assert_eq!(
            err.to_string(),
            "invalid cursor: limit must be positive, got 0"
        );
    }

    #[test]
    fn transient_classification() {
        assert!(Error::Unavailable("connection refused".into()).is_transient());
        assert!(!Error::SiteNotFound("site-1".into()).is_transient());
        assert!(!Error::InvalidScope("empty".into()).is_transient());
    }
}

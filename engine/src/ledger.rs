//! Sync error ledger.
//!
//! Devices report sync failures here and later mark them resolved. The
//! ledger is an error log, not a set: duplicate reports append duplicate
//! entries, and nothing is ever physically deleted (audit trail).

use crate::{error::Result, DeviceId, Error, ErrorKey, Timestamp};
use serde::{Deserialize, Serialize};

/// A sync failure reported by a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncError {
    pub device_id: DeviceId,
    pub key: ErrorKey,
    pub stack_trace: String,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
    pub resolved: bool,
}

/// In-memory ledger of device-reported sync errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLedger {
    entries: Vec<SyncError>,
}

impl ErrorLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new unresolved error.
    pub fn record(
        &mut self,
        device_id: impl Into<DeviceId>,
        key: impl Into<ErrorKey>,
        stack_trace: impl Into<String>,
        metadata: serde_json::Value,
        created_at: Timestamp,
    ) {
        self.entries.push(SyncError {
            device_id: device_id.into(),
            key: key.into(),
            stack_trace: stack_trace.into(),
            metadata,
            created_at,
            resolved: false,
        });
    }

    /// Mark every unresolved error for `device_id` whose key is in `keys`
    /// as resolved. All-or-nothing: if any key has no matching unresolved
    /// entry, nothing is marked and the unmatched keys are reported.
    ///
    /// Returns the number of entries marked.
    pub fn resolve(&mut self, device_id: &str, keys: &[ErrorKey]) -> Result<usize> {
        let unmatched: Vec<ErrorKey> = keys
            .iter()
            .filter(|key| {
                !self
                    .entries
                    .iter()
                    .any(|e| e.device_id == device_id && e.key == **key && !e.resolved)
            })
            .cloned()
            .collect();

        if !unmatched.is_empty() {
            return Err(Error::UnknownErrorKeys {
                device_id: device_id.to_string(),
                keys: unmatched,
            });
        }

        let mut marked = 0;
        for entry in &mut self.entries {
            if entry.device_id == device_id && !entry.resolved && keys.contains(&entry.key) {
                entry.resolved = true;
                marked += 1;
            }
        }
        Ok(marked)
    }

    /// Unresolved errors for one device, oldest first.
    pub fn unresolved_for(&self, device_id: &str) -> Vec<&SyncError> {
        self.entries
            .iter()
            .filter(|e| e.device_id == device_id && !e.resolved)
            .collect()
    }

    /// Every entry ever recorded, resolved or not.
    pub fn all(&self) -> &[SyncError] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_then_resolve() {
        let mut ledger = ErrorLedger::new();
        ledger.record("d1", "k1", "trace", json!({"page": 3}), 1000);

        assert_eq!(ledger.unresolved_for("d1").len(), 1);

        let marked = ledger.resolve("d1", &["k1".to_string()]).unwrap();
        assert_eq!(marked, 1);
        assert!(ledger.unresolved_for("d1").is_empty());

        // Audit trail: the entry still exists, just resolved
        assert_eq!(ledger.all().len(), 1);
        assert!(ledger.all()[0].resolved);
    }

    #[test]
    fn duplicate_reports_append() {
        let mut ledger = ErrorLedger::new();
        ledger.record("d1", "k1", "trace", json!({}), 1000);
        ledger.record("d1", "k1", "trace", json!({}), 2000);

        assert_eq!(ledger.unresolved_for("d1").len(), 2);

        // Resolving the key marks both duplicates
        let marked = ledger.resolve("d1", &["k1".to_string()]).unwrap();
        assert_eq!(marked, 2);
    }

    #[test]
    fn resolve_unknown_key_fails() {
        let mut ledger = ErrorLedger::new();
        ledger.record("d1", "k1", "trace", json!({}), 1000);

        let result = ledger.resolve("d1", &["k1".to_string(), "k2".to_string()]);
        assert!(matches!(result, Err(Error::UnknownErrorKeys { .. })));

        // All-or-nothing: k1 stays unresolved
        assert_eq!(ledger.unresolved_for("d1").len(), 1);
    }

    #[test]
    fn errors_are_partitioned_by_device() {
        let mut ledger = ErrorLedger::new();
        ledger.record("d1", "k1", "trace", json!({}), 1000);
        ledger.record("d2", "k1", "trace", json!({}), 1000);

        ledger.resolve("d1", &["k1".to_string()]).unwrap();

        assert!(ledger.unresolved_for("d1").is_empty());
        assert_eq!(ledger.unresolved_for("d2").len(), 1);
    }

    #[test]
    fn resolving_twice_fails_second_time() {
        let mut ledger = ErrorLedger::new();
        ledger.record("d1", "k1", "trace", json!({}), 1000);

        ledger.resolve("d1", &["k1".to_string()]).unwrap();
        let again = ledger.resolve("d1", &["k1".to_string()]);
        assert!(matches!(again, Err(Error::UnknownErrorKeys { .. })));
    }
}

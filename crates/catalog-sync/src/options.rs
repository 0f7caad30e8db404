use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a run copies every item or only what changed since the last run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    #[default]
    Full,
    Incremental,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => f.write_str("full"),
            Self::Incremental => f.write_str("incremental"),
        }
    }
}

/// Per-run settings applied to a fresh execution.
///
/// Defaults match a sample-data import: no job logs persisted, unchanged
/// items skipped, full-version sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Ask the job runner to persist its log to the platform store.
    pub persist_to_store: bool,
    /// Ask the job runner to persist its log to a file.
    pub persist_to_file: bool,
    /// Copy items even when they are unchanged in the target.
    pub force_update: bool,
    pub mode: SyncMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_all_off_and_full() {
        let options = SyncOptions::default();
        assert!(!options.persist_to_store);
        assert!(!options.persist_to_file);
        assert!(!options.force_update);
        assert_eq!(options.mode, SyncMode::Full);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let options: SyncOptions =
            serde_json::from_str(r#"{"force_update": true, "mode": "incremental"}"#).unwrap();
        assert!(options.force_update);
        assert!(!options.persist_to_store);
        assert_eq!(options.mode, SyncMode::Incremental);
    }
}

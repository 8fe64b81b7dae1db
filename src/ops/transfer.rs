//! Export and import of journal data.
//!
//! An export is a JSON document holding every mood, vent and Psalm response key
//! with its raw stored value:
//!
//! ```json
//! {"version": 1, "exportedAt": "2024-03-05T12:00:00.000Z", "data": {"devotions-mood-2024-03-05": "baseline"}}
//! ```
//!
//! Import merges such a document back key by key (last write wins), so
//! importing the same document twice leaves the store unchanged. Keys outside
//! the journal prefixes, such as the PIN digest or the unlock flag, never leave
//! or enter the store through this path.

use crate::calendar::{Clock, DateKey};
use crate::constants::{EXPORT_FILE_PREFIX, EXPORT_PREFIXES, EXPORT_VERSION};
use crate::errors::{AppResult, TransferError};
use crate::store::KeyValueStore;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A portable snapshot of the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedDocument {
    pub version: u64,
    pub exported_at: String,
    pub data: BTreeMap<String, String>,
}

/// Whether `key` belongs to the journal data that may be exported or imported.
pub fn is_exportable_key(key: &str) -> bool {
    EXPORT_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

/// Snapshot every journal key in `store`.
///
/// Returns `None` only when the store cannot be enumerated at all.
pub fn export_all<S: KeyValueStore, C: Clock>(store: &S, clock: &C) -> Option<ExportedDocument> {
    let entries = match store.entries() {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Export failed, store unavailable: {}", e);
            return None;
        }
    };

    let data: BTreeMap<String, String> = entries
        .into_iter()
        .filter(|(key, _)| is_exportable_key(key))
        .collect();
    debug!("Exporting {} keys", data.len());

    Some(ExportedDocument {
        version: EXPORT_VERSION,
        exported_at: clock.now().to_rfc3339_opts(SecondsFormat::Millis, true),
        data,
    })
}

fn has_supported_version(document: &Value) -> bool {
    // 1 and 1.0 are the same JSON number
    document
        .get("version")
        .and_then(Value::as_f64)
        .map_or(false, |version| version == EXPORT_VERSION as f64)
}

/// Merge an export document into `store`, returning how many keys were written.
///
/// Anything that isn't a version 1 document with an object under `data` writes
/// nothing and returns 0. Inside a valid document, entries whose key has no
/// journal prefix or whose value isn't a string are skipped. A store failure
/// stops the import; keys written before it stay written.
pub fn import_all<S: KeyValueStore>(store: &S, document: &Value) -> usize {
    if !has_supported_version(document) {
        debug!("Import rejected: unsupported or missing version");
        return 0;
    }
    let Some(data) = document.get("data").and_then(Value::as_object) else {
        debug!("Import rejected: data is not an object");
        return 0;
    };

    let mut written = 0;
    for (key, value) in data {
        let Some(value) = value.as_str() else {
            continue;
        };
        if !is_exportable_key(key) {
            debug!("Skipping foreign key {}", key);
            continue;
        }
        if let Err(e) = store.set(key, value) {
            warn!("Import stopped after {} keys: {}", written, e);
            break;
        }
        written += 1;
    }

    info!("Imported {} keys", written);
    written
}

/// Parse raw file contents into a JSON document for [`import_all`].
pub fn parse_document(text: &str) -> Result<Value, TransferError> {
    serde_json::from_str(text).map_err(TransferError::InvalidFile)
}

/// Name of the export file written on `date`.
pub fn export_file_name(date: DateKey) -> String {
    format!("{}{}.json", EXPORT_FILE_PREFIX, date)
}

/// Write `document` into `dir`, named after `date`. Returns the file path.
pub fn write_export(document: &ExportedDocument, dir: &Path, date: DateKey) -> AppResult<PathBuf> {
    let path = dir.join(export_file_name(date));
    let body = serde_json::to_string_pretty(document).map_err(crate::errors::StorageError::from)?;
    fs::write(&path, body).map_err(|source| TransferError::Write {
        path: path.clone(),
        source,
    })?;

    // The export holds the whole journal in the clear.
    #[cfg(unix)]
    {
        use crate::constants::DEFAULT_FILE_PERMISSIONS;
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(DEFAULT_FILE_PERMISSIONS))?;
    }
    info!("Wrote export to {:?}", path);
    Ok(path)
}

/// What an import did, phrased for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported(usize),
    NoValidEntries,
}

impl ImportOutcome {
    pub fn from_count(count: usize) -> Self {
        if count == 0 {
            ImportOutcome::NoValidEntries
        } else {
            ImportOutcome::Imported(count)
        }
    }
}

impl fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportOutcome::Imported(n) => write!(f, "Imported {} entries", n),
            ImportOutcome::NoValidEntries => write!(f, "No valid entries in file"),
        }
    }
}

/// Read, parse and import the file at `path`.
///
/// # Errors
///
/// Returns `TransferError::InvalidFile` when the file isn't JSON and
/// `AppError::Io` when it can't be read.
pub fn import_file<S: KeyValueStore>(store: &S, path: &Path) -> AppResult<ImportOutcome> {
    let text = fs::read_to_string(path)?;
    let document = parse_document(&text)?;
    Ok(ImportOutcome::from_count(import_all(store, &document)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::FixedClock;
    use crate::errors::{AppError, StorageError};
    use crate::store::{MemoryStore, StoreResult};
    use chrono::NaiveDate;
    use serde_json::json;
    use tempfile::tempdir;

    fn clock() -> FixedClock {
        FixedClock::at(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
    }

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.set("devotions-mood-2024-03-05", "baseline").unwrap();
        store.set("devotions-vent-2024-03-05", "tired but here").unwrap();
        store
            .set("devotions-psalm-23", r#"{"prayer":"p","reflection":"r"}"#)
            .unwrap();
        store.set("devotions-pin-hash", "deadbeef").unwrap();
        store
    }

    struct UnlistableStore;

    impl KeyValueStore for UnlistableStore {
        fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            Ok(None)
        }
        fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
            Err(StorageError::Unavailable("quota".to_string()))
        }
        fn remove(&self, _key: &str) -> StoreResult<()> {
            Ok(())
        }
        fn entries(&self) -> StoreResult<Vec<(String, String)>> {
            Err(StorageError::Unavailable("no storage".to_string()))
        }
    }

    #[test]
    fn test_export_keeps_only_journal_keys() {
        let document = export_all(&seeded_store(), &clock()).unwrap();

        assert_eq!(document.version, 1);
        assert_eq!(document.exported_at, "2024-03-05T12:00:00.000Z");
        assert_eq!(document.data.len(), 3);
        assert!(!document.data.contains_key("devotions-pin-hash"));
    }

    #[test]
    fn test_export_of_empty_store_has_empty_data() {
        let document = export_all(&MemoryStore::new(), &clock()).unwrap();
        assert!(document.data.is_empty());
    }

    #[test]
    fn test_export_serializes_camel_case() {
        let document = export_all(&MemoryStore::new(), &clock()).unwrap();
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value, json!({"version": 1, "exportedAt": "2024-03-05T12:00:00.000Z", "data": {}}));
    }

    #[test]
    fn test_export_from_unavailable_store_is_none() {
        assert!(export_all(&UnlistableStore, &clock()).is_none());
    }

    #[test]
    fn test_reimport_leaves_store_unchanged() {
        let store = seeded_store();
        let before = store.snapshot();
        let document = serde_json::to_value(export_all(&store, &clock()).unwrap()).unwrap();

        assert_eq!(import_all(&store, &document), 3);
        assert_eq!(store.snapshot(), before);
        assert_eq!(import_all(&store, &document), 3);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_import_into_fresh_store_restores_entries() {
        let source = seeded_store();
        let document = serde_json::to_value(export_all(&source, &clock()).unwrap()).unwrap();

        let target = MemoryStore::new();
        assert_eq!(import_all(&target, &document), 3);
        assert_eq!(
            target.get("devotions-vent-2024-03-05").unwrap().as_deref(),
            Some("tired but here")
        );
        assert!(target.get("devotions-pin-hash").unwrap().is_none());
    }

    #[test]
    fn test_wrong_version_imports_nothing() {
        let store = MemoryStore::new();
        let document = json!({"version": 2, "data": {"devotions-mood-2024-01-01": "mania"}});

        assert_eq!(import_all(&store, &document), 0);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_foreign_keys_are_skipped() {
        let store = MemoryStore::new();
        let document = json!({
            "version": 1,
            "data": {"devotions-mood-2024-01-01": "mania", "evil-key": "x"}
        });

        assert_eq!(import_all(&store, &document), 1);
        assert_eq!(store.snapshot().len(), 1);
        assert!(store.get("evil-key").unwrap().is_none());
    }

    #[test]
    fn test_unlock_flag_and_pin_hash_cannot_be_imported() {
        let store = MemoryStore::new();
        let document = json!({
            "version": 1,
            "data": {"devotions-unlocked": "1", "devotions-pin-hash": "00"}
        });
        assert_eq!(import_all(&store, &document), 0);
    }

    #[test]
    fn test_malformed_shapes_import_nothing() {
        let store = MemoryStore::new();
        for document in [
            json!(null),
            json!([1, 2, 3]),
            json!("version 1"),
            json!({"version": 1}),
            json!({"version": 1, "data": ["devotions-mood-2024-01-01"]}),
            json!({"version": "1", "data": {"devotions-mood-2024-01-01": "mania"}}),
        ] {
            assert_eq!(import_all(&store, &document), 0, "{}", document);
        }
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_non_string_values_are_skipped() {
        let store = MemoryStore::new();
        let document = json!({
            "version": 1.0,
            "data": {"devotions-mood-2024-01-01": 3, "devotions-vent-2024-01-01": "ok"}
        });
        assert_eq!(import_all(&store, &document), 1);
    }

    #[test]
    fn test_import_stops_when_store_rejects_writes() {
        let document = json!({"version": 1, "data": {"devotions-mood-2024-01-01": "mania"}});
        assert_eq!(import_all(&UnlistableStore, &document), 0);
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(ImportOutcome::from_count(0).to_string(), "No valid entries in file");
        assert_eq!(ImportOutcome::from_count(1).to_string(), "Imported 1 entries");
        assert_eq!(ImportOutcome::from_count(4).to_string(), "Imported 4 entries");
    }

    #[test]
    fn test_write_and_import_file() {
        let dir = tempdir().unwrap();
        let today = DateKey::new(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        let document = export_all(&seeded_store(), &clock()).unwrap();

        let path = write_export(&document, dir.path(), today).unwrap();
        assert!(path.ends_with("devotions-export-2024-03-05.json"));

        let target = MemoryStore::new();
        assert_eq!(import_file(&target, &path).unwrap(), ImportOutcome::Imported(3));
    }

    #[test]
    fn test_unparseable_file_is_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "version: 1").unwrap();

        let err = import_file(&MemoryStore::new(), &path).unwrap_err();
        assert!(matches!(err, AppError::Transfer(TransferError::InvalidFile(_))));
        assert_eq!(err.to_string(), "Invalid file");
    }
}

//! Session-scoped storage.
//!
//! The session file lives in a per-user runtime directory (RAM-backed when one
//! is available) and ends with the login session or after a period of
//! inactivity, whichever comes first. An ended session reads as empty.
//!
//! Each journal database gets its own session file, so unlocking one journal
//! says nothing about another.

use super::{KeyValueStore, StoreResult};
use crate::constants::{
    ENV_VAR_USER, ENV_VAR_XDG_RUNTIME_DIR, SESSION_FILE, SESSION_FILE_EXTENSION,
    SESSION_FILE_PREFIX, SESSION_KEY_HEX_LEN, SESSION_SUBDIR, TMPFS_PATHS,
};
use crate::errors::StorageError;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Name of the shared-directory fallback, made unique per user.
fn per_user_subdir() -> String {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        // /proc/self is owned by the uid of the running process.
        if let Ok(metadata) = fs::metadata("/proc/self") {
            return format!("{}-{}", SESSION_SUBDIR, metadata.uid());
        }
    }
    match env::var(ENV_VAR_USER) {
        Ok(user) if !user.is_empty() && !user.contains(['/', '\\']) => {
            format!("{}-{}", SESSION_SUBDIR, user)
        }
        _ => SESSION_SUBDIR.to_string(),
    }
}

/// Picks the directory for the session file.
///
/// Preference order: `$XDG_RUNTIME_DIR`, `/dev/shm`, `/run/shm`, then the
/// system temp directory. The shared fallbacks get a per-user sub-directory.
pub fn default_session_dir() -> PathBuf {
    if let Ok(runtime_dir) = env::var(ENV_VAR_XDG_RUNTIME_DIR) {
        let runtime_dir = PathBuf::from(runtime_dir);
        if runtime_dir.is_dir() {
            return runtime_dir.join(SESSION_SUBDIR);
        }
    }

    TMPFS_PATHS
        .iter()
        .map(Path::new)
        .find(|path| path.is_dir())
        .map(Path::to_path_buf)
        .unwrap_or_else(env::temp_dir)
        .join(per_user_subdir())
}

/// Session file name for the journal database at `store_path`.
///
/// The name is derived from the canonical path, so two spellings of one
/// database share a session and two databases never do.
pub fn session_file_name(store_path: &Path) -> String {
    let canonical = fs::canonicalize(store_path).unwrap_or_else(|_| store_path.to_path_buf());
    let digest = blake3::hash(canonical.to_string_lossy().as_bytes()).to_hex();
    format!(
        "{}{}{}",
        SESSION_FILE_PREFIX,
        &digest.as_str()[..SESSION_KEY_HEX_LEN],
        SESSION_FILE_EXTENSION
    )
}

/// A small JSON map on disk that expires after `timeout` without writes.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
    timeout: Duration,
}

impl SessionFile {
    pub fn new(dir: &Path, timeout: Duration) -> Self {
        SessionFile {
            path: dir.join(SESSION_FILE),
            timeout,
        }
    }

    /// A session in `dir` that belongs to the journal database at `store_path`.
    pub fn for_store(dir: &Path, store_path: &Path, timeout: Duration) -> Self {
        SessionFile {
            path: dir.join(session_file_name(store_path)),
            timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn session_error(&self, source: io::Error) -> StorageError {
        StorageError::Session {
            path: self.path.clone(),
            source,
        }
    }

    fn is_expired(&self, metadata: &fs::Metadata) -> bool {
        metadata
            .modified()
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .map_or(false, |age| age >= self.timeout)
    }

    fn load(&self) -> StoreResult<BTreeMap<String, String>> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.session_error(e)),
        };

        if self.is_expired(&metadata) {
            debug!("Session expired, discarding {:?}", self.path);
            if let Err(e) = fs::remove_file(&self.path) {
                warn!("Failed to remove expired session file: {}", e);
            }
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| self.session_error(e))?;
        match serde_json::from_str(&content) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!("Ignoring unreadable session file: {}", e);
                Ok(BTreeMap::new())
            }
        }
    }

    fn save(&self, map: &BTreeMap<String, String>) -> StoreResult<()> {
        if map.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(self.session_error(e)),
                _ => Ok(()),
            };
        }

        let dir = self
            .path
            .parent()
            .ok_or_else(|| StorageError::Unavailable("session path has no parent".to_string()))?;
        ensure_private_dir(dir).map_err(|e| self.session_error(e))?;

        // Write then rename so a reader never sees half a file.
        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| self.session_error(e))?;
        let body = serde_json::to_vec(map)?;
        temp.write_all(&body).map_err(|e| self.session_error(e))?;
        temp.persist(&self.path)
            .map_err(|e| self.session_error(e.error))?;
        Ok(())
    }
}

fn ensure_private_dir(dir: &Path) -> io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir)?;
    #[cfg(unix)]
    {
        use crate::constants::DEFAULT_DIR_PERMISSIONS;
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(DEFAULT_DIR_PERMISSIONS))?;
    }
    Ok(())
}

impl KeyValueStore for SessionFile {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut map = self.load()?;
        map.insert(key.to_string(), value.to_string());
        self.save(&map)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut map = self.load()?;
        if map.remove(key).is_some() {
            self.save(&map)?;
        }
        Ok(())
    }

    fn entries(&self) -> StoreResult<Vec<(String, String)>> {
        Ok(self.load()?.into_iter().collect())
    }
}

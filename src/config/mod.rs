//! Configuration management for the devotions application.
//!
//! This module handles loading and validating configuration settings from environment
//! variables, with sensible defaults.
//!
//! # Environment Variables
//!
//! - `DEVOTIONS_DIR`: Data directory (defaults to ~/.local/share/devotions)
//! - `DEVOTIONS_DB`: Database file (defaults to `<DEVOTIONS_DIR>/devotions.db`)
//! - `DEVOTIONS_PSALMS`: Psalm dataset (defaults to `<DEVOTIONS_DIR>/psalms.json`)
//! - `DEVOTIONS_EDITOR`: Editor used for vent text
//! - `EDITOR`: Fallback editor if DEVOTIONS_EDITOR is not set (defaults to "vim")
//! - `DEVOTIONS_SESSION_DIR`: Where the session file lives (defaults to a runtime dir)
//! - `DEVOTIONS_SESSION_TIMEOUT`: Minutes of inactivity before the gate re-locks (default 30)
//! - `DEVOTIONS_LOOKBACK_DAYS`: How far back the journal looks (default 730)
//! - `DEVOTIONS_TODAY`: Pins the current date, for reproducible runs

use crate::calendar::{Clock, DateKey, FixedClock, SystemClock};
use crate::constants::{
    DEFAULT_DATA_SUBDIR, DEFAULT_DB_FILE, DEFAULT_EDITOR_COMMAND, DEFAULT_PSALMS_FILE,
    DEFAULT_SESSION_TIMEOUT_MINUTES, EDITOR_FORBIDDEN_CHARS, ENV_VAR_DEVOTIONS_DB,
    ENV_VAR_DEVOTIONS_DIR, ENV_VAR_DEVOTIONS_EDITOR, ENV_VAR_DEVOTIONS_PSALMS, ENV_VAR_EDITOR,
    ENV_VAR_HOME, ENV_VAR_LOOKBACK_DAYS, ENV_VAR_SESSION_DIR, ENV_VAR_SESSION_TIMEOUT,
    ENV_VAR_TODAY, JOURNAL_DAYS_BACK, MAX_LOOKBACK_DAYS, MAX_SESSION_TIMEOUT_MINUTES,
    REDACTED_PLACEHOLDER,
};
use crate::errors::{AppError, AppResult};
use crate::store::default_session_dir;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Configuration for the devotions application.
///
/// # Examples
///
/// ```no_run
/// use devotions::Config;
/// use std::env;
///
/// env::set_var("DEVOTIONS_DIR", "/tmp/devotions");
/// let config = Config::load().expect("Failed to load configuration");
/// assert!(config.db_path.ends_with("devotions.db"));
/// ```
#[derive(Clone)]
pub struct Config {
    /// Editor command for vent text: DEVOTIONS_EDITOR, then EDITOR, then "vim".
    pub editor: String,

    /// Directory holding the database and the Psalm dataset.
    pub data_dir: PathBuf,

    pub db_path: PathBuf,

    pub psalms_path: PathBuf,

    /// Directory holding the session file.
    pub session_dir: PathBuf,

    pub session_timeout_minutes: u64,

    pub lookback_days: u32,

    /// Date to use instead of the system clock.
    pub today: Option<DateKey>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("editor", &REDACTED_PLACEHOLDER)
            .field("data_dir", &REDACTED_PLACEHOLDER)
            .field("db_path", &REDACTED_PLACEHOLDER)
            .field("psalms_path", &REDACTED_PLACEHOLDER)
            .field("session_dir", &REDACTED_PLACEHOLDER)
            .field("session_timeout_minutes", &self.session_timeout_minutes)
            .field("lookback_days", &self.lookback_days)
            .field("today", &self.today)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            editor: DEFAULT_EDITOR_COMMAND.to_string(),
            data_dir: PathBuf::new(),
            db_path: PathBuf::new(),
            psalms_path: PathBuf::new(),
            session_dir: PathBuf::new(),
            session_timeout_minutes: DEFAULT_SESSION_TIMEOUT_MINUTES,
            lookback_days: JOURNAL_DAYS_BACK,
            today: None,
        }
    }
}

fn expand_path(raw: &str) -> AppResult<PathBuf> {
    let expanded = shellexpand::full(raw)
        .map_err(|e| AppError::Config(format!("Failed to expand path: {}", e)))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

fn parse_number<T: std::str::FromStr>(var: &str, default: T) -> AppResult<T> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a whole number, got '{}'", var, raw))),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Config rooted at `data_dir` with default file names and no environment lookups.
    pub fn with_data_dir(data_dir: &Path) -> Self {
        Config {
            data_dir: data_dir.to_path_buf(),
            db_path: data_dir.join(DEFAULT_DB_FILE),
            psalms_path: data_dir.join(DEFAULT_PSALMS_FILE),
            session_dir: default_session_dir(),
            ..Config::default()
        }
    }

    /// Validates an editor command string for security.
    ///
    /// The command must be non-empty and contain no spaces or shell metacharacters.
    fn validate_editor_command(editor_cmd: &str) -> AppResult<&str> {
        if editor_cmd.is_empty() {
            return Err(AppError::Config(
                "Editor command cannot be empty".to_string(),
            ));
        }

        if editor_cmd.contains(' ') {
            return Err(AppError::Config(
                "Editor command cannot contain spaces. Use a wrapper script or shell alias for editors requiring arguments".to_string(),
            ));
        }

        if let Some(ch) = EDITOR_FORBIDDEN_CHARS
            .iter()
            .find(|&&ch| editor_cmd.contains(ch))
        {
            return Err(AppError::Config(format!(
                "Editor command cannot contain shell metacharacters: '{}'. Use a wrapper script or shell alias instead",
                ch
            )));
        }

        Ok(editor_cmd)
    }

    /// Loads configuration from environment variables with sensible defaults.
    ///
    /// Paths are expanded with `shellexpand`, so `~` and `$VAR` work.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if:
    /// - A path expansion fails
    /// - The editor command fails validation
    /// - The timeout or lookback is not a whole number
    /// - The resulting configuration fails [`Config::validate`]
    pub fn load() -> AppResult<Self> {
        let editor_raw = env::var(ENV_VAR_DEVOTIONS_EDITOR)
            .or_else(|_| env::var(ENV_VAR_EDITOR))
            .unwrap_or_else(|_| DEFAULT_EDITOR_COMMAND.to_string());
        let editor = Config::validate_editor_command(&editor_raw)?.to_string();

        let data_dir_str = env::var(ENV_VAR_DEVOTIONS_DIR).unwrap_or_else(|_| {
            let home = env::var(ENV_VAR_HOME).unwrap_or_default();
            format!("{}/{}", home, DEFAULT_DATA_SUBDIR)
        });
        let data_dir = expand_path(&data_dir_str)?;

        let db_path = match env::var(ENV_VAR_DEVOTIONS_DB) {
            Ok(raw) => expand_path(&raw)?,
            Err(_) => data_dir.join(DEFAULT_DB_FILE),
        };
        let psalms_path = match env::var(ENV_VAR_DEVOTIONS_PSALMS) {
            Ok(raw) => expand_path(&raw)?,
            Err(_) => data_dir.join(DEFAULT_PSALMS_FILE),
        };
        let session_dir = match env::var(ENV_VAR_SESSION_DIR) {
            Ok(raw) => expand_path(&raw)?,
            Err(_) => default_session_dir(),
        };

        let config = Config {
            editor,
            data_dir,
            db_path,
            psalms_path,
            session_dir,
            session_timeout_minutes: parse_number(
                ENV_VAR_SESSION_TIMEOUT,
                DEFAULT_SESSION_TIMEOUT_MINUTES,
            )?,
            lookback_days: parse_number(ENV_VAR_LOOKBACK_DAYS, JOURNAL_DAYS_BACK)?,
            today: match env::var(ENV_VAR_TODAY) {
                Ok(raw) => Some(DateKey::parse(raw.trim()).map_err(|e| {
                    AppError::Config(format!("{} is not a date ({}): {}", ENV_VAR_TODAY, raw, e))
                })?),
                Err(_) => None,
            },
        };
        config.validate()?;

        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Validates that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` with one of the following messages:
    /// - "Data directory path is empty"
    /// - "Data directory must be an absolute path"
    /// - "Editor command is empty"
    /// - "Session timeout must be at least one minute"
    /// - "Session timeout cannot exceed ... minutes"
    /// - "Lookback cannot exceed ... days"
    ///
    /// # Examples
    ///
    /// ```
    /// use devotions::Config;
    /// use std::path::Path;
    ///
    /// let config = Config::with_data_dir(Path::new("/absolute/path"));
    /// assert!(config.validate().is_ok());
    ///
    /// let relative = Config::with_data_dir(Path::new("relative/path"));
    /// assert!(relative.validate().is_err());
    /// ```
    pub fn validate(&self) -> AppResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(AppError::Config("Data directory path is empty".to_string()));
        }

        if !self.data_dir.is_absolute() {
            return Err(AppError::Config(
                "Data directory must be an absolute path".to_string(),
            ));
        }

        if self.editor.is_empty() {
            return Err(AppError::Config("Editor command is empty".to_string()));
        }

        if self.session_timeout_minutes == 0 {
            return Err(AppError::Config(
                "Session timeout must be at least one minute".to_string(),
            ));
        }

        if self.session_timeout_minutes > MAX_SESSION_TIMEOUT_MINUTES {
            return Err(AppError::Config(format!(
                "Session timeout cannot exceed {} minutes",
                MAX_SESSION_TIMEOUT_MINUTES
            )));
        }

        if self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(AppError::Config(format!(
                "Lookback cannot exceed {} days",
                MAX_LOOKBACK_DAYS
            )));
        }

        Ok(())
    }

    /// The clock for this invocation, read once so every command sees one "now".
    pub fn clock(&self) -> FixedClock {
        match self.today {
            Some(date) => FixedClock::at(date.date()),
            None => FixedClock::new(SystemClock.today(), SystemClock.now()),
        }
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_minutes.saturating_mul(60))
    }

    /// Creates the data directory (owner-only on Unix) and the database's parent.
    pub fn ensure_data_dir(&self) -> AppResult<()> {
        for dir in [Some(self.data_dir.as_path()), self.db_path.parent()]
            .into_iter()
            .flatten()
        {
            if dir.as_os_str().is_empty() || dir.exists() {
                continue;
            }
            fs::create_dir_all(dir).map_err(|e| {
                AppError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create data directory: {}", e),
                ))
            })?;

            #[cfg(unix)]
            {
                use crate::constants::DEFAULT_DIR_PERMISSIONS;
                fs::set_permissions(dir, fs::Permissions::from_mode(DEFAULT_DIR_PERMISSIONS))?;
                debug!("Set 0o700 permissions on data directory");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    const VARS: &[&str] = &[
        ENV_VAR_DEVOTIONS_DIR,
        ENV_VAR_DEVOTIONS_DB,
        ENV_VAR_DEVOTIONS_PSALMS,
        ENV_VAR_DEVOTIONS_EDITOR,
        ENV_VAR_EDITOR,
        ENV_VAR_SESSION_DIR,
        ENV_VAR_SESSION_TIMEOUT,
        ENV_VAR_LOOKBACK_DAYS,
        ENV_VAR_TODAY,
    ];

    /// Runs `f` with the devotions variables cleared, restoring them afterwards.
    fn with_clean_env<F: FnOnce()>(f: F) {
        let saved: Vec<_> = VARS.iter().map(|v| (*v, env::var(v).ok())).collect();
        for var in VARS {
            env::remove_var(var);
        }

        f();

        for (var, value) in saved {
            match value {
                Some(value) => env::set_var(var, value),
                None => env::remove_var(var),
            }
        }
    }

    #[test]
    fn test_debug_impl_redacts_paths() {
        let config = Config::with_data_dir(Path::new("/home/username/private/devotions"));
        let debug_output = format!("{:?}", config);

        assert!(debug_output.contains(REDACTED_PLACEHOLDER));
        assert!(!debug_output.contains("/home/username/private"));
        assert!(!debug_output.contains("vim"));
        assert!(debug_output.contains("lookback_days: 730"));
    }

    #[test]
    #[serial]
    fn test_load_defaults_from_data_dir() {
        with_clean_env(|| {
            let dir = tempdir().unwrap();
            env::set_var(ENV_VAR_DEVOTIONS_DIR, dir.path());

            let config = Config::load().unwrap();
            assert_eq!(config.data_dir, dir.path());
            assert_eq!(config.db_path, dir.path().join("devotions.db"));
            assert_eq!(config.psalms_path, dir.path().join("psalms.json"));
            assert_eq!(config.editor, "vim");
            assert_eq!(config.session_timeout(), Duration::from_secs(30 * 60));
            assert_eq!(config.lookback_days, 730);
            assert_eq!(config.today, None);
        });
    }

    #[test]
    #[serial]
    fn test_today_override_fixes_the_clock() {
        with_clean_env(|| {
            env::set_var(ENV_VAR_DEVOTIONS_DIR, "/tmp");
            env::set_var(ENV_VAR_TODAY, "20240229");

            let clock = Config::load().unwrap().clock();
            assert_eq!(clock.today(), chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

            env::set_var(ENV_VAR_TODAY, "someday");
            assert!(matches!(Config::load(), Err(AppError::Config(_))));
        });
    }

    #[test]
    #[serial]
    fn test_editor_precedence() {
        with_clean_env(|| {
            env::set_var(ENV_VAR_DEVOTIONS_DIR, "/tmp");
            env::set_var(ENV_VAR_EDITOR, "nano");
            assert_eq!(Config::load().unwrap().editor, "nano");

            env::set_var(ENV_VAR_DEVOTIONS_EDITOR, "hx");
            assert_eq!(Config::load().unwrap().editor, "hx");
        });
    }

    #[test]
    #[serial]
    fn test_explicit_paths_and_numbers() {
        with_clean_env(|| {
            env::set_var(ENV_VAR_DEVOTIONS_DIR, "/tmp/devotions");
            env::set_var(ENV_VAR_DEVOTIONS_DB, "/tmp/other/journal.db");
            env::set_var(ENV_VAR_SESSION_DIR, "/tmp/session");
            env::set_var(ENV_VAR_SESSION_TIMEOUT, "5");
            env::set_var(ENV_VAR_LOOKBACK_DAYS, "90");

            let config = Config::load().unwrap();
            assert_eq!(config.db_path, PathBuf::from("/tmp/other/journal.db"));
            assert_eq!(config.psalms_path, PathBuf::from("/tmp/devotions/psalms.json"));
            assert_eq!(config.session_dir, PathBuf::from("/tmp/session"));
            assert_eq!(config.session_timeout_minutes, 5);
            assert_eq!(config.lookback_days, 90);
        });
    }

    #[test]
    #[serial]
    fn test_load_rejects_bad_numbers_and_editors() {
        with_clean_env(|| {
            env::set_var(ENV_VAR_DEVOTIONS_DIR, "/tmp");

            env::set_var(ENV_VAR_LOOKBACK_DAYS, "two years");
            match Config::load() {
                Err(AppError::Config(msg)) => assert!(msg.contains(ENV_VAR_LOOKBACK_DAYS)),
                other => panic!("Expected Config error, got {:?}", other),
            }
            env::remove_var(ENV_VAR_LOOKBACK_DAYS);

            env::set_var(ENV_VAR_SESSION_TIMEOUT, "0");
            assert!(Config::load().is_err());
            env::remove_var(ENV_VAR_SESSION_TIMEOUT);

            env::set_var(ENV_VAR_SESSION_TIMEOUT, u64::MAX.to_string());
            match Config::load() {
                Err(AppError::Config(msg)) => assert!(msg.contains("cannot exceed")),
                other => panic!("Expected Config error, got {:?}", other),
            }
            env::remove_var(ENV_VAR_SESSION_TIMEOUT);

            env::set_var(ENV_VAR_LOOKBACK_DAYS, u32::MAX.to_string());
            match Config::load() {
                Err(AppError::Config(msg)) => assert!(msg.contains("Lookback cannot exceed")),
                other => panic!("Expected Config error, got {:?}", other),
            }
            env::remove_var(ENV_VAR_LOOKBACK_DAYS);

            env::set_var(ENV_VAR_DEVOTIONS_EDITOR, "vim --noplugin");
            match Config::load() {
                Err(AppError::Config(msg)) => assert!(msg.contains("cannot contain spaces")),
                other => panic!("Expected Config error, got {:?}", other),
            }
        });
    }

    #[test]
    fn test_validate_rejects_relative_and_empty_dirs() {
        let relative = Config::with_data_dir(Path::new("relative/path"));
        match relative.validate() {
            Err(AppError::Config(message)) => assert!(message.contains("must be an absolute path")),
            _ => panic!("Expected Config error about relative path"),
        }

        match Config::default().validate() {
            Err(AppError::Config(message)) => assert!(message.contains("path is empty")),
            _ => panic!("Expected Config error about empty path"),
        }

        let mut no_editor = Config::with_data_dir(Path::new("/abs"));
        no_editor.editor.clear();
        assert!(no_editor.validate().is_err());
    }

    #[test]
    fn test_limits_on_timeout_and_lookback() {
        let mut config = Config::with_data_dir(Path::new("/abs"));
        config.session_timeout_minutes = MAX_SESSION_TIMEOUT_MINUTES;
        config.lookback_days = MAX_LOOKBACK_DAYS;
        assert!(config.validate().is_ok());

        config.lookback_days = MAX_LOOKBACK_DAYS + 1;
        assert!(config.validate().is_err());
        config.lookback_days = JOURNAL_DAYS_BACK;

        config.session_timeout_minutes = u64::MAX;
        assert!(config.validate().is_err());
        // Unvalidated configs still produce a duration instead of overflowing.
        assert_eq!(config.session_timeout(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_validate_editor_command() {
        assert_eq!(Config::validate_editor_command("/usr/bin/nano").unwrap(), "/usr/bin/nano");
        assert!(Config::validate_editor_command("").is_err());

        for cmd in ["echo>/tmp/file", "vim;echo", "$(echo)", "`echo`", "vim|cat"] {
            match Config::validate_editor_command(cmd) {
                Err(AppError::Config(msg)) => {
                    assert!(msg.contains("shell metacharacters"), "{}", cmd)
                }
                _ => panic!("Expected Config error for {}", cmd),
            }
        }
    }

    #[test]
    fn test_ensure_data_dir_creates_private_dir() {
        let temp_dir = tempdir().unwrap();
        let config = Config::with_data_dir(&temp_dir.path().join("data"));
        assert!(!config.data_dir.exists());

        config.ensure_data_dir().unwrap();
        assert!(config.data_dir.is_dir());

        #[cfg(unix)]
        {
            let mode = fs::metadata(&config.data_dir).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o700);
        }
        // idempotent
        config.ensure_data_dir().unwrap();
    }
}

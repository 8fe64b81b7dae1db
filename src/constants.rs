//! Constants used throughout the application.
//!
//! This module contains all constants used in the devotions application, organized
//! into logical groups. Storage keys in particular must stay stable: they are the
//! on-disk format and the export/import format at the same time.

// Application Metadata
/// The name of the application.
pub const APP_NAME: &str = "devotions";
/// The description of the application used in CLI help text.
pub const APP_DESCRIPTION: &str = "A daily Psalm devotional with a private mood and prayer journal";

// CLI Arguments & Defaults
/// Default command for the editor if not specified otherwise.
pub const DEFAULT_EDITOR_COMMAND: &str = "vim";
/// Log format identifier for plain text.
pub const LOG_FORMAT_TEXT: &str = "text";
/// Log format identifier for JSON.
pub const LOG_FORMAT_JSON: &str = "json";
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Configuration Keys & Environment Variables
/// Environment variable for the devotions data directory.
pub const ENV_VAR_DEVOTIONS_DIR: &str = "DEVOTIONS_DIR";
/// Environment variable overriding the database path.
pub const ENV_VAR_DEVOTIONS_DB: &str = "DEVOTIONS_DB";
/// Environment variable overriding the Psalm dataset path.
pub const ENV_VAR_DEVOTIONS_PSALMS: &str = "DEVOTIONS_PSALMS";
/// Environment variable for the preferred devotions editor.
pub const ENV_VAR_DEVOTIONS_EDITOR: &str = "DEVOTIONS_EDITOR";
/// Standard environment variable for specifying the default editor.
pub const ENV_VAR_EDITOR: &str = "EDITOR";
/// Environment variable overriding where the session file lives.
pub const ENV_VAR_SESSION_DIR: &str = "DEVOTIONS_SESSION_DIR";
/// Environment variable for the session inactivity timeout, in minutes.
pub const ENV_VAR_SESSION_TIMEOUT: &str = "DEVOTIONS_SESSION_TIMEOUT";
/// Environment variable for the journal lookback window, in days.
pub const ENV_VAR_LOOKBACK_DAYS: &str = "DEVOTIONS_LOOKBACK_DAYS";
/// Fixes the current date (YYYY-MM-DD or YYYYMMDD) for reproducible runs.
pub const ENV_VAR_TODAY: &str = "DEVOTIONS_TODAY";
/// Non-interactive PIN used instead of prompting.
pub const ENV_VAR_TEST_PIN: &str = "DEVOTIONS_TEST_PIN";
/// Standard environment variable for the user's home directory.
pub const ENV_VAR_HOME: &str = "HOME";
/// Per-user runtime directory, cleared on logout.
pub const ENV_VAR_XDG_RUNTIME_DIR: &str = "XDG_RUNTIME_DIR";
/// Login name, used when the uid is not available.
pub const ENV_VAR_USER: &str = "USER";
/// Default sub-directory name for devotions data within the user's home directory.
pub const DEFAULT_DATA_SUBDIR: &str = ".local/share/devotions";
/// Database file name inside the data directory.
pub const DEFAULT_DB_FILE: &str = "devotions.db";
/// Psalm dataset file name inside the data directory.
pub const DEFAULT_PSALMS_FILE: &str = "psalms.json";

// Validation
/// Characters forbidden in editor commands for security reasons.
pub const EDITOR_FORBIDDEN_CHARS: &[char] =
    &['|', '&', ';', '$', '(', ')', '`', '\\', '<', '>', '\'', '"'];
/// Placeholder string for redacted information in debug output.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";
/// Number of digits in a PIN.
pub const PIN_LENGTH: usize = 6;

// File System Parameters
/// Default POSIX permissions for newly created directories (owner read/write/execute).
#[cfg(unix)]
pub const DEFAULT_DIR_PERMISSIONS: u32 = 0o700;
/// Default POSIX permissions for newly created files (owner read/write).
#[cfg(unix)]
pub const DEFAULT_FILE_PERMISSIONS: u32 = 0o600;
/// RAM-backed directories preferred for the session file.
pub const TMPFS_PATHS: &[&str] = &["/dev/shm", "/run/shm"];
/// Sub-directory created inside the runtime directory.
pub const SESSION_SUBDIR: &str = "devotions";
/// Session file name.
pub const SESSION_FILE: &str = "session.json";
/// Prefix and extension of a per-database session file.
pub const SESSION_FILE_PREFIX: &str = "session-";
pub const SESSION_FILE_EXTENSION: &str = ".json";
/// Hex digits of the database path digest kept in the session file name.
pub const SESSION_KEY_HEX_LEN: usize = 16;
/// Default session inactivity timeout in minutes.
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: u64 = 30;
/// Longest accepted session timeout: one week.
pub const MAX_SESSION_TIMEOUT_MINUTES: u64 = 7 * 24 * 60;

// Date/Time Logic
/// Date format string for ISO date format (YYYY-MM-DD).
pub const DATE_FORMAT_ISO: &str = "%Y-%m-%d";
/// Date format string for compact date format (YYYYMMDD).
pub const DATE_FORMAT_COMPACT: &str = "%Y%m%d";
/// Date format used when listing journal entries.
pub const JOURNAL_DATE_DISPLAY_FORMAT: &str = "%a, %b %-d, %Y";
/// Number of Psalms in the reading cycle.
pub const PSALMS_COUNT: u16 = 150;
/// Number of fixed refuge steps (entry, mood, vent) before the first Psalm.
pub const REFUGE_STEPS: usize = 3;
/// Total steps in the devotions slideshow.
pub const TOTAL_STEPS: usize = REFUGE_STEPS + PSALMS_COUNT as usize;
/// How far back the journal scan looks, in days.
pub const JOURNAL_DAYS_BACK: u32 = 730;
/// Longest accepted lookback: one hundred years.
pub const MAX_LOOKBACK_DAYS: u32 = 36_600;
/// Trailing-edge debounce for text field saves, in milliseconds.
pub const SAVE_DEBOUNCE_MS: u64 = 400;

// Storage Keys
/// Key prefix for a day's mood.
pub const MOOD_KEY_PREFIX: &str = "devotions-mood-";
/// Key prefix for a day's vent text.
pub const VENT_KEY_PREFIX: &str = "devotions-vent-";
/// Key prefix for a Psalm's prayer and reflection.
pub const PSALM_KEY_PREFIX: &str = "devotions-psalm-";
/// Prefixes included in export and accepted on import.
pub const EXPORT_PREFIXES: &[&str] = &[MOOD_KEY_PREFIX, VENT_KEY_PREFIX, PSALM_KEY_PREFIX];
/// Durable key holding the PIN digest.
pub const PIN_HASH_KEY: &str = "devotions-pin-hash";
/// Session key set while the gate is open.
pub const UNLOCKED_KEY: &str = "devotions-unlocked";
/// Value stored under [`UNLOCKED_KEY`] when unlocked.
pub const UNLOCKED_VALUE: &str = "1";

// Export/Import
/// The only export document version this build reads or writes.
pub const EXPORT_VERSION: u64 = 1;
/// File name prefix for export documents.
pub const EXPORT_FILE_PREFIX: &str = "devotions-export-";

// Logging Configuration
/// Service name used in tracing spans and structured logs.
pub const TRACING_SERVICE_NAME: &str = "devotions";
/// Name for the root tracing span covering an application invocation.
pub const TRACING_ROOT_SPAN_NAME: &str = "app_invocation";

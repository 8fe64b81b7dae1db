//! Error handling utilities for the devotions application.
//!
//! This module provides the central error type `AppError` which represents all
//! possible error conditions that might occur in the application, as well as the
//! convenience type alias `AppResult` for functions that can return these errors.
//!
//! Most journal and transfer operations never surface these errors to their
//! callers: storage failures are logged and turned into defaults. The types
//! here describe what the store, the gate and the command-line surface can
//! report.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Represents specific error cases that can occur when interacting with external editors.
///
/// # Examples
///
/// ```
/// use devotions::errors::EditorError;
/// use std::io::{self, ErrorKind};
///
/// let io_error = io::Error::new(ErrorKind::NotFound, "command not found");
/// let error = EditorError::CommandNotFound {
///     command: "vim".to_string(),
///     source: io_error,
/// };
///
/// assert!(format!("{}", error).contains("not found"));
/// assert!(format!("{}", error).contains("vim"));
/// ```
#[derive(Debug, Error)]
pub enum EditorError {
    /// Error when the specified editor command cannot be found.
    #[error("Editor command '{command}' not found: {source}. Please check that the editor is installed and available in your PATH.")]
    CommandNotFound {
        /// The editor command that was not found
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error when permission is denied to execute the editor command.
    #[error("Permission denied when trying to execute editor '{command}': {source}.")]
    PermissionDenied {
        /// The editor command that had permission denied
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error when the editor command fails to execute due to other I/O errors.
    #[error("Failed to execute editor '{command}': {source}.")]
    ExecutionFailed {
        /// The editor command that failed to execute
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error when the editor exits with a non-zero status code.
    #[error("Editor '{command}' exited with non-zero status code: {status_code}. Nothing was saved.")]
    NonZeroExit {
        /// The editor command that exited with a non-zero status
        command: String,
        /// The exit status code
        status_code: i32,
    },
}

/// Errors raised by key-value store backends.
///
/// Journal operations swallow these and fall back to defaults; they only reach
/// the user when the store itself cannot be opened.
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite database error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("Failed to get connection from pool: {0}")]
    Pool(#[from] r2d2::Error),

    /// The session file could not be read or written.
    #[error("Session file {path} is not accessible: {source}")]
    Session {
        /// Location of the session file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A stored document could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend is not usable at all.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the PIN screen.
///
/// A wrong PIN is not an error: `Gate::check_secret` simply returns `false`.
///
/// ```
/// use devotions::errors::GateError;
///
/// assert_eq!(format!("{}", GateError::InvalidPinFormat), "Enter 6 digits");
/// ```
#[derive(Debug, Error)]
pub enum GateError {
    /// The PIN is not exactly six ASCII digits.
    #[error("Enter 6 digits")]
    InvalidPinFormat,

    /// The PIN did not match the stored one.
    #[error("Wrong PIN")]
    WrongPin,

    /// The operation needs an unlocked session.
    #[error("Devotions are locked. Run `devotions unlock` first.")]
    Locked,

    /// No PIN has been stored yet.
    #[error("No PIN set. Run `devotions pin set` to choose one.")]
    NoPinSet,

    /// Reading the PIN from the terminal failed.
    #[error("Failed to read PIN: {0}")]
    PinPrompt(String),
}

/// Errors surfaced by the export and import commands.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The import file is not a JSON document.
    #[error("Invalid file")]
    InvalidFile(#[source] serde_json::Error),

    /// The store could not be enumerated, so nothing can be exported.
    #[error("Nothing to export: storage is unavailable")]
    StoreUnavailable,

    /// Writing the export document failed.
    #[error("Failed to write export file {path}: {source}")]
    Write {
        /// Destination of the export
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Represents all possible errors that can occur in the devotions application.
///
/// # Examples
///
/// ```
/// use devotions::errors::AppError;
///
/// let error = AppError::Config("Missing data directory".to_string());
/// assert_eq!(format!("{}", error), "Configuration error: Missing data directory");
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Errors related to configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input/output errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors in journal logic (e.g., invalid dates or Psalm numbers).
    #[error("Journal error: {0}")]
    Journal(String),

    /// Errors when interacting with the text editor.
    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),

    /// Errors from the key-value store backends.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Errors from the PIN screen.
    #[error("{0}")]
    Gate(#[from] GateError),

    /// Errors from export and import.
    #[error("{0}")]
    Transfer(#[from] TransferError),
}

/// A type alias for `Result<T, AppError>` to simplify function signatures.
pub type AppResult<T> = Result<T, AppError>;

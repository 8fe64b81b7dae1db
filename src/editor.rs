//! Editor abstraction for writing longer vent text.
//!
//! The vent field can be filled from an external editor: the current text is
//! written to a private temporary file, the editor is launched on it, and the
//! file's contents are read back once the editor exits. The temporary file is
//! removed when it goes out of scope.

use crate::errors::{AppResult, EditorError};
use std::fs;
use std::io::Write;
use std::process::Command;
use tracing::debug;

/// Something that lets the user revise a piece of text.
///
/// # Examples
///
/// ```
/// use devotions::editor::Editor;
/// use devotions::errors::AppResult;
///
/// struct Shout;
///
/// impl Editor for Shout {
///     fn edit_text(&self, initial: &str) -> AppResult<String> {
///         Ok(initial.to_uppercase())
///     }
/// }
///
/// assert_eq!(Shout.edit_text("selah").unwrap(), "SELAH");
/// ```
pub trait Editor {
    /// Returns the revised text. `initial` is shown to the user first.
    ///
    /// # Errors
    ///
    /// Implementations return `AppError::Editor` when the editor can't be run
    /// and `AppError::Io` when the text can't be handed over or read back.
    fn edit_text(&self, initial: &str) -> AppResult<String>;
}

/// Launches an external editor command on a temporary file.
///
/// ```no_run
/// use devotions::editor::{Editor, SystemEditor};
///
/// let editor = SystemEditor::new("nano");
/// let text = editor.edit_text("Today I feel").expect("editor failed");
/// ```
pub struct SystemEditor {
    /// The command to run (e.g., "vim", "nano"). Validated by `Config`.
    pub editor_cmd: String,
}

impl SystemEditor {
    pub fn new(editor_cmd: impl Into<String>) -> Self {
        SystemEditor {
            editor_cmd: editor_cmd.into(),
        }
    }

    fn launch(&self, path: &std::path::Path) -> Result<(), EditorError> {
        debug!("Launching editor: {}", self.editor_cmd);
        let command = self.editor_cmd.clone();

        match Command::new(&self.editor_cmd).arg(path).status() {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(EditorError::NonZeroExit {
                command,
                status_code: status.code().unwrap_or(-1),
            }),
            Err(e) => Err(match e.kind() {
                std::io::ErrorKind::NotFound => EditorError::CommandNotFound { command, source: e },
                std::io::ErrorKind::PermissionDenied => {
                    EditorError::PermissionDenied { command, source: e }
                }
                _ => EditorError::ExecutionFailed { command, source: e },
            }),
        }
    }
}

impl Editor for SystemEditor {
    fn edit_text(&self, initial: &str) -> AppResult<String> {
        // NamedTempFile is created 0o600 and removed on drop.
        let mut file = tempfile::Builder::new()
            .prefix("devotions-vent-")
            .suffix(".md")
            .tempfile()?;
        file.write_all(initial.as_bytes())?;
        file.flush()?;

        self.launch(file.path())?;

        let text = fs::read_to_string(file.path())?;
        Ok(text.trim_end_matches('\n').to_string())
    }
}

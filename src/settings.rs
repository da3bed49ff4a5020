//! User settings the core consumes read-only.
//!
//! Owned by the outer application: a JSON file the CLI points at. Missing
//! file means defaults; unknown fields are tolerated so older binaries can
//! read newer files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::csv::{ColumnSet, Delimiter, EncodeOptions};
use crate::error::{AppError, AppResult};
use crate::scan_buffer::DEFAULT_WINDOW_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// Delimiter for exports. Import always accepts both.
    pub csv_separator: Delimiter,
    /// Export column set; `full` is canonical, `compact` the legacy variant.
    pub csv_columns: ColumnSet,
    /// Prefix exported files with a UTF-8 BOM.
    pub export_bom: bool,
    /// How long a scan stays undoable.
    pub undo_window_ms: i64,
}

impl Default for UserSettings {
    fn default() -> Self {
        UserSettings {
            csv_separator: Delimiter::Comma,
            csv_columns: ColumnSet::Full,
            export_bom: false,
            undo_window_ms: DEFAULT_WINDOW_MS,
        }
    }
}

impl UserSettings {
    /// Load from a JSON file; a missing file yields defaults, a malformed
    /// one is an error (silently ignoring a user's edits would be worse).
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(UserSettings::default())
            }
            Err(err) => {
                return Err(AppError::from(err)
                    .with_context("operation", "settings_read")
                    .with_context("path", path.display().to_string()))
            }
        };
        let settings: UserSettings = serde_json::from_str(&raw).map_err(|err| {
            AppError::from(err)
                .with_context("operation", "settings_parse")
                .with_context("path", path.display().to_string())
        })?;
        Ok(settings)
    }

    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            delimiter: self.csv_separator,
            columns: self.csv_columns,
        }
    }
}

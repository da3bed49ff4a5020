//! CSV export: enumerate the ledger, encode, write the file atomically.
//!
//! The byte-order mark lives here, at the I/O boundary, because it is a
//! spreadsheet-compatibility concern and not part of the CSV format itself.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::csv::{encode, EncodeOptions};
use crate::db::write_atomic;
use crate::error::{AppError, AppResult};
use crate::ledger::CountLedger;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    pub encode: EncodeOptions,
    /// Prefix the file with a UTF-8 BOM to hint Excel/Sheets at the encoding.
    pub bom: bool,
}

#[derive(Debug, Clone)]
pub struct ExportEntry {
    pub path: PathBuf,
    pub rows: u64,
}

/// Snapshot the ledger (most recently touched first) and write it to `path`.
/// The write is temp-file-and-rename, so readers never see a half-written
/// export; a failure leaves any previous file untouched.
pub async fn export_csv(
    ledger: &CountLedger,
    path: &Path,
    opts: &ExportOptions,
) -> AppResult<ExportEntry> {
    let lines = ledger
        .list_all()
        .await
        .map_err(|err| AppError::from(err).with_context("operation", "export_list"))?;
    let text = encode(&lines, &opts.encode);

    let mut bytes = Vec::with_capacity(text.len() + UTF8_BOM.len());
    if opts.bom {
        bytes.extend_from_slice(UTF8_BOM);
    }
    bytes.extend_from_slice(text.as_bytes());

    write_atomic(path, &bytes).map_err(|err| {
        AppError::from(err)
            .with_context("operation", "export_write")
            .with_context("path", path.display().to_string())
    })?;

    info!(
        target = "stockcount",
        event = "export_done",
        path = %path.display(),
        rows = lines.len()
    );
    Ok(ExportEntry {
        path: path.to_path_buf(),
        rows: lines.len() as u64,
    })
}

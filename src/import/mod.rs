//! Catalog import: bulk loading of barcode -> name mappings.
//!
//! Quantities are never touched except to create zero-quantity placeholders
//! for unknown barcodes. Row-level irregularities are absorbed by the lenient
//! decoder; only a failure of the underlying stream aborts the run, and rows
//! applied before an abort are retained.

use std::io::Read;

use thiserror::Error;
use tracing::info;

use crate::csv;
use crate::ledger::{CountLedger, LedgerError};
use crate::model::{CountLine, ImportSummary};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("could not read catalog stream")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Import a catalog from `reader`: column 0 is the barcode, column 1 the
/// display name, extra columns are ignored. Comma and semicolon both delimit,
/// even mixed within one file. Rows with a blank barcode are skipped silently
/// and never counted.
pub async fn import_catalog(
    ledger: &CountLedger,
    mut reader: impl Read,
) -> Result<ImportSummary, ImportError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    // Hand-edited files show up in odd encodings; a lossy decode keeps the
    // run alive and the lenient decoder does the rest.
    let text = String::from_utf8_lossy(&bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut summary = ImportSummary::default();
    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let columns = csv::decode_line(line, csv::IMPORT_DELIMITERS);
        let ean = columns.first().map(|c| c.trim()).unwrap_or_default();
        if ean.is_empty() {
            continue;
        }
        let name = columns.get(1).map(|c| c.trim()).unwrap_or_default();
        summary.processed += 1;

        match ledger.get_item(ean).await? {
            None => {
                let mut line = CountLine::new(ean);
                line.name = (!name.is_empty()).then(|| name.to_string());
                ledger.save(&line).await?;
                summary.created += 1;
            }
            Some(existing) => {
                let new_name = if name.is_empty() {
                    existing.name.clone()
                } else {
                    Some(name.to_string())
                };
                if new_name != existing.name {
                    let mut updated = existing.clone();
                    updated.name = new_name;
                    ledger.save(&updated).await?;
                    summary.updated += 1;
                }
            }
        }
    }

    info!(
        target = "stockcount",
        event = "catalog_import_done",
        processed = summary.processed,
        created = summary.created,
        updated = summary.updated
    );
    Ok(summary)
}

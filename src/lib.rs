//! Stock-counting core: scans accumulate per-barcode quantities in a SQLite
//! ledger, a single-slot buffer allows undoing the latest scan for a short
//! window, and catalogs move in and out as CSV.
//!
//! The UI shell (camera, dialogs, navigation) is a collaborator, not part of
//! this crate: it feeds decoded barcode strings and file byte streams in, and
//! consumes count lines and CSV text out.

pub mod csv;
pub mod db;
pub mod ean;
mod error;
pub mod export;
pub mod import;
pub mod ledger;
pub mod logging;
pub mod migrate;
mod model;
pub mod scan_buffer;
pub mod settings;
pub mod time;

pub use error::{AppError, AppResult};
pub use export::{export_csv, ExportEntry, ExportOptions};
pub use import::{import_catalog, ImportError};
pub use ledger::{CountLedger, LedgerError};
pub use model::{CountLine, ImportSummary};
pub use scan_buffer::ScanBuffer;
pub use settings::UserSettings;

use serde::{Deserialize, Serialize};

/// One counted item, keyed by its barcode.
///
/// The ledger is the sole writer; everything else sees immutable snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "snake_case")]
pub struct CountLine {
    pub ean: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Epoch milliseconds, stamped on every mutation.
    #[serde(default)]
    pub updated_at: i64,
}

impl CountLine {
    pub fn new(ean: impl Into<String>) -> Self {
        CountLine {
            ean: ean.into(),
            name: None,
            quantity: 0,
            location: None,
            note: None,
            updated_at: 0,
        }
    }
}

/// Counters describing one catalog import run. Derived, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Rows with a non-empty barcode, whether or not they caused a write.
    pub processed: u64,
    /// Zero-quantity placeholder records created for unknown barcodes.
    pub created: u64,
    /// Existing records whose name changed.
    pub updated: u64,
}

//! The authoritative mapping from barcode to count line.
//!
//! The ledger owns all writes to `count_lines`. Mutations on one barcode are
//! single SQL statements, so SQLite's write serialization linearizes
//! concurrent scans of the same code; readers only ever observe committed
//! rows. Every successful mutation publishes a fresh snapshot to the watch
//! channel backing `observe_all`.

use std::sync::Arc;

use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::debug;

use crate::ean;
use crate::model::CountLine;
use crate::time::now_ms;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid EAN-13 barcode: {code:?}")]
    InvalidBarcode { code: String },
    #[error("quantity must be >= 0, got {quantity}")]
    InvalidQuantity { quantity: i64 },
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

const SELECT_COLUMNS: &str = "ean, name, quantity, location, note, updated_at";

/// Injected wherever counting happens; cheap to clone (pool + channel handle).
#[derive(Clone)]
pub struct CountLedger {
    pool: SqlitePool,
    snapshots: watch::Sender<Vec<CountLine>>,
    publish_lock: Arc<Mutex<()>>,
}

impl CountLedger {
    /// Wrap an already-migrated pool. The ledger takes no global state; the
    /// application wiring decides which database (or `sqlite::memory:`) backs it.
    ///
    /// The watch channel is seeded with the current table contents, so a
    /// subscriber over a pre-populated database sees its rows before any
    /// mutation happens.
    pub async fn new(pool: SqlitePool) -> Result<Self, LedgerError> {
        let (snapshots, _) = watch::channel(Vec::new());
        let ledger = CountLedger {
            pool,
            snapshots,
            publish_lock: Arc::new(Mutex::new(())),
        };
        ledger.publish().await?;
        Ok(ledger)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Count one scan of `ean`: create at quantity 1 or increment by 1.
    ///
    /// The only path that enforces checksum validity on creation. The upsert
    /// is one statement, so two racing scans of the same code never lose an
    /// increment.
    pub async fn scan(&self, ean: &str) -> Result<CountLine, LedgerError> {
        if !ean::is_valid(ean) {
            return Err(LedgerError::InvalidBarcode {
                code: ean.to_string(),
            });
        }
        let sql = format!(
            "INSERT INTO count_lines (ean, quantity, updated_at) VALUES (?, 1, ?) \
             ON CONFLICT(ean) DO UPDATE SET \
               quantity = quantity + 1, \
               updated_at = excluded.updated_at \
             RETURNING {SELECT_COLUMNS}"
        );
        let line = sqlx::query_as::<_, CountLine>(&sql)
            .bind(ean)
            .bind(now_ms())
            .fetch_one(&self.pool)
            .await?;
        debug!(target = "stockcount", event = "scan", ean, quantity = line.quantity);
        self.publish().await?;
        Ok(line)
    }

    /// Reverse one scan: decrement clamped at 0. A missing record is a no-op,
    /// and the checksum is deliberately not checked so that placeholder rows
    /// from catalog imports stay undoable.
    pub async fn undo_scan(&self, ean: &str) -> Result<(), LedgerError> {
        let res = sqlx::query(
            "UPDATE count_lines SET quantity = MAX(quantity - 1, 0), updated_at = ? \
             WHERE ean = ?",
        )
        .bind(now_ms())
        .bind(ean)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() > 0 {
            debug!(target = "stockcount", event = "undo_scan", ean);
            self.publish().await?;
        }
        Ok(())
    }

    /// General-purpose edit path: full upsert with a refreshed timestamp.
    /// Rejects negative quantities; does not re-validate the barcode, since
    /// catalog imports legitimately store unvalidated codes.
    pub async fn save(&self, line: &CountLine) -> Result<CountLine, LedgerError> {
        if line.quantity < 0 {
            return Err(LedgerError::InvalidQuantity {
                quantity: line.quantity,
            });
        }
        let sql = format!(
            "INSERT INTO count_lines (ean, name, quantity, location, note, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(ean) DO UPDATE SET \
               name = excluded.name, \
               quantity = excluded.quantity, \
               location = excluded.location, \
               note = excluded.note, \
               updated_at = excluded.updated_at \
             RETURNING {SELECT_COLUMNS}"
        );
        let saved = sqlx::query_as::<_, CountLine>(&sql)
            .bind(&line.ean)
            .bind(&line.name)
            .bind(line.quantity)
            .bind(&line.location)
            .bind(&line.note)
            .bind(now_ms())
            .fetch_one(&self.pool)
            .await?;
        debug!(target = "stockcount", event = "save", ean = %saved.ean);
        self.publish().await?;
        Ok(saved)
    }

    /// Remove a record; absent records are a no-op, not an error.
    pub async fn delete(&self, ean: &str) -> Result<(), LedgerError> {
        let res = sqlx::query("DELETE FROM count_lines WHERE ean = ?")
            .bind(ean)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() > 0 {
            debug!(target = "stockcount", event = "delete", ean);
            self.publish().await?;
        }
        Ok(())
    }

    pub async fn get_item(&self, ean: &str) -> Result<Option<CountLine>, LedgerError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM count_lines WHERE ean = ? LIMIT 1");
        let line = sqlx::query_as::<_, CountLine>(&sql)
            .bind(ean)
            .fetch_optional(&self.pool)
            .await?;
        Ok(line)
    }

    /// Every record, most recently touched first. Ties on `updated_at` break
    /// by barcode so the order is deterministic.
    pub async fn list_all(&self) -> Result<Vec<CountLine>, LedgerError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM count_lines ORDER BY updated_at DESC, ean"
        );
        let lines = sqlx::query_as::<_, CountLine>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(lines)
    }

    /// Case-insensitive substring match against barcode or name, same order
    /// as `list_all`. LIKE wildcards in the query are escaped, not interpreted.
    pub async fn search(&self, query: &str) -> Result<Vec<CountLine>, LedgerError> {
        let pattern = format!("%{}%", escape_like(query.trim()));
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM count_lines \
             WHERE ean LIKE ? ESCAPE '\\' OR name LIKE ? ESCAPE '\\' \
             ORDER BY updated_at DESC, ean"
        );
        let lines = sqlx::query_as::<_, CountLine>(&sql)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await?;
        Ok(lines)
    }

    /// Live-updating view: a fresh immutable snapshot lands in the channel
    /// after every successful mutation. Receivers that only ever read the
    /// latest value never block a writer.
    pub fn observe_all(&self) -> watch::Receiver<Vec<CountLine>> {
        self.snapshots.subscribe()
    }

    /// Query-and-send under a lock so snapshots land in query order; without
    /// it two racing mutations could publish an older snapshot last.
    async fn publish(&self) -> Result<(), LedgerError> {
        let _guard = self.publish_lock.lock().await;
        let snapshot = self.list_all().await?;
        self.snapshots.send_replace(snapshot);
        Ok(())
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

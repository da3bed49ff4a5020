use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use stockcount_lib::{migrate, CountLedger, CountLine, LedgerError};

const VALID_EAN: &str = "4006381333931";
const OTHER_EAN: &str = "5901234123457";

async fn memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    migrate::apply_migrations(&pool).await?;
    Ok(pool)
}

#[tokio::test]
async fn scan_creates_then_increments() -> Result<()> {
    let ledger = CountLedger::new(memory_pool().await?).await?;

    let first = ledger.scan(VALID_EAN).await?;
    assert_eq!(first.quantity, 1);
    assert!(first.updated_at > 0);

    let second = ledger.scan(VALID_EAN).await?;
    assert_eq!(second.quantity, 2);
    Ok(())
}

#[tokio::test]
async fn scan_rejects_invalid_barcode_and_creates_nothing() -> Result<()> {
    let ledger = CountLedger::new(memory_pool().await?).await?;

    let err = ledger.scan("590123412345").await.expect_err("12 digits");
    assert!(matches!(err, LedgerError::InvalidBarcode { .. }));

    let err = ledger.scan("4006381333932").await.expect_err("bad check");
    assert!(matches!(err, LedgerError::InvalidBarcode { .. }));

    assert!(ledger.list_all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn undo_scan_decrements_and_clamps_at_zero() -> Result<()> {
    let ledger = CountLedger::new(memory_pool().await?).await?;
    ledger.scan(VALID_EAN).await?;
    ledger.scan(VALID_EAN).await?;

    ledger.undo_scan(VALID_EAN).await?;
    assert_eq!(ledger.get_item(VALID_EAN).await?.unwrap().quantity, 1);

    ledger.undo_scan(VALID_EAN).await?;
    ledger.undo_scan(VALID_EAN).await?;
    assert_eq!(ledger.get_item(VALID_EAN).await?.unwrap().quantity, 0);
    Ok(())
}

#[tokio::test]
async fn undo_scan_on_missing_record_is_a_noop() -> Result<()> {
    let ledger = CountLedger::new(memory_pool().await?).await?;
    ledger.undo_scan(VALID_EAN).await?;
    assert!(ledger.get_item(VALID_EAN).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn save_rejects_negative_quantity() -> Result<()> {
    let ledger = CountLedger::new(memory_pool().await?).await?;
    let mut line = CountLine::new(VALID_EAN);
    line.quantity = -1;

    let err = ledger.save(&line).await.expect_err("negative quantity");
    assert!(matches!(err, LedgerError::InvalidQuantity { quantity: -1 }));
    assert!(ledger.get_item(VALID_EAN).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn save_is_idempotent_apart_from_timestamp() -> Result<()> {
    let ledger = CountLedger::new(memory_pool().await?).await?;
    let mut line = CountLine::new(VALID_EAN);
    line.name = Some("Pencil".into());
    line.quantity = 7;
    line.location = Some("Shelf 3".into());

    let saved = ledger.save(&line).await?;
    let resaved = ledger.save(&saved).await?;

    assert_eq!(resaved.quantity, 7);
    assert_eq!(resaved.name.as_deref(), Some("Pencil"));
    assert_eq!(resaved.location.as_deref(), Some("Shelf 3"));
    Ok(())
}

#[tokio::test]
async fn delete_removes_and_tolerates_absence() -> Result<()> {
    let ledger = CountLedger::new(memory_pool().await?).await?;
    ledger.scan(VALID_EAN).await?;

    ledger.delete(VALID_EAN).await?;
    assert!(ledger.get_item(VALID_EAN).await?.is_none());

    // Absent record: no error.
    ledger.delete(VALID_EAN).await?;
    Ok(())
}

#[tokio::test]
async fn list_all_orders_most_recent_first() -> Result<()> {
    let ledger = CountLedger::new(memory_pool().await?).await?;
    ledger.scan(VALID_EAN).await?;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    ledger.scan(OTHER_EAN).await?;

    let all = ledger.list_all().await?;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].ean, OTHER_EAN);
    assert_eq!(all[1].ean, VALID_EAN);

    // Touching the older record moves it back to the front.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    ledger.scan(VALID_EAN).await?;
    let all = ledger.list_all().await?;
    assert_eq!(all[0].ean, VALID_EAN);
    Ok(())
}

#[tokio::test]
async fn search_matches_code_or_name_case_insensitively() -> Result<()> {
    let ledger = CountLedger::new(memory_pool().await?).await?;
    let mut line = CountLine::new(VALID_EAN);
    line.name = Some("Blue Pencil".into());
    ledger.save(&line).await?;
    ledger.scan(OTHER_EAN).await?;

    let hits = ledger.search("pencil").await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].ean, VALID_EAN);

    let hits = ledger.search("590123").await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].ean, OTHER_EAN);

    // LIKE wildcards are literal characters to the caller.
    assert!(ledger.search("%").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn observe_all_publishes_snapshot_on_mutation() -> Result<()> {
    let ledger = CountLedger::new(memory_pool().await?).await?;
    let mut rx = ledger.observe_all();
    assert!(rx.borrow().is_empty());

    ledger.scan(VALID_EAN).await?;
    rx.changed().await?;
    {
        let snapshot = rx.borrow_and_update();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].quantity, 1);
    }

    ledger.delete(VALID_EAN).await?;
    rx.changed().await?;
    assert!(rx.borrow_and_update().is_empty());
    Ok(())
}

#[tokio::test]
async fn observe_all_seeds_snapshot_from_existing_rows() -> Result<()> {
    let pool = memory_pool().await?;
    let first = CountLedger::new(pool.clone()).await?;
    first.scan(VALID_EAN).await?;

    // A fresh ledger over the same database must show its rows before any
    // mutation goes through it.
    let second = CountLedger::new(pool).await?;
    let snapshot = second.observe_all().borrow().clone();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].ean, VALID_EAN);
    assert_eq!(snapshot[0].quantity, 1);
    Ok(())
}

#[tokio::test]
async fn concurrent_scans_of_one_code_never_lose_increments() -> Result<()> {
    // File-backed pool: in-memory SQLite cannot share state across connections.
    let dir = tempfile::tempdir()?;
    let pool = stockcount_lib::db::open_sqlite_pool(&dir.path().join("ledger.sqlite3")).await?;
    migrate::apply_migrations(&pool).await?;
    let ledger = CountLedger::new(pool).await?;

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let ledger = ledger.clone();
        tasks.push(tokio::spawn(async move { ledger.scan(VALID_EAN).await }));
    }
    for task in tasks {
        task.await??;
    }

    assert_eq!(ledger.get_item(VALID_EAN).await?.unwrap().quantity, 16);
    Ok(())
}

#[tokio::test]
async fn published_snapshot_matches_ledger_after_concurrent_mutations() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let pool = stockcount_lib::db::open_sqlite_pool(&dir.path().join("ledger.sqlite3")).await?;
    migrate::apply_migrations(&pool).await?;
    let ledger = CountLedger::new(pool).await?;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let a = ledger.clone();
        tasks.push(tokio::spawn(async move { a.scan(VALID_EAN).await }));
        let b = ledger.clone();
        tasks.push(tokio::spawn(async move { b.scan(OTHER_EAN).await }));
    }
    for task in tasks {
        task.await??;
    }

    // The last published snapshot is queried after the last commit, so the
    // channel must have converged to the ledger's final state.
    let published = ledger.observe_all().borrow().clone();
    assert_eq!(published, ledger.list_all().await?);
    assert_eq!(published.iter().map(|l| l.quantity).sum::<i64>(), 16);
    Ok(())
}

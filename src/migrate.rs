use sha2::{Digest, Sha256};
use sqlx::{Executor, SqlitePool};
use tracing::info;

static MIGRATIONS: &[(&str, &str)] = &[(
    "202608251400_count_lines.sql",
    include_str!("../migrations/202608251400_count_lines.sql"),
)];

/// Prepared statements take one statement at a time, so migration files are
/// split on `;`. Good enough while no migration embeds a literal semicolon.
fn split_statements(raw_sql: &str) -> Vec<String> {
    raw_sql
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn checksum(raw_sql: &str) -> String {
    let cleaned = raw_sql
        .lines()
        .filter(|line| {
            let t = line.trim_start();
            !(t.is_empty() || t.starts_with("--"))
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("{:x}", Sha256::digest(cleaned.as_bytes()))
}

/// Apply pending migrations, recording each in `schema_migrations` with a
/// checksum so a drifted file is caught instead of silently re-run.
pub async fn apply_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    pool.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (\
           version    TEXT PRIMARY KEY,\
           applied_at INTEGER NOT NULL,\
           checksum   TEXT NOT NULL\
         )",
    )
    .await?;

    for (version, raw_sql) in MIGRATIONS {
        let sum = checksum(raw_sql);
        let recorded: Option<String> =
            sqlx::query_scalar("SELECT checksum FROM schema_migrations WHERE version = ?")
                .bind(version)
                .fetch_optional(pool)
                .await?;
        match recorded {
            Some(existing) if existing == sum => continue,
            Some(existing) => anyhow::bail!(
                "migration {version} changed on disk (recorded {existing}, found {sum})"
            ),
            None => {}
        }

        let mut tx = pool.begin().await?;
        for statement in split_statements(raw_sql) {
            sqlx::query(&statement).execute(&mut *tx).await?;
        }
        sqlx::query(
            "INSERT INTO schema_migrations (version, applied_at, checksum) VALUES (?, ?, ?)",
        )
        .bind(version)
        .bind(crate::time::now_ms())
        .bind(&sum)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        info!(target = "stockcount", event = "migration_applied", version);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> anyhow::Result<SqlitePool> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(pool)
    }

    #[tokio::test]
    async fn migrations_are_idempotent() -> anyhow::Result<()> {
        let pool = memory_pool().await?;
        apply_migrations(&pool).await?;
        apply_migrations(&pool).await?;

        let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&pool)
            .await?;
        assert_eq!(applied, MIGRATIONS.len() as i64);
        Ok(())
    }

    #[tokio::test]
    async fn quantity_check_constraint_holds() -> anyhow::Result<()> {
        let pool = memory_pool().await?;
        apply_migrations(&pool).await?;

        let res = sqlx::query(
            "INSERT INTO count_lines (ean, quantity, updated_at) VALUES ('x', -1, 0)",
        )
        .execute(&pool)
        .await;
        assert!(res.is_err());
        Ok(())
    }
}

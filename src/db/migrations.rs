use anyhow::{bail, Context, Result};
use rusqlite::Connection;

use crate::log_info;

const ENABLE_LOGS: bool = true;

/// Schema scripts in order; entry `n` upgrades `user_version` `n` to `n + 1`.
const MIGRATIONS: &[(&str, &str)] = &[("schema_v1.sql", include_str!("schemas/schema_v1.sql"))];

fn schema_version(conn: &Connection) -> Result<usize> {
    let version: i64 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;
    usize::try_from(version).with_context(|| format!("invalid user_version {version}"))
}

/// Brings the schema up to date inside a single transaction.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let current = schema_version(conn)?;
    let target = MIGRATIONS.len();

    if current > target {
        bail!("database version ({current}) is newer than supported schema ({target})");
    }
    if current == target {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;

    for (index, (name, sql)) in MIGRATIONS.iter().enumerate().skip(current) {
        tx.execute_batch(sql)
            .with_context(|| format!("failed to execute {name}"))?;
        log_info!("Applied migration {name} (schema v{})", index + 1);
    }

    tx.pragma_update(None, "user_version", target as i64)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit migrations")
}

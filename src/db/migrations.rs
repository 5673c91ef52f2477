use anyhow::{bail, Context, Result};
use rusqlite::Connection;

/// Ordered schema steps; `PRAGMA user_version` records the last one applied.
const MIGRATIONS: &[(i32, &str, &str)] = &[(
    1,
    "schema_v1.sql",
    include_str!("schemas/schema_v1.sql"),
)];

fn latest_version() -> i32 {
    MIGRATIONS.last().map(|(version, _, _)| *version).unwrap_or(0)
}

pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let current: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;
    let target = latest_version();

    if current > target {
        bail!("event log schema ({current}) is newer than this build supports ({target})");
    }
    if current == target {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;

    for (version, name, sql) in MIGRATIONS.iter().filter(|(v, _, _)| *v > current) {
        tx.execute_batch(sql)
            .with_context(|| format!("migration to version {version} ({name}) failed"))?;
    }

    tx.pragma_update(None, "user_version", target)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit migrations")?;

    Ok(())
}

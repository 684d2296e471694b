//! Ordered schema scripts for the planner database.
//!
//! Each script runs inside its own transaction together with the matching
//! `user_version` bump, so a database is never left between versions.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// `(version, script)`, strictly increasing.
const MIGRATIONS: &[(u32, &str)] = &[(1, include_str!("0001_kv_entries.sql"))];

pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |(version, _)| *version)
}

/// Brings `conn` up to [`latest_version`].
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = current_user_version(conn)?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::UnsupportedSchemaVersion { found, supported });
    }

    for &(version, script) in MIGRATIONS.iter().filter(|(version, _)| *version > found) {
        let tx = conn.transaction()?;
        tx.execute_batch(script)
            .and_then(|()| tx.pragma_update(None, "user_version", version))
            .map_err(|source| DbError::Migration { version, source })?;
        tx.commit()?;
        info!("event=db_migrate module=db status=ok version={version}");
    }
    Ok(())
}

pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

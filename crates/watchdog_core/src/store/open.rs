//! Connection bootstrap for the SQLite backing store.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Apply connection pragmas and the store format version check before
//!   handing out a usable store.
//!
//! # Invariants
//! - Fresh databases are stamped with [`STORE_FORMAT_VERSION`].
//! - Databases stamped with a newer version are rejected, never modified.

use super::sqlite::SqliteStore;
use super::{StoreError, StoreResult};
use crate::config::StoreConfig;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Layout version of tables written by [`SqliteStore`].
pub const STORE_FORMAT_VERSION: u32 = 1;

/// Opens a SQLite database file as a backing store.
///
/// # Side effects
/// - Creates the file when missing.
/// - Emits `store_open` logging events with duration and status.
pub fn open_store(path: impl AsRef<Path>) -> StoreResult<SqliteStore> {
    open_with(
        "file",
        || Connection::open(path),
        Duration::from_millis(StoreConfig::default().busy_timeout_ms),
    )
}

/// Opens a private in-memory SQLite database as a backing store.
pub fn open_store_in_memory() -> StoreResult<SqliteStore> {
    open_with(
        "memory",
        Connection::open_in_memory,
        Duration::from_millis(StoreConfig::default().busy_timeout_ms),
    )
}

/// Opens the store described by `config`: a file when `path` is set,
/// otherwise an in-memory database.
pub fn open_configured_store(config: &StoreConfig) -> StoreResult<SqliteStore> {
    let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
    match config.path.as_deref() {
        Some(path) => open_with("file", || Connection::open(path), busy_timeout),
        None => open_with("memory", Connection::open_in_memory, busy_timeout),
    }
}

fn open_with<F>(mode: &str, connect: F, busy_timeout: Duration) -> StoreResult<SqliteStore>
where
    F: FnOnce() -> rusqlite::Result<Connection>,
{
    let started_at = Instant::now();
    info!("event=store_open module=store status=start mode={mode}");

    let conn = match connect() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=store_open module=store status=error mode={mode} duration_ms={} error_code=store_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&conn, busy_timeout) {
        Ok(()) => {
            info!(
                "event=store_open module=store status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(SqliteStore::new(conn))
        }
        Err(err) => {
            error!(
                "event=store_open module=store status=error mode={mode} duration_ms={} error_code=store_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &Connection, busy_timeout: Duration) -> StoreResult<()> {
    conn.busy_timeout(busy_timeout)?;

    let current = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    if current > STORE_FORMAT_VERSION {
        return Err(StoreError::UnsupportedFormatVersion {
            store_version: current,
            latest_supported: STORE_FORMAT_VERSION,
        });
    }
    if current < STORE_FORMAT_VERSION {
        conn.execute_batch(&format!("PRAGMA user_version = {STORE_FORMAT_VERSION};"))?;
    }
    Ok(())
}

//! Tabular backing store contracts and implementations.
//!
//! # Responsibility
//! - Define the coarse row primitives the table engine is built on.
//! - Provide a process-local store and a SQLite-backed store.
//!
//! # Invariants
//! - Every cell is exchanged as text; typed interpretation belongs to the
//!   row mapper.
//! - Row positions are 1-based and dense. Position `0` never addresses a row.
//! - A missing row is reported as `None`, never as an error.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod open;
mod sqlite;

pub use memory::MemoryStore;
pub use open::{open_configured_store, open_store, open_store_in_memory, STORE_FORMAT_VERSION};
pub use sqlite::SqliteStore;

/// Row identity inside one table. `0` means "not yet persisted".
pub type RowIndex = u64;

pub type StoreResult<T> = Result<T, StoreError>;

/// One stored row: its position plus raw text cells in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub position: RowIndex,
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new(position: RowIndex, cells: Vec<String>) -> Self {
        Self { position, cells }
    }

    /// Returns the cell at `column`, if the row is that wide.
    pub fn cell(&self, column: usize) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }
}

/// Transport-level failures of a backing store.
#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    TableMissing(String),
    PositionOutOfRange {
        table: String,
        position: RowIndex,
        row_count: u64,
    },
    ColumnCountMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },
    UnsupportedFormatVersion {
        store_version: u32,
        latest_supported: u32,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::TableMissing(table) => write!(f, "table does not exist: {table}"),
            Self::PositionOutOfRange {
                table,
                position,
                row_count,
            } => write!(
                f,
                "row position {position} is out of range for table {table} with {row_count} rows"
            ),
            Self::ColumnCountMismatch {
                table,
                expected,
                actual,
            } => write!(
                f,
                "table {table} has {expected} columns but {actual} cells were supplied"
            ),
            Self::UnsupportedFormatVersion {
                store_version,
                latest_supported,
            } => write!(
                f,
                "store format version {store_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Row-range primitives offered by a tabular backing store.
///
/// Implementations are single-user. Callers that need a read-modify-write
/// sequence to be atomic go through [`BackingStore::upsert_row`].
pub trait BackingStore {
    fn table_exists(&self, table: &str) -> StoreResult<bool>;

    /// Creates `table` with the given column names. No-op when it exists.
    fn create_table(&self, table: &str, columns: &[&str]) -> StoreResult<()>;

    /// Returns every row of `table` in ascending position order.
    fn rows(&self, table: &str) -> StoreResult<Vec<RawRow>>;

    /// Returns the row at `position`, or `None` when no such row exists.
    fn row_at(&self, table: &str, position: RowIndex) -> StoreResult<Option<RawRow>>;

    /// Appends a row and returns its position.
    fn append_row(&self, table: &str, cells: &[String]) -> StoreResult<RowIndex>;

    /// Replaces every cell of the row at `position`.
    fn overwrite_row(&self, table: &str, position: RowIndex, cells: &[String]) -> StoreResult<()>;

    fn row_count(&self, table: &str) -> StoreResult<u64> {
        Ok(self.rows(table)?.len() as u64)
    }

    /// Overwrites the row at `position` when it exists, appends otherwise.
    ///
    /// Returns the position that now holds `cells`.
    fn upsert_row(
        &self,
        table: &str,
        position: Option<RowIndex>,
        cells: &[String],
    ) -> StoreResult<RowIndex> {
        let existing = match position {
            Some(position) if position > 0 => self.row_at(table, position)?,
            _ => None,
        };
        match existing {
            Some(row) => {
                self.overwrite_row(table, row.position, cells)?;
                Ok(row.position)
            }
            None => self.append_row(table, cells),
        }
    }
}

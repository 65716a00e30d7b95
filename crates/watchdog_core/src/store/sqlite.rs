//! SQLite-backed tabular store.
//!
//! # Responsibility
//! - Map logical tables onto SQL tables with one `TEXT` column per field.
//! - Keep the row position in a dedicated integer key column.
//!
//! # Invariants
//! - Every write runs inside a transaction that rolls back on drop.
//! - `upsert_row` performs lookup and write under one `IMMEDIATE`
//!   transaction, so no other writer can slip in between.
//! - Identifiers are always quoted; values are always bound.

use super::{BackingStore, RawRow, RowIndex, StoreError, StoreResult};
use rusqlite::{params, params_from_iter, Connection, Transaction, TransactionBehavior};

const POSITION_COLUMN: &str = "wd_row_pos";

/// Backing store over one owned SQLite connection.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Wraps an already bootstrapped connection.
    ///
    /// Prefer [`crate::store::open_store`] which also applies pragmas and the
    /// format version check.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }
}

impl BackingStore for SqliteStore {
    fn table_exists(&self, table: &str) -> StoreResult<bool> {
        table_exists(&self.conn, table)
    }

    fn create_table(&self, table: &str, columns: &[&str]) -> StoreResult<()> {
        let column_sql = columns
            .iter()
            .map(|column| format!(", {} TEXT NOT NULL", quote_identifier(column)))
            .collect::<String>();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} ({POSITION_COLUMN} INTEGER PRIMARY KEY{column_sql});",
            quote_identifier(table)
        ))?;
        tx.commit()?;
        Ok(())
    }

    fn rows(&self, table: &str) -> StoreResult<Vec<RawRow>> {
        require_table(&self.conn, table)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY {POSITION_COLUMN} ASC;",
            quote_identifier(table)
        ))?;
        let width = stmt.column_count();
        let mut rows = stmt.query([])?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            result.push(read_raw_row(row, width)?);
        }
        Ok(result)
    }

    fn row_at(&self, table: &str, position: RowIndex) -> StoreResult<Option<RawRow>> {
        require_table(&self.conn, table)?;
        select_row(&self.conn, table, position)
    }

    fn append_row(&self, table: &str, cells: &[String]) -> StoreResult<RowIndex> {
        let tx = self.conn.unchecked_transaction()?;
        let position = insert_row(&tx, table, cells)?;
        tx.commit()?;
        Ok(position)
    }

    fn overwrite_row(&self, table: &str, position: RowIndex, cells: &[String]) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        update_row(&tx, table, position, cells)?;
        tx.commit()?;
        Ok(())
    }

    fn row_count(&self, table: &str) -> StoreResult<u64> {
        require_table(&self.conn, table)?;
        let count = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {};", quote_identifier(table)),
            [],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(count as u64)
    }

    fn upsert_row(
        &self,
        table: &str,
        position: Option<RowIndex>,
        cells: &[String],
    ) -> StoreResult<RowIndex> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        require_table(&tx, table)?;
        let existing = match position {
            Some(position) if position > 0 => select_row(&tx, table, position)?,
            _ => None,
        };
        let written = match existing {
            Some(row) => {
                update_row(&tx, table, row.position, cells)?;
                row.position
            }
            None => insert_row(&tx, table, cells)?,
        };
        tx.commit()?;
        Ok(written)
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn require_table(conn: &Connection, table: &str) -> StoreResult<()> {
    if table_exists(conn, table)? {
        Ok(())
    } else {
        Err(StoreError::TableMissing(table.to_string()))
    }
}

/// Returns the data column names of `table`, excluding the position column.
fn data_columns(conn: &Connection, table: &str) -> StoreResult<Vec<String>> {
    require_table(conn, table)?;
    let stmt = conn.prepare(&format!("SELECT * FROM {} LIMIT 0;", quote_identifier(table)))?;
    Ok(stmt
        .column_names()
        .into_iter()
        .filter(|name| *name != POSITION_COLUMN)
        .map(str::to_string)
        .collect())
}

fn check_width(table: &str, columns: &[String], cells: &[String]) -> StoreResult<()> {
    if columns.len() != cells.len() {
        return Err(StoreError::ColumnCountMismatch {
            table: table.to_string(),
            expected: columns.len(),
            actual: cells.len(),
        });
    }
    Ok(())
}

fn read_raw_row(row: &rusqlite::Row<'_>, width: usize) -> StoreResult<RawRow> {
    let position: i64 = row.get(0)?;
    let mut cells = Vec::with_capacity(width.saturating_sub(1));
    for column in 1..width {
        cells.push(row.get::<_, String>(column)?);
    }
    Ok(RawRow::new(position as RowIndex, cells))
}

fn select_row(conn: &Connection, table: &str, position: RowIndex) -> StoreResult<Option<RawRow>> {
    if position == 0 {
        return Ok(None);
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT * FROM {} WHERE {POSITION_COLUMN} = ?1;",
        quote_identifier(table)
    ))?;
    let width = stmt.column_count();
    let mut rows = stmt.query(params![position as i64])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(read_raw_row(row, width)?));
    }

    Ok(None)
}

fn insert_row(conn: &Connection, table: &str, cells: &[String]) -> StoreResult<RowIndex> {
    let columns = data_columns(conn, table)?;
    check_width(table, &columns, cells)?;

    let quoted_table = quote_identifier(table);
    let next: i64 = conn.query_row(
        &format!("SELECT COALESCE(MAX({POSITION_COLUMN}), 0) + 1 FROM {quoted_table};"),
        [],
        |row| row.get(0),
    )?;

    let column_list = std::iter::once(POSITION_COLUMN.to_string())
        .chain(columns.iter().map(|column| quote_identifier(column)))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len() + 1)
        .map(|slot| format!("?{slot}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut values: Vec<rusqlite::types::Value> = Vec::with_capacity(cells.len() + 1);
    values.push(rusqlite::types::Value::Integer(next));
    values.extend(cells.iter().cloned().map(rusqlite::types::Value::Text));

    conn.execute(
        &format!("INSERT INTO {quoted_table} ({column_list}) VALUES ({placeholders});"),
        params_from_iter(values),
    )?;
    Ok(next as RowIndex)
}

fn update_row(conn: &Connection, table: &str, position: RowIndex, cells: &[String]) -> StoreResult<()> {
    let columns = data_columns(conn, table)?;
    check_width(table, &columns, cells)?;

    let assignments = columns
        .iter()
        .enumerate()
        .map(|(slot, column)| format!("{} = ?{}", quote_identifier(column), slot + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let mut values: Vec<rusqlite::types::Value> = cells
        .iter()
        .cloned()
        .map(rusqlite::types::Value::Text)
        .collect();
    values.push(rusqlite::types::Value::Integer(position as i64));

    let changed = conn.execute(
        &format!(
            "UPDATE {} SET {assignments} WHERE {POSITION_COLUMN} = ?{};",
            quote_identifier(table),
            columns.len() + 1
        ),
        params_from_iter(values),
    )?;

    if changed == 0 {
        let row_count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {};", quote_identifier(table)),
            [],
            |row| row.get(0),
        )?;
        return Err(StoreError::PositionOutOfRange {
            table: table.to_string(),
            position,
            row_count: row_count as u64,
        });
    }
    Ok(())
}

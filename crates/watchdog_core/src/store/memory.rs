//! Process-local backing store.
//!
//! Tables live in a `RefCell`-guarded map; borrows are released when each
//! call returns, including on error paths. Not `Sync`.

use super::{BackingStore, RawRow, RowIndex, StoreError, StoreResult};
use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct MemoryTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl MemoryTable {
    fn check_width(&self, table: &str, cells: &[String]) -> StoreResult<()> {
        if cells.len() != self.columns.len() {
            return Err(StoreError::ColumnCountMismatch {
                table: table.to_string(),
                expected: self.columns.len(),
                actual: cells.len(),
            });
        }
        Ok(())
    }
}

/// In-memory tabular store for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RefCell<BTreeMap<String, MemoryTable>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the column names of `table`, if it exists.
    pub fn columns(&self, table: &str) -> Option<Vec<String>> {
        self.tables
            .borrow()
            .get(table)
            .map(|table| table.columns.clone())
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.borrow().keys().cloned().collect()
    }
}

impl BackingStore for MemoryStore {
    fn table_exists(&self, table: &str) -> StoreResult<bool> {
        Ok(self.tables.borrow().contains_key(table))
    }

    fn create_table(&self, table: &str, columns: &[&str]) -> StoreResult<()> {
        self.tables
            .borrow_mut()
            .entry(table.to_string())
            .or_insert_with(|| MemoryTable {
                columns: columns.iter().map(|column| column.to_string()).collect(),
                rows: Vec::new(),
            });
        Ok(())
    }

    fn rows(&self, table: &str) -> StoreResult<Vec<RawRow>> {
        let tables = self.tables.borrow();
        let stored = tables
            .get(table)
            .ok_or_else(|| StoreError::TableMissing(table.to_string()))?;
        Ok(stored
            .rows
            .iter()
            .enumerate()
            .map(|(offset, cells)| RawRow::new(offset as RowIndex + 1, cells.clone()))
            .collect())
    }

    fn row_at(&self, table: &str, position: RowIndex) -> StoreResult<Option<RawRow>> {
        let tables = self.tables.borrow();
        let stored = tables
            .get(table)
            .ok_or_else(|| StoreError::TableMissing(table.to_string()))?;
        if position == 0 {
            return Ok(None);
        }
        Ok(stored
            .rows
            .get((position - 1) as usize)
            .map(|cells| RawRow::new(position, cells.clone())))
    }

    fn append_row(&self, table: &str, cells: &[String]) -> StoreResult<RowIndex> {
        let mut tables = self.tables.borrow_mut();
        let stored = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableMissing(table.to_string()))?;
        stored.check_width(table, cells)?;
        stored.rows.push(cells.to_vec());
        Ok(stored.rows.len() as RowIndex)
    }

    fn overwrite_row(&self, table: &str, position: RowIndex, cells: &[String]) -> StoreResult<()> {
        let mut tables = self.tables.borrow_mut();
        let stored = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableMissing(table.to_string()))?;
        stored.check_width(table, cells)?;
        let row_count = stored.rows.len() as u64;
        let slot = position
            .checked_sub(1)
            .and_then(|offset| stored.rows.get_mut(offset as usize))
            .ok_or_else(|| StoreError::PositionOutOfRange {
                table: table.to_string(),
                position,
                row_count,
            })?;
        *slot = cells.to_vec();
        Ok(())
    }

    fn row_count(&self, table: &str) -> StoreResult<u64> {
        let tables = self.tables.borrow();
        let stored = tables
            .get(table)
            .ok_or_else(|| StoreError::TableMissing(table.to_string()))?;
        Ok(stored.rows.len() as u64)
    }
}

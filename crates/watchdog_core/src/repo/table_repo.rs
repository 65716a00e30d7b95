//! Table engine: typed create/read/insert/merge over a backing store.
//!
//! # Responsibility
//! - Create entity tables with columns in schema order.
//! - Read rows lazily into typed entities, optionally filtered.
//! - Insert new rows and merge (upsert) by row identity.
//!
//! # Invariants
//! - `insert` never creates a missing table.
//! - `merge` updates in place iff a row exists at `entity.index()`; every
//!   other case (unset, zero, out of range) appends.
//! - Filters are validated against the schema before any row is read.

use super::row_mapper::{self, ReferenceResolver};
use crate::model::{Entity, EntityKind};
use crate::query::{Filter, QueryOperator, RowPredicate, UnknownFieldError};
use crate::schema::SchemaError;
use crate::store::{BackingStore, RawRow, RowIndex, StoreError};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

pub type EngineResult<T> = Result<T, EngineError>;

/// Failures surfaced by the table engine and row mapper.
#[derive(Debug)]
pub enum EngineError {
    /// Invalid field metadata; a programming error.
    Schema(SchemaError),
    UnknownField {
        table: &'static str,
        field: String,
    },
    /// A stored cell could not be parsed into its declared type.
    Conversion {
        table: &'static str,
        field: &'static str,
        value: String,
        reason: String,
    },
    /// A reference cell points at a row that does not exist.
    ReferenceResolution {
        table: &'static str,
        field: &'static str,
        reference: String,
    },
    /// A referenced entity has not been persisted, so it has no key.
    UnpersistedReference {
        table: &'static str,
        field: &'static str,
    },
    TableMissing(String),
    Store(StoreError),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema(err) => write!(f, "{err}"),
            Self::UnknownField { table, field } => {
                write!(f, "unknown field `{field}` for table {table}")
            }
            Self::Conversion {
                table,
                field,
                value,
                reason,
            } => write!(
                f,
                "cannot convert `{value}` in {table}.{field}: {reason}"
            ),
            Self::ReferenceResolution {
                table,
                field,
                reference,
            } => write!(f, "reference `{reference}` in {table}.{field} does not resolve"),
            Self::UnpersistedReference { table, field } => write!(
                f,
                "{table}.{field} references an entity that has not been persisted"
            ),
            Self::TableMissing(table) => {
                write!(f, "table {table} does not exist; create it first")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Schema(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SchemaError> for EngineError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<UnknownFieldError> for EngineError {
    fn from(value: UnknownFieldError) -> Self {
        Self::UnknownField {
            table: value.table,
            field: value.field,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::TableMissing(table) => Self::TableMissing(table),
            other => Self::Store(other),
        }
    }
}

/// What `merge` did with an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The row at this position was overwritten.
    Updated(RowIndex),
    /// No row matched the entity index; a new row was appended here.
    Inserted(RowIndex),
}

impl MergeOutcome {
    pub fn position(self) -> RowIndex {
        match self {
            Self::Updated(position) | Self::Inserted(position) => position,
        }
    }
}

/// Typed table operations over one backing store.
pub struct TableEngine<S: BackingStore> {
    store: S,
}

impl<S: BackingStore> TableEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Ensures the table of `T` exists. Idempotent.
    pub fn create_table<T: Entity>(&self) -> EngineResult<()> {
        let columns = T::schema()?.column_names();
        self.create_named_table(T::TABLE_NAME, &columns)
    }

    /// Creates the table of every [`EntityKind`]. Idempotent.
    pub fn bootstrap_all_tables(&self) -> EngineResult<()> {
        for kind in EntityKind::ALL {
            let columns = kind.column_names()?;
            self.create_named_table(kind.table_name(), &columns)?;
        }
        Ok(())
    }

    fn create_named_table(&self, table: &str, columns: &[&str]) -> EngineResult<()> {
        if self.store.table_exists(table)? {
            debug!("event=table_create module=repo status=skipped table={table} reason=exists");
            return Ok(());
        }
        self.store.create_table(table, columns)?;
        info!(
            "event=table_create module=repo status=ok table={table} columns={}",
            columns.len()
        );
        Ok(())
    }

    /// Reads every row of `T`'s table.
    ///
    /// Rows are fetched now; conversion happens as the iterator advances.
    /// Calling again re-reads the current table state.
    pub fn read_all<T: Entity>(&self) -> EngineResult<RowIter<'_, T>> {
        self.read_matching(RowPredicate::match_all())
    }

    /// Reads rows of `T`'s table matching `filter` under `operator`.
    ///
    /// # Errors
    /// - `UnknownField` before anything is read when `filter` names a field
    ///   `T` does not declare.
    pub fn read_filtered<T: Entity>(
        &self,
        filter: &Filter,
        operator: QueryOperator,
    ) -> EngineResult<RowIter<'_, T>> {
        let predicate = filter.compile(T::schema()?, operator)?;
        self.read_matching(predicate)
    }

    fn read_matching<T: Entity>(&self, predicate: RowPredicate) -> EngineResult<RowIter<'_, T>> {
        let rows = self.store.rows(T::TABLE_NAME)?;
        debug!(
            "event=table_read module=repo status=ok table={} rows={}",
            T::TABLE_NAME,
            rows.len()
        );
        Ok(RowIter {
            rows: rows.into_iter(),
            predicate,
            resolver: &self.store,
            _entity: PhantomData,
        })
    }

    /// Reads one entity by row identity.
    pub fn find<T: Entity>(&self, index: RowIndex) -> EngineResult<Option<T>> {
        match self.locate::<T>(index)? {
            Some(row) => Ok(Some(row_mapper::to_entity(&row, &self.store)?)),
            None => Ok(None),
        }
    }

    pub fn count<T: Entity>(&self) -> EngineResult<u64> {
        Ok(self.store.row_count(T::TABLE_NAME)?)
    }

    /// Appends `entity` as a new row and stores the new position in it.
    ///
    /// # Errors
    /// - `TableMissing` when `create_table` has not been called for `T`.
    pub fn insert<T: Entity>(&self, entity: &mut T) -> EngineResult<RowIndex> {
        let cells = row_mapper::to_row(entity)?;
        self.require_table(T::TABLE_NAME)?;
        let position = self.store.append_row(T::TABLE_NAME, &cells)?;
        entity.set_index(position);
        info!(
            "event=table_insert module=repo status=ok table={} position={position}",
            T::TABLE_NAME
        );
        Ok(position)
    }

    /// Updates the row at `entity.index()` or, when there is none, inserts.
    ///
    /// Field values never decide between the two branches. After an insert
    /// the new position is stored in `entity`.
    pub fn merge<T: Entity>(&self, entity: &mut T) -> EngineResult<MergeOutcome> {
        let cells = row_mapper::to_row(entity)?;
        self.require_table(T::TABLE_NAME)?;

        let requested = entity.index();
        let located = self
            .locate::<T>(requested)?
            .map(|row| row.position);
        let written = self.store.upsert_row(T::TABLE_NAME, located, &cells)?;

        let outcome = if located == Some(written) {
            MergeOutcome::Updated(written)
        } else {
            entity.set_index(written);
            MergeOutcome::Inserted(written)
        };
        info!(
            "event=table_merge module=repo status=ok table={} requested={requested} mode={} position={written}",
            T::TABLE_NAME,
            match outcome {
                MergeOutcome::Updated(_) => "update",
                MergeOutcome::Inserted(_) => "insert",
            }
        );
        Ok(outcome)
    }

    /// Row at `index`, or `None` when the index is unset or out of range.
    fn locate<T: Entity>(&self, index: RowIndex) -> EngineResult<Option<RawRow>> {
        if index == 0 {
            return Ok(None);
        }
        Ok(self.store.row_at(T::TABLE_NAME, index)?)
    }

    fn require_table(&self, table: &str) -> EngineResult<()> {
        if self.store.table_exists(table)? {
            return Ok(());
        }
        warn!("event=table_write module=repo status=error table={table} error_code=table_missing");
        Err(EngineError::TableMissing(table.to_string()))
    }
}

/// Lazily converted rows of one table read.
///
/// Each item is converted on demand; a malformed row yields `Err` without
/// ending the iteration, so callers may skip it or stop.
pub struct RowIter<'a, T> {
    rows: std::vec::IntoIter<RawRow>,
    predicate: RowPredicate,
    resolver: &'a dyn ReferenceResolver,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> RowIter<'_, T> {
    /// Collects all rows, stopping at the first conversion failure.
    pub fn collect_strict(self) -> EngineResult<Vec<T>> {
        self.collect()
    }

    /// Collects convertible rows and logs the ones that fail.
    pub fn skip_invalid(self) -> Vec<T> {
        self.filter_map(|item| match item {
            Ok(entity) => Some(entity),
            Err(err) => {
                warn!(
                    "event=row_skip module=repo status=error table={} error={}",
                    T::TABLE_NAME,
                    err
                );
                None
            }
        })
        .collect()
    }
}

impl<T: Entity> Iterator for RowIter<'_, T> {
    type Item = EngineResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        for row in self.rows.by_ref() {
            if self.predicate.matches(&row) {
                return Some(row_mapper::to_entity(&row, self.resolver));
            }
        }
        None
    }
}

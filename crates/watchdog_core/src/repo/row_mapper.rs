//! Conversion between stored rows and typed entities.
//!
//! # Invariants
//! - Cells are read and written in schema column order.
//! - `to_entity(&row_of(to_row(e)))` equals `e` whenever every reference of
//!   `e` resolves to a row with the same field values.

use super::table_repo::{EngineError, EngineResult};
use crate::model::Entity;
use crate::store::{BackingStore, RawRow, RowIndex, StoreError};

/// Looks up rows referenced by another entity's reference cells.
pub trait ReferenceResolver {
    /// Returns the row at `position` in `table`, or `None` when it does not
    /// exist (including when the table itself is missing).
    fn resolve(&self, table: &str, position: RowIndex) -> EngineResult<Option<RawRow>>;
}

impl<S: BackingStore> ReferenceResolver for S {
    fn resolve(&self, table: &str, position: RowIndex) -> EngineResult<Option<RawRow>> {
        match self.row_at(table, position) {
            Ok(row) => Ok(row),
            Err(StoreError::TableMissing(_)) => Ok(None),
            Err(err) => Err(EngineError::Store(err)),
        }
    }
}

/// Builds a `T` from `row`, resolving reference cells through `resolver`.
///
/// # Errors
/// - `Conversion` for a missing cell, a malformed number or a malformed
///   reference key.
/// - `ReferenceResolution` when a referenced row does not exist.
pub fn to_entity<T: Entity>(row: &RawRow, resolver: &dyn ReferenceResolver) -> EngineResult<T> {
    let schema = T::schema()?;
    let mut entity = T::default();

    for field in schema.fields() {
        let cell = row.cell(field.ordinal()).ok_or_else(|| EngineError::Conversion {
            table: schema.table_name(),
            field: field.name(),
            value: String::new(),
            reason: format!(
                "row {} has {} cells, column {} is missing",
                row.position,
                row.cells.len(),
                field.ordinal()
            ),
        })?;
        schema.decode_field(field, &mut entity, cell, resolver)?;
    }

    entity.set_index(row.position);
    Ok(entity)
}

/// Serializes the declared fields of `entity` in column order.
///
/// # Errors
/// - `UnpersistedReference` when a referenced entity has no row yet.
pub fn to_row<T: Entity>(entity: &T) -> EngineResult<Vec<String>> {
    let schema = T::schema()?;
    schema
        .fields()
        .iter()
        .map(|field| schema.encode_field(field, entity))
        .collect()
}

//! Field-equality filters over stored rows.
//!
//! # Responsibility
//! - Hold caller filters as `field name -> expected text`.
//! - Resolve field names against an entity schema before any row is read.
//! - Match raw rows with `And`/`Or` semantics.
//!
//! # Invariants
//! - Comparison is on stored text: `"10"` does not match `"10.0"`.
//! - An empty filter matches every row, for both operators.
//! - Field names are case-sensitive.

use crate::schema::Schema;
use crate::store::RawRow;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// How the conditions of a [`Filter`] combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryOperator {
    /// Every condition must hold.
    #[default]
    And,
    /// At least one condition must hold.
    Or,
}

/// Filter names a field absent from the entity schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFieldError {
    pub table: &'static str,
    pub field: String,
}

impl Display for UnknownFieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown field `{}` for table {}", self.field, self.table)
    }
}

impl Error for UnknownFieldError {}

/// Expected cell text per field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: BTreeMap<String, String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the condition on `field`.
    pub fn with(mut self, field: impl Into<String>, expected: impl Into<String>) -> Self {
        self.insert(field, expected);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, expected: impl Into<String>) {
        self.conditions.insert(field.into(), expected.into());
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.conditions
            .iter()
            .map(|(field, expected)| (field.as_str(), expected.as_str()))
    }

    /// Binds field names to column positions of `schema`.
    ///
    /// # Errors
    /// - `UnknownFieldError` for the first field the schema does not declare.
    pub fn compile<T>(
        &self,
        schema: &Schema<T>,
        operator: QueryOperator,
    ) -> Result<RowPredicate, UnknownFieldError> {
        let conditions = self
            .iter()
            .map(|(field, expected)| {
                schema
                    .column_of(field)
                    .map(|column| (column, expected.to_string()))
                    .ok_or_else(|| UnknownFieldError {
                        table: schema.table_name(),
                        field: field.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RowPredicate {
            conditions,
            operator,
        })
    }
}

impl<K, V> FromIterator<(K, V)> for Filter
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filter = Self::new();
        for (field, expected) in iter {
            filter.insert(field, expected);
        }
        filter
    }
}

/// A filter bound to column positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPredicate {
    conditions: Vec<(usize, String)>,
    operator: QueryOperator,
}

impl RowPredicate {
    /// Predicate that accepts every row.
    pub fn match_all() -> Self {
        Self {
            conditions: Vec::new(),
            operator: QueryOperator::And,
        }
    }

    pub fn matches(&self, row: &RawRow) -> bool {
        if self.conditions.is_empty() {
            return true;
        }
        let mut hits = self
            .conditions
            .iter()
            .map(|(column, expected)| row.cell(*column) == Some(expected.as_str()));
        match self.operator {
            QueryOperator::And => hits.all(|hit| hit),
            QueryOperator::Or => hits.any(|hit| hit),
        }
    }
}

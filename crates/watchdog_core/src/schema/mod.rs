//! Declarative per-entity schemas.
//!
//! # Responsibility
//! - Collect `(ordinal, name, accessor)` declarations through
//!   [`SchemaBuilder`].
//! - Validate ordinals and names once, then expose fields in column order.
//! - Derive structural equality and hashing from the same declarations.
//!
//! # Invariants
//! - Field `i` of a built schema has ordinal `i`; ordinals are unique and
//!   gap-free starting at zero.
//! - Table and field names are plain identifiers. Field names are unique
//!   ignoring ASCII case, since SQL column names are case-insensitive.

use crate::model::{Entity, EntityKind};
use crate::repo::row_mapper::{self, ReferenceResolver};
use crate::repo::{EngineError, EngineResult};
use crate::store::RowIndex;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

mod registry;

pub use registry::{cached_schema_count, schema_of};

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

pub type SchemaResult<T> = Result<T, SchemaError>;

/// Invalid field metadata. Always a programming error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    Empty {
        table: &'static str,
    },
    InvalidIdentifier {
        table: &'static str,
        name: &'static str,
    },
    DuplicateFieldName {
        table: &'static str,
        name: &'static str,
    },
    DuplicateOrdinal {
        table: &'static str,
        ordinal: usize,
        first: &'static str,
        second: &'static str,
    },
    OrdinalGap {
        table: &'static str,
        missing: usize,
    },
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty { table } => write!(f, "schema for {table} declares no fields"),
            Self::InvalidIdentifier { table, name } => {
                write!(f, "schema for {table} uses invalid identifier `{name}`")
            }
            Self::DuplicateFieldName { table, name } => {
                write!(f, "schema for {table} declares field `{name}` twice")
            }
            Self::DuplicateOrdinal {
                table,
                ordinal,
                first,
                second,
            } => write!(
                f,
                "schema for {table} assigns ordinal {ordinal} to both `{first}` and `{second}`"
            ),
            Self::OrdinalGap { table, missing } => {
                write!(f, "schema for {table} leaves column {missing} unmapped")
            }
        }
    }
}

impl Error for SchemaError {}

/// Semantic type of a persisted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    /// Foreign key into another entity table, stored as `<short>:<index>`.
    Reference {
        table: &'static str,
        short_name: &'static str,
    },
}

/// Conversion between one entity member and its text cell.
trait FieldCodec<T>: Send + Sync {
    fn encode(&self, table: &'static str, name: &'static str, entity: &T) -> EngineResult<String>;

    fn decode(
        &self,
        table: &'static str,
        name: &'static str,
        entity: &mut T,
        cell: &str,
        resolver: &dyn ReferenceResolver,
    ) -> EngineResult<()>;

    fn same(&self, left: &T, right: &T) -> bool;

    fn hash_into(&self, entity: &T, state: &mut dyn Hasher);
}

struct TextCodec<T> {
    get: fn(&T) -> &str,
    set: fn(&mut T, String),
}

impl<T> FieldCodec<T> for TextCodec<T> {
    fn encode(&self, _table: &'static str, _name: &'static str, entity: &T) -> EngineResult<String> {
        Ok((self.get)(entity).to_string())
    }

    fn decode(
        &self,
        _table: &'static str,
        _name: &'static str,
        entity: &mut T,
        cell: &str,
        _resolver: &dyn ReferenceResolver,
    ) -> EngineResult<()> {
        (self.set)(entity, cell.to_string());
        Ok(())
    }

    fn same(&self, left: &T, right: &T) -> bool {
        (self.get)(left) == (self.get)(right)
    }

    fn hash_into(&self, entity: &T, mut state: &mut dyn Hasher) {
        (self.get)(entity).hash(&mut state);
    }
}

struct NumberCodec<T> {
    get: fn(&T) -> f64,
    set: fn(&mut T, f64),
}

impl<T> FieldCodec<T> for NumberCodec<T> {
    fn encode(&self, _table: &'static str, _name: &'static str, entity: &T) -> EngineResult<String> {
        Ok((self.get)(entity).to_string())
    }

    fn decode(
        &self,
        table: &'static str,
        name: &'static str,
        entity: &mut T,
        cell: &str,
        _resolver: &dyn ReferenceResolver,
    ) -> EngineResult<()> {
        let value = cell.parse::<f64>().map_err(|err| EngineError::Conversion {
            table,
            field: name,
            value: cell.to_string(),
            reason: err.to_string(),
        })?;
        (self.set)(entity, value);
        Ok(())
    }

    fn same(&self, left: &T, right: &T) -> bool {
        number_bits((self.get)(left)) == number_bits((self.get)(right))
    }

    fn hash_into(&self, entity: &T, mut state: &mut dyn Hasher) {
        number_bits((self.get)(entity)).hash(&mut state);
    }
}

/// Bit pattern used for equality: `-0.0 == 0.0` and all NaNs are one value.
fn number_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

struct ReferenceCodec<T, R> {
    get: fn(&T) -> &R,
    set: fn(&mut T, R),
    _target: PhantomData<fn() -> R>,
}

impl<T, R: Entity> FieldCodec<T> for ReferenceCodec<T, R> {
    fn encode(&self, table: &'static str, name: &'static str, entity: &T) -> EngineResult<String> {
        let target = (self.get)(entity);
        if !target.is_persisted() {
            return Err(EngineError::UnpersistedReference { table, field: name });
        }
        Ok(target.reference_key())
    }

    fn decode(
        &self,
        table: &'static str,
        name: &'static str,
        entity: &mut T,
        cell: &str,
        resolver: &dyn ReferenceResolver,
    ) -> EngineResult<()> {
        let position = parse_reference_key(cell, R::SHORT_NAME).ok_or_else(|| {
            EngineError::Conversion {
                table,
                field: name,
                value: cell.to_string(),
                reason: reference_mismatch::<R>(cell),
            }
        })?;
        let row = resolver.resolve(R::TABLE_NAME, position)?.ok_or_else(|| {
            EngineError::ReferenceResolution {
                table,
                field: name,
                reference: cell.to_string(),
            }
        })?;
        let target = row_mapper::to_entity::<R>(&row, resolver)?;
        (self.set)(entity, target);
        Ok(())
    }

    /// Stored targets compare by row index, unsaved targets by their own
    /// declared fields. A stored and an unsaved target never compare equal.
    fn same(&self, left: &T, right: &T) -> bool {
        let (left, right) = ((self.get)(left), (self.get)(right));
        match (left.is_persisted(), right.is_persisted()) {
            (true, true) => left.index() == right.index(),
            (false, false) => crate::model::entity_eq(left, right),
            _ => false,
        }
    }

    fn hash_into(&self, entity: &T, mut state: &mut dyn Hasher) {
        let target = (self.get)(entity);
        target.is_persisted().hash(&mut state);
        if target.is_persisted() {
            target.index().hash(&mut state);
        } else {
            crate::model::entity_hash(target, &mut state);
        }
    }
}

fn reference_mismatch<R: Entity>(cell: &str) -> String {
    let found = cell
        .split_once(':')
        .and_then(|(tag, _)| EntityKind::from_short_name(tag))
        .filter(|kind| *kind != R::KIND);
    match found {
        Some(kind) => format!(
            "expected `{}:<index>`, found a key into {}",
            R::SHORT_NAME,
            kind.table_name()
        ),
        None => format!("expected `{}:<index>`", R::SHORT_NAME),
    }
}

/// Parses `<short>:<index>` with a positive index.
pub fn parse_reference_key(cell: &str, short_name: &str) -> Option<RowIndex> {
    let (tag, index) = cell.split_once(':')?;
    if tag != short_name {
        return None;
    }
    index.parse::<RowIndex>().ok().filter(|index| *index > 0)
}

/// One declared, persisted field.
pub struct FieldDef<T> {
    ordinal: usize,
    name: &'static str,
    kind: FieldKind,
    codec: Box<dyn FieldCodec<T>>,
}

impl<T> FieldDef<T> {
    /// Column index of this field.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }
}

impl<T> std::fmt::Debug for FieldDef<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDef")
            .field("ordinal", &self.ordinal)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Collects field declarations for one entity type.
pub struct SchemaBuilder<T> {
    table: &'static str,
    fields: Vec<FieldDef<T>>,
}

impl<T: 'static> SchemaBuilder<T> {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            fields: Vec::new(),
        }
    }

    pub fn text(
        mut self,
        ordinal: usize,
        name: &'static str,
        get: fn(&T) -> &str,
        set: fn(&mut T, String),
    ) -> Self {
        self.fields.push(FieldDef {
            ordinal,
            name,
            kind: FieldKind::Text,
            codec: Box::new(TextCodec { get, set }),
        });
        self
    }

    pub fn number(
        mut self,
        ordinal: usize,
        name: &'static str,
        get: fn(&T) -> f64,
        set: fn(&mut T, f64),
    ) -> Self {
        self.fields.push(FieldDef {
            ordinal,
            name,
            kind: FieldKind::Number,
            codec: Box::new(NumberCodec { get, set }),
        });
        self
    }

    pub fn reference<R: Entity>(
        mut self,
        ordinal: usize,
        name: &'static str,
        get: fn(&T) -> &R,
        set: fn(&mut T, R),
    ) -> Self {
        self.fields.push(FieldDef {
            ordinal,
            name,
            kind: FieldKind::Reference {
                table: R::TABLE_NAME,
                short_name: R::SHORT_NAME,
            },
            codec: Box::new(ReferenceCodec {
                get,
                set,
                _target: PhantomData,
            }),
        });
        self
    }

    /// Validates declarations and orders fields by ordinal.
    pub fn build(mut self) -> SchemaResult<Schema<T>> {
        let table = self.table;
        if !IDENTIFIER_RE.is_match(table) {
            return Err(SchemaError::InvalidIdentifier { table, name: table });
        }
        if self.fields.is_empty() {
            return Err(SchemaError::Empty { table });
        }

        for (position, field) in self.fields.iter().enumerate() {
            if !IDENTIFIER_RE.is_match(field.name) {
                return Err(SchemaError::InvalidIdentifier {
                    table,
                    name: field.name,
                });
            }
            if self.fields[..position]
                .iter()
                .any(|earlier| earlier.name.eq_ignore_ascii_case(field.name))
            {
                return Err(SchemaError::DuplicateFieldName {
                    table,
                    name: field.name,
                });
            }
        }

        self.fields.sort_by_key(|field| field.ordinal);
        for pair in self.fields.windows(2) {
            if pair[0].ordinal == pair[1].ordinal {
                return Err(SchemaError::DuplicateOrdinal {
                    table,
                    ordinal: pair[0].ordinal,
                    first: pair[0].name,
                    second: pair[1].name,
                });
            }
        }
        for (column, field) in self.fields.iter().enumerate() {
            if field.ordinal != column {
                return Err(SchemaError::OrdinalGap {
                    table,
                    missing: column,
                });
            }
        }

        Ok(Schema {
            table,
            fields: self.fields,
        })
    }
}

/// Validated, column-ordered field list for one entity type.
pub struct Schema<T> {
    table: &'static str,
    fields: Vec<FieldDef<T>>,
}

impl<T> Schema<T> {
    pub fn table_name(&self) -> &'static str {
        self.table
    }

    /// Fields in column order.
    pub fn fields(&self) -> &[FieldDef<T>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.name).collect()
    }

    /// Column index of `name`. Case-sensitive.
    pub fn column_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.ordinal)
    }

    pub fn fields_equal(&self, left: &T, right: &T) -> bool {
        self.fields
            .iter()
            .all(|field| field.codec.same(left, right))
    }

    pub fn hash_fields<H: Hasher>(&self, entity: &T, state: &mut H) {
        for field in &self.fields {
            field.codec.hash_into(entity, state);
        }
    }

    pub(crate) fn encode_field(&self, field: &FieldDef<T>, entity: &T) -> EngineResult<String> {
        field.codec.encode(self.table, field.name, entity)
    }

    pub(crate) fn decode_field(
        &self,
        field: &FieldDef<T>,
        entity: &mut T,
        cell: &str,
        resolver: &dyn ReferenceResolver,
    ) -> EngineResult<()> {
        field.codec.decode(self.table, field.name, entity, cell, resolver)
    }
}

impl<T> std::fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("table", &self.table)
            .field("fields", &self.fields)
            .finish()
    }
}

//! Persisted domain entities and the contract they share.
//!
//! # Responsibility
//! - Define [`Entity`]: table identity, row identity, witness, short name and
//!   the single field declaration list.
//! - Provide [`EntityKind`] for dispatch on a kind value.
//!
//! # Invariants
//! - `index() == 0` means "not yet persisted".
//! - Equality and hashing come from the schema declaration; the row index is
//!   not a declared field.
//! - A witness is built once per process and never mutated.

use crate::schema::{schema_of, Schema, SchemaBuilder, SchemaResult};
use crate::store::RowIndex;
use std::hash::Hasher;

pub mod asset_allocation;
pub mod asset_class;
pub mod currency;
pub mod fund;
pub mod rating;
pub mod rating_agency;

pub use asset_allocation::AssetAllocationEntry;
pub use asset_class::AssetClass;
pub use currency::Currency;
pub use fund::Fund;
pub use rating::Rating;
pub use rating_agency::RatingAgency;

/// Capability set of every persisted type.
pub trait Entity: Default + Clone + Send + Sync + 'static {
    /// Backing-store table holding rows of this type.
    const TABLE_NAME: &'static str;
    /// Type tag used in reference keys.
    const SHORT_NAME: &'static str;
    const KIND: EntityKind;

    fn index(&self) -> RowIndex;

    fn set_index(&mut self, index: RowIndex);

    /// Shared zero instance of this type.
    fn witness() -> &'static Self;

    /// Declares the persisted fields. Called once per process.
    fn declare(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self>;

    fn schema() -> SchemaResult<&'static Schema<Self>> {
        schema_of::<Self>()
    }

    fn table_name(&self) -> &'static str {
        Self::TABLE_NAME
    }

    fn short_name(&self) -> &'static str {
        Self::SHORT_NAME
    }

    fn is_persisted(&self) -> bool {
        self.index() != 0
    }

    /// Text stored in other rows that reference this entity.
    fn reference_key(&self) -> String {
        format!("{}:{}", Self::SHORT_NAME, self.index())
    }
}

/// Structural equality over declared fields.
///
/// # Panics
/// - When the schema of `T` is invalid, which is a programming error.
pub fn entity_eq<T: Entity>(left: &T, right: &T) -> bool {
    T::schema()
        .expect("entity schema must be valid")
        .fields_equal(left, right)
}

/// Hash consistent with [`entity_eq`].
pub fn entity_hash<T: Entity, H: Hasher>(entity: &T, state: &mut H) {
    T::schema()
        .expect("entity schema must be valid")
        .hash_fields(entity, state);
}

/// Implements `PartialEq`, `Eq` and `Hash` from the entity schema.
macro_rules! impl_entity_equality {
    ($entity:ty) => {
        impl PartialEq for $entity {
            fn eq(&self, other: &Self) -> bool {
                $crate::model::entity_eq(self, other)
            }
        }

        impl Eq for $entity {}

        impl std::hash::Hash for $entity {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                $crate::model::entity_hash(self, state);
            }
        }
    };
}

pub(crate) use impl_entity_equality;

/// Every persisted entity type, as a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Currency,
    RatingAgency,
    Rating,
    AssetClass,
    Fund,
    AssetAllocationEntry,
}

impl EntityKind {
    /// All kinds; referenced kinds come before the kinds referencing them.
    pub const ALL: [EntityKind; 6] = [
        Self::Currency,
        Self::RatingAgency,
        Self::Rating,
        Self::AssetClass,
        Self::Fund,
        Self::AssetAllocationEntry,
    ];

    pub fn table_name(self) -> &'static str {
        match self {
            Self::Currency => Currency::TABLE_NAME,
            Self::RatingAgency => RatingAgency::TABLE_NAME,
            Self::Rating => Rating::TABLE_NAME,
            Self::AssetClass => AssetClass::TABLE_NAME,
            Self::Fund => Fund::TABLE_NAME,
            Self::AssetAllocationEntry => AssetAllocationEntry::TABLE_NAME,
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Self::Currency => Currency::SHORT_NAME,
            Self::RatingAgency => RatingAgency::SHORT_NAME,
            Self::Rating => Rating::SHORT_NAME,
            Self::AssetClass => AssetClass::SHORT_NAME,
            Self::Fund => Fund::SHORT_NAME,
            Self::AssetAllocationEntry => AssetAllocationEntry::SHORT_NAME,
        }
    }

    pub fn from_short_name(short_name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.short_name() == short_name)
    }

    /// Column names of this kind's table, in column order.
    pub fn column_names(self) -> SchemaResult<Vec<&'static str>> {
        Ok(match self {
            Self::Currency => Currency::schema()?.column_names(),
            Self::RatingAgency => RatingAgency::schema()?.column_names(),
            Self::Rating => Rating::schema()?.column_names(),
            Self::AssetClass => AssetClass::schema()?.column_names(),
            Self::Fund => Fund::schema()?.column_names(),
            Self::AssetAllocationEntry => AssetAllocationEntry::schema()?.column_names(),
        })
    }
}

//! Rating agency entity.

use super::{Entity, EntityKind};
use crate::schema::SchemaBuilder;
use crate::store::RowIndex;
use once_cell::sync::Lazy;

static WITNESS: Lazy<RatingAgency> = Lazy::new(RatingAgency::default);

#[derive(Debug, Clone, Default)]
pub struct RatingAgency {
    pub index: RowIndex,
    pub name: String,
}

impl RatingAgency {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            index: 0,
            name: name.into(),
        }
    }
}

impl Entity for RatingAgency {
    const TABLE_NAME: &'static str = "wdt_rating_agencies";
    const SHORT_NAME: &'static str = "rag";
    const KIND: EntityKind = EntityKind::RatingAgency;

    fn index(&self) -> RowIndex {
        self.index
    }

    fn set_index(&mut self, index: RowIndex) {
        self.index = index;
    }

    fn witness() -> &'static Self {
        &WITNESS
    }

    fn declare(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema.text(0, "Name", |a| a.name.as_str(), |a, v| a.name = v)
    }
}

super::impl_entity_equality!(RatingAgency);

//! Currency entity.

use super::{Entity, EntityKind};
use crate::schema::SchemaBuilder;
use crate::store::RowIndex;
use once_cell::sync::Lazy;

static WITNESS: Lazy<Currency> = Lazy::new(Currency::default);

/// A currency identified by its ISO 4217 code.
#[derive(Debug, Clone, Default)]
pub struct Currency {
    pub index: RowIndex,
    /// Upper-case ISO code, e.g. `CHF`.
    pub iso_code: String,
    pub name: String,
}

impl Currency {
    pub fn new(iso_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            index: 0,
            iso_code: iso_code.into(),
            name: name.into(),
        }
    }
}

impl Entity for Currency {
    const TABLE_NAME: &'static str = "wdt_currencies";
    const SHORT_NAME: &'static str = "cur";
    const KIND: EntityKind = EntityKind::Currency;

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
        schema
            .text(0, "IsoCode", |c| c.iso_code.as_str(), |c, v| c.iso_code = v)
            .text(1, "Name", |c| c.name.as_str(), |c, v| c.name = v)
    }
}

super::impl_entity_equality!(Currency);

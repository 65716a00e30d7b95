//! Asset class entity (equities, bonds, ...).

use super::{Entity, EntityKind};
use crate::schema::SchemaBuilder;
use crate::store::RowIndex;
use once_cell::sync::Lazy;

static WITNESS: Lazy<AssetClass> = Lazy::new(AssetClass::default);

#[derive(Debug, Clone, Default)]
pub struct AssetClass {
    pub index: RowIndex,
    pub name: String,
}

impl AssetClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            index: 0,
            name: name.into(),
        }
    }
}

impl Entity for AssetClass {
    const TABLE_NAME: &'static str = "wdt_asset_classes";
    const SHORT_NAME: &'static str = "acl";
    const KIND: EntityKind = EntityKind::AssetClass;

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

super::impl_entity_equality!(AssetClass);

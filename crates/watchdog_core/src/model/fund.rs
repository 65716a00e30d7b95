//! Fund entity.

use super::{Currency, Entity, EntityKind};
use crate::schema::SchemaBuilder;
use crate::store::RowIndex;
use once_cell::sync::Lazy;

static WITNESS: Lazy<Fund> = Lazy::new(Fund::default);

/// An investment fund administered in the watchdog.
#[derive(Debug, Clone, Default)]
pub struct Fund {
    pub index: RowIndex,
    pub name: String,
    pub isin: String,
    pub custody_account_number: String,
    /// Reference currency; stored as a `cur:<index>` key.
    pub currency: Currency,
}

impl Fund {
    pub fn new(
        name: impl Into<String>,
        isin: impl Into<String>,
        custody_account_number: impl Into<String>,
        currency: Currency,
    ) -> Self {
        Self {
            index: 0,
            name: name.into(),
            isin: isin.into(),
            custody_account_number: custody_account_number.into(),
            currency,
        }
    }
}

impl Entity for Fund {
    const TABLE_NAME: &'static str = "wdt_funds";
    const SHORT_NAME: &'static str = "fnd";
    const KIND: EntityKind = EntityKind::Fund;

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
            .text(0, "Name", |f| f.name.as_str(), |f, v| f.name = v)
            .text(1, "Isin", |f| f.isin.as_str(), |f, v| f.isin = v)
            .text(
                2,
                "CustodyAccountNumber",
                |f| f.custody_account_number.as_str(),
                |f, v| f.custody_account_number = v,
            )
            .reference(3, "Currency", |f| &f.currency, |f, v| f.currency = v)
    }
}

super::impl_entity_equality!(Fund);

//! Credit rating entity.
//!
//! A rating couples an agency-specific code (`AA-`, `Baa1`, ...) with the
//! numeric class it maps to in the federal concordance table.

use super::{Entity, EntityKind, RatingAgency};
use crate::schema::SchemaBuilder;
use crate::store::RowIndex;
use once_cell::sync::Lazy;

static WITNESS: Lazy<Rating> = Lazy::new(Rating::default);

#[derive(Debug, Clone, Default)]
pub struct Rating {
    pub index: RowIndex,
    pub rating_code: String,
    /// Concordance class; lower is better.
    pub rating_numeric_value: f64,
    pub agency: RatingAgency,
}

impl Rating {
    pub fn new(rating_code: impl Into<String>, rating_numeric_value: f64, agency: RatingAgency) -> Self {
        Self {
            index: 0,
            rating_code: rating_code.into(),
            rating_numeric_value,
            agency,
        }
    }
}

impl Entity for Rating {
    const TABLE_NAME: &'static str = "wdt_ratings";
    const SHORT_NAME: &'static str = "rat";
    const KIND: EntityKind = EntityKind::Rating;

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
            .text(0, "RatingCode", |r| r.rating_code.as_str(), |r, v| r.rating_code = v)
            .number(
                1,
                "RatingNumericValue",
                |r| r.rating_numeric_value,
                |r, v| r.rating_numeric_value = v,
            )
            .reference(2, "Agency", |r| &r.agency, |r, v| r.agency = v)
    }
}

super::impl_entity_equality!(Rating);

//! Strategic asset allocation entry.
//!
//! # Invariants
//! - One entry describes one `(fund, asset class, currency)` cell of the
//!   allocation grid.
//! - `band_width` is computed and never persisted.

use super::{AssetClass, Currency, Entity, EntityKind, Fund};
use crate::schema::SchemaBuilder;
use crate::store::RowIndex;
use once_cell::sync::Lazy;

static WITNESS: Lazy<AssetAllocationEntry> = Lazy::new(AssetAllocationEntry::default);

/// Strategic minimum/optimum/maximum weights, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AllocationBand {
    pub min: f64,
    pub opt: f64,
    pub max: f64,
}

impl AllocationBand {
    pub fn new(min: f64, opt: f64, max: f64) -> Self {
        Self { min, opt, max }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssetAllocationEntry {
    pub index: RowIndex,
    pub fund: Fund,
    pub asset_class: AssetClass,
    pub currency: Currency,
    pub strategic_min_value: f64,
    pub strategic_opt_value: f64,
    pub strategic_max_value: f64,
}

impl AssetAllocationEntry {
    pub fn new(fund: Fund, asset_class: AssetClass, currency: Currency, band: AllocationBand) -> Self {
        Self {
            index: 0,
            fund,
            asset_class,
            currency,
            strategic_min_value: band.min,
            strategic_opt_value: band.opt,
            strategic_max_value: band.max,
        }
    }

    pub fn band(&self) -> AllocationBand {
        AllocationBand::new(
            self.strategic_min_value,
            self.strategic_opt_value,
            self.strategic_max_value,
        )
    }

    pub fn set_band(&mut self, band: AllocationBand) {
        self.strategic_min_value = band.min;
        self.strategic_opt_value = band.opt;
        self.strategic_max_value = band.max;
    }

    /// Distance between strategic maximum and minimum.
    pub fn band_width(&self) -> f64 {
        self.strategic_max_value - self.strategic_min_value
    }
}

impl Entity for AssetAllocationEntry {
    const TABLE_NAME: &'static str = "wdt_asset_allocation";
    const SHORT_NAME: &'static str = "aae";
    const KIND: EntityKind = EntityKind::AssetAllocationEntry;

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
            .reference(0, "Fund", |e| &e.fund, |e, v| e.fund = v)
            .reference(1, "AssetClass", |e| &e.asset_class, |e, v| e.asset_class = v)
            .reference(2, "Currency", |e| &e.currency, |e, v| e.currency = v)
            .number(
                3,
                "StrategicMinValue",
                |e| e.strategic_min_value,
                |e, v| e.strategic_min_value = v,
            )
            .number(
                4,
                "StrategicOptValue",
                |e| e.strategic_opt_value,
                |e, v| e.strategic_opt_value = v,
            )
            .number(
                5,
                "StrategicMaxValue",
                |e| e.strategic_max_value,
                |e, v| e.strategic_max_value = v,
            )
    }
}

super::impl_entity_equality!(AssetAllocationEntry);

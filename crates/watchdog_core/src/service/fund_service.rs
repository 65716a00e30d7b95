//! Fund administration use-cases.
//!
//! # Responsibility
//! - Validate currency input against stored currencies.
//! - Write fund property edits only when something changed.
//! - Look up and save strategic allocation entries per grid cell.
//!
//! # Invariants
//! - Writes go through `TableEngine::merge`; identity decides update vs
//!   insert.
//! - Currency codes are compared upper-cased.

use crate::model::asset_allocation::AllocationBand;
use crate::model::{AssetAllocationEntry, AssetClass, Currency, Entity, Fund};
use crate::query::{Filter, QueryOperator};
use crate::repo::{EngineError, EngineResult, MergeOutcome, TableEngine};
use crate::store::BackingStore;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type FundServiceResult<T> = Result<T, FundServiceError>;

#[derive(Debug)]
pub enum FundServiceError {
    /// The ISO code matched no stored currency, or more than one.
    CurrencyNotUnique { code: String, matches: usize },
    Engine(EngineError),
}

impl Display for FundServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CurrencyNotUnique { code, matches } => write!(
                f,
                "currency code `{code}` must match exactly one currency, found {matches}"
            ),
            Self::Engine(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FundServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            Self::CurrencyNotUnique { .. } => None,
        }
    }
}

impl From<EngineError> for FundServiceError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// Edited fund properties as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FundChanges {
    pub name: String,
    pub isin: String,
    pub custody_account_number: String,
    pub currency_iso_code: String,
}

/// Fund administration service.
pub struct FundService<S: BackingStore> {
    engine: TableEngine<S>,
}

impl<S: BackingStore> FundService<S> {
    pub fn new(engine: TableEngine<S>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &TableEngine<S> {
        &self.engine
    }

    /// Creates every entity table that does not exist yet.
    pub fn bootstrap(&self) -> EngineResult<()> {
        self.engine.bootstrap_all_tables()
    }

    /// Returns the single currency stored under `code` (case-insensitive).
    ///
    /// # Errors
    /// - `CurrencyNotUnique` when zero or several rows match.
    pub fn currency_by_iso_code(&self, code: &str) -> FundServiceResult<Currency> {
        let mut matches = self.currencies_with_code(code)?;
        if matches.len() != 1 {
            return Err(FundServiceError::CurrencyNotUnique {
                code: normalize_iso_code(code),
                matches: matches.len(),
            });
        }
        Ok(matches.remove(0))
    }

    fn currencies_with_code(&self, code: &str) -> EngineResult<Vec<Currency>> {
        let filter = Filter::new().with("IsoCode", normalize_iso_code(code));
        self.engine
            .read_filtered::<Currency>(&filter, QueryOperator::Or)?
            .collect_strict()
    }

    /// Applies `changes` to `fund` and merges the result when it differs.
    ///
    /// An ISO code without a stored currency keeps the fund's current
    /// currency. Returns the updated fund when a write happened.
    pub fn update_fund_properties(
        &self,
        fund: &Fund,
        changes: &FundChanges,
    ) -> FundServiceResult<Option<Fund>> {
        let currency = self
            .currencies_with_code(&changes.currency_iso_code)?
            .into_iter()
            .next()
            .unwrap_or_else(|| fund.currency.clone());

        let mut candidate = Fund {
            index: fund.index,
            name: changes.name.clone(),
            isin: changes.isin.clone(),
            custody_account_number: changes.custody_account_number.clone(),
            currency,
        };

        if candidate == *fund {
            return Ok(None);
        }
        self.engine.merge(&mut candidate)?;
        Ok(Some(candidate))
    }

    /// Every allocation entry stored for `fund`.
    pub fn allocation_for_fund(&self, fund: &Fund) -> EngineResult<Vec<AssetAllocationEntry>> {
        if !fund.is_persisted() {
            return Ok(Vec::new());
        }
        let filter = Filter::new().with("Fund", fund.reference_key());
        self.engine
            .read_filtered::<AssetAllocationEntry>(&filter, QueryOperator::And)?
            .collect_strict()
    }

    /// The entry of the grid cell `(asset_class, currency)` for `fund`.
    ///
    /// Asset classes match by name, currencies by ISO code.
    pub fn allocation_entry(
        &self,
        fund: &Fund,
        asset_class: &AssetClass,
        currency: &Currency,
    ) -> EngineResult<Option<AssetAllocationEntry>> {
        Ok(self
            .allocation_for_fund(fund)?
            .into_iter()
            .find(|entry| {
                entry.asset_class.name == asset_class.name
                    && entry.currency.iso_code == currency.iso_code
            }))
    }

    /// Stores `band` for one grid cell, updating the existing entry or
    /// inserting a new one.
    pub fn save_allocation(
        &self,
        fund: &Fund,
        asset_class: &AssetClass,
        currency: &Currency,
        band: AllocationBand,
    ) -> EngineResult<AssetAllocationEntry> {
        self.engine.create_table::<AssetAllocationEntry>()?;

        let mut entry = match self.allocation_entry(fund, asset_class, currency)? {
            Some(mut existing) => {
                existing.set_band(band);
                existing
            }
            None => AssetAllocationEntry::new(
                fund.clone(),
                asset_class.clone(),
                currency.clone(),
                band,
            ),
        };

        let outcome = self.engine.merge(&mut entry)?;
        info!(
            "event=allocation_save module=service status=ok fund={} asset_class={} currency={} mode={}",
            fund.index,
            asset_class.name,
            currency.iso_code,
            match outcome {
                MergeOutcome::Updated(_) => "update",
                MergeOutcome::Inserted(_) => "insert",
            }
        );
        Ok(entry)
    }
}

fn normalize_iso_code(code: &str) -> String {
    code.trim().to_uppercase()
}

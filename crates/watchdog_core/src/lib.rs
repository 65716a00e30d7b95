//! Persistence core for the Watchdog fund administration tool.
//!
//! Entities are mapped onto rows of named tables in a tabular backing store
//! through declared schemas, queried with field-equality filters and written
//! with identity-based merge.

pub mod config;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod schema;
pub mod service;
pub mod store;

pub use config::{LogConfig, StoreConfig, WatchdogConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::asset_allocation::AllocationBand;
pub use model::{
    AssetAllocationEntry, AssetClass, Currency, Entity, EntityKind, Fund, Rating, RatingAgency,
};
pub use query::{Filter, QueryOperator};
pub use repo::{EngineError, EngineResult, MergeOutcome, RowIter, TableEngine};
pub use schema::{FieldKind, Schema, SchemaBuilder, SchemaError};
pub use service::fund_service::{FundChanges, FundService, FundServiceError};
pub use store::{
    open_configured_store, open_store, open_store_in_memory, BackingStore, MemoryStore, RawRow,
    RowIndex, SqliteStore, StoreError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

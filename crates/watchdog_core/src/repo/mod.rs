//! Table engine and row mapping over a backing store.
//!
//! # Responsibility
//! - Convert between raw text rows and typed entities.
//! - Orchestrate create/read/insert/merge against a [`crate::store::BackingStore`].
//!
//! # Invariants
//! - Merge decides update-vs-insert by row identity only.
//! - Malformed stored data surfaces as an error, never as a default value.

pub mod row_mapper;
pub mod table_repo;

pub use row_mapper::ReferenceResolver;
pub use table_repo::{EngineError, EngineResult, MergeOutcome, RowIter, TableEngine};

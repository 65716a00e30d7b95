//! Process-wide schema cache.
//!
//! Schemas are built on first use and leaked into `'static` storage. They are
//! never rebuilt or dropped, so repeated lookups for one type return the same
//! reference.

use super::{Schema, SchemaBuilder, SchemaResult};
use crate::model::Entity;
use log::debug;
use once_cell::sync::Lazy;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

type CachedSchema = &'static (dyn Any + Send + Sync);

static SCHEMAS: Lazy<Mutex<HashMap<TypeId, CachedSchema>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Returns the validated schema of `T`, building it on first use.
///
/// # Errors
/// - Returns the `SchemaError` of an invalid declaration. Failed builds are
///   not cached.
pub fn schema_of<T: Entity>() -> SchemaResult<&'static Schema<T>> {
    if let Some(schema) = lookup::<T>() {
        return Ok(schema);
    }

    // Build outside the lock; declarations may name other entity types.
    let built = T::declare(SchemaBuilder::new(T::TABLE_NAME)).build()?;
    let leaked: &'static Schema<T> = Box::leak(Box::new(built));
    let erased: CachedSchema = leaked;

    let mut schemas = SCHEMAS.lock().unwrap_or_else(PoisonError::into_inner);
    let cached = *schemas.entry(TypeId::of::<T>()).or_insert(erased);
    drop(schemas);

    debug!(
        "event=schema_build module=schema status=ok table={} columns={}",
        T::TABLE_NAME,
        leaked.len()
    );

    Ok(cached.downcast_ref::<Schema<T>>().unwrap_or(leaked))
}

/// Number of schemas currently cached.
pub fn cached_schema_count() -> usize {
    SCHEMAS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .len()
}

fn lookup<T: Entity>() -> Option<&'static Schema<T>> {
    let schemas = SCHEMAS.lock().unwrap_or_else(PoisonError::into_inner);
    let cached: CachedSchema = *schemas.get(&TypeId::of::<T>())?;
    cached.downcast_ref::<Schema<T>>()
}

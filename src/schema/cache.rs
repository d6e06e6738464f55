//! Process-wide schema cache.
//!
//! Schemas are built on first use of a record type and never evicted.
//! Entries are immutable after construction, so sharing them across the
//! parallel multi-file reader's tasks is safe.

use crate::common::Result;
use crate::schema::{Record, Schema};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

static SCHEMAS: Lazy<RwLock<HashMap<TypeId, Arc<Schema>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Get the memoized schema for a record type, building it on first use.
///
/// Construction errors (mixed bindings, malformed line-number fields) are
/// not cached; each call re-attempts until construction succeeds.
pub fn schema_of<R: Record>() -> Result<Arc<Schema>> {
    let key = TypeId::of::<R>();

    if let Some(schema) = SCHEMAS.read().get(&key) {
        return Ok(Arc::clone(schema));
    }

    // Built outside the lock; a racing builder produces an identical value
    let schema = Arc::new(R::schema()?);
    let mut map = SCHEMAS.write();
    Ok(Arc::clone(map.entry(key).or_insert(schema)))
}

//! Filters Module
//!
//! Typed filter scopes synchronized between the URL query string, the cache
//! and in-memory state.

mod query;
mod schema;
mod scopes;
mod sync;
mod value;


// Re-export public types
pub use query::{MemoryRouter, QueryParams, QueryRouter};
pub use schema::{FilterDef, FilterSchema, FilterSet, FilterUpdate};
pub use scopes::{
    pools_schema, positions_schema, schema_for, scope_key, DEFAULT_PAGE_SIZE, POOLS_SCOPE,
    POSITIONS_SCOPE,
};
pub use sync::FilterSync;
pub use value::{FilterKind, FilterValue};

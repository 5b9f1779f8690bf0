//! Built-in filter scopes of the dashboard's listing pages.

use super::FilterSchema;

pub const POOLS_SCOPE: &str = "pools";
pub const POSITIONS_SCOPE: &str = "positions";

/// Page size used by both listings.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Cache key under which a scope's last-used filters are stored.
pub fn scope_key(scope: &str) -> String {
    format!("filters:{}", scope)
}

/// Filters of the pool listing.
pub fn pools_schema() -> FilterSchema {
    FilterSchema::new()
        .int("chainId", None)
        .text("protocol", None)
        .text("token", None)
        .text("sortBy", Some("tvl"))
        .int("limit", Some(DEFAULT_PAGE_SIZE))
        .int("offset", Some(0))
        .companion("offset")
}

/// Filters of the wallet position listing.
pub fn positions_schema() -> FilterSchema {
    FilterSchema::new()
        .text("wallet", None)
        .int("chainId", None)
        .text("protocol", None)
        .text("positionStatus", Some("OPEN"))
        .int("limit", Some(DEFAULT_PAGE_SIZE))
        .int("offset", Some(0))
        .param("positionStatus", "status")
        .companion("offset")
}

/// Looks up a built-in scope by name.
pub fn schema_for(scope: &str) -> Option<FilterSchema> {
    match scope {
        POOLS_SCOPE => Some(pools_schema()),
        POSITIONS_SCOPE => Some(positions_schema()),
        _ => None,
    }
}

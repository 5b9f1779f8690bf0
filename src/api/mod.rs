//! API Module
//!
//! HTTP handlers and routing that expose the keyed cache, the filter
//! scopes and the palette generator over REST.
//!
//! # Endpoints
//! - `GET|PUT|DELETE /cache/:key` - Single cache entries
//! - `DELETE /cache` - Bulk clear, optionally by `prefix`
//! - `GET|PATCH|DELETE /filters/:scope` and `POST /filters/:scope/reset`
//! - `GET /palette/:seed` - Theme shades for a seed color
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

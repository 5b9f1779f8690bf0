//! Request and Response models for the state service API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{validate_key, ClearQuery, WriteRequest};
pub use responses::{
    ClearResponse, EntryResponse, FilterStateResponse, HealthResponse, KeyResponse, StatsResponse,
};

//! # API Shared
//!
//! Shared utilities and definitions for the scribe APIs.
//!
//! Contains:
//! - Request and response types with OpenAPI schemas (`dto` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest`; the CLI talks to `scribe-core` directly.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;

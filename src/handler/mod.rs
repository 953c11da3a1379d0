//! Request handler module
//!
//! Responsible for rate limiting, routing, and the `/bfhl` validation and
//! dispatch pipeline.

pub mod bfhl;
pub mod error;
pub mod router;

// Re-export main entry point
pub use error::ApiError;
pub use router::handle_request;

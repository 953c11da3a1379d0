//! HTTP protocol layer module
//!
//! Builds the JSON envelope every endpoint answers with, decoupled from the
//! request pipeline that decides what goes in it.

pub mod response;

// Re-export commonly used types
pub use response::{
    build_error_response, build_health_response, build_success_response, ErrorBody,
    ResponseMeta,
};

//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the
//! invocation envelope and from the handler chain.

pub mod cache;
pub mod encoding;
pub mod mime;
pub mod path;
pub mod response;

// Re-export commonly used types
pub use encoding::TransportBody;
pub use response::{
    build_304_response, build_404_response, build_config_error_response,
    build_permanent_redirect, ActionResponse,
};

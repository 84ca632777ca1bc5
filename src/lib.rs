//! Serverless request core for prerendered web applications
//!
//! Turns action invocation envelopes into HTTP responses: static client and
//! public assets, prerendered pages, then dynamic rendering, with ETag
//! validation and transport encoding of the response body.

pub mod config;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod manifest;
pub mod render;
pub mod routing;
pub mod server;

pub use error::{Error, Result};

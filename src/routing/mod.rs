//! Routing module
//!
//! Matches decoded request paths against the server route table recorded in
//! the manifest.

mod matcher;

pub use matcher::{match_route, RoutePattern};

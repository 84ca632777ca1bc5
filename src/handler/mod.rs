//! Request handler module
//!
//! The handler chain: each resolver either answers a request or declines it,
//! and the dispatcher walks them in a fixed priority order.

pub mod dispatcher;
pub mod prerendered;
pub mod render;
pub mod static_files;

use async_trait::async_trait;

use crate::config::AppState;
use crate::envelope::{InvocationEnvelope, RequestUrl};
use crate::error::Result;
use crate::http::ActionResponse;

// Re-export main entry point
pub use dispatcher::Dispatcher;
pub use prerendered::PrerenderedResolver;
pub use render::DynamicRenderer;
pub use static_files::{AssetRoot, StaticAssetResolver};

/// One link of the handler chain
///
/// `Ok(None)` means "not mine, try the next handler". `Err` is an invocation
/// failure and stops the chain.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn attempt(
        &self,
        state: &AppState,
        url: &RequestUrl,
        envelope: &InvocationEnvelope,
    ) -> Result<Option<ActionResponse>>;
}

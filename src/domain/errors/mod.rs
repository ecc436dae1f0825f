//! Domain error types.

mod cache_error;
mod fetch_error;
mod locator_error;
mod resolve_error;

pub use cache_error::{CacheError, CacheResult};
pub use fetch_error::FetchError;
pub use locator_error::LocatorError;
pub use resolve_error::{ResolveError, ResolveStage};

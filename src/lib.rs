//! Slidecache - URL-keyed disk image cache for slideshow clients.
//!
//! Resolves image locators by serving existing disk cache entries, fetching
//! local resources inline, and fetching network resources in the background,
//! reporting exactly one outcome per request to a listener channel.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing use cases and DTOs.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

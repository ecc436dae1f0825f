//! Domain layer with core entities, errors and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{ImageLocator, LoadOutcome, Resolution};
pub use errors::{FetchError, LocatorError, ResolveError};
pub use ports::FetchPort;

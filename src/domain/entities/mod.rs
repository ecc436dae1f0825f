//! Domain entity definitions.

mod locator;
mod outcome;

pub use locator::{ImageLocator, LOCAL_HOST, Scheme};
pub use outcome::{ImageSource, LoadOutcome, Resolution};

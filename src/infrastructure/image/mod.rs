//! Image handling infrastructure.
//!
//! This module provides:
//! - Decoding with allocation limits and encoding by file suffix
//! - Disk caching keyed by locator host and file name
//! - The resolver deciding between cache, inline fetch and background fetch

pub mod codec;
pub mod disk_cache;
pub mod resolver;

pub use codec::{DecodeLimits, ImageCodec};
pub use disk_cache::{DiskImageCache, DiskUsage};
pub use resolver::{DIAGNOSTICS_TARGET, ImageResolver, ImageResolverConfig, OutcomeSender};

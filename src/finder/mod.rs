//! Bag discovery
//!
//! Walks a directory tree for bag roots, skipping hidden directories and
//! pruning the walk at each discovered bag. The hidden-path policy is a
//! strategy injected at startup so the traversal stays platform-agnostic.

pub mod hidden;
pub mod walk;

#[cfg(windows)]
pub use hidden::FileAttributes;
pub use hidden::{platform_default, HiddenPathFilter, NameConvention};
pub use walk::BagLocator;

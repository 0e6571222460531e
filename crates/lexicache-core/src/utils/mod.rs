//! Utility functions for string comparison, formatting and URL resolution.

pub mod format;
pub mod locator;

// Re-export commonly used functions at module level
pub use format::{cmp_locale, truncate_string};
pub use locator::resolve_locator;

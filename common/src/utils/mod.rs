//! Utility functions and helpers.

pub mod body;
pub mod format_error;
pub mod sanitize;

// Re-export commonly used helpers
pub use body::parse_json;
pub use sanitize::escape_html;

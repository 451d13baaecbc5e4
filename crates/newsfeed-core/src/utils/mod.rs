//! Utility functions for string formatting and manipulation.

pub mod format;

pub use format::{format_date, strip_html, truncate_string};

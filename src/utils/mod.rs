//! Shared utility functions.
//!
//! This module contains reusable utilities used across the codebase:
//! - `text`: whitespace collapsing and char-safe truncation
//! - `fs`: atomic JSON file replacement

mod fs;
mod text;

pub use fs::write_json_atomic;
pub use text::{collapse_whitespace, truncate_chars};

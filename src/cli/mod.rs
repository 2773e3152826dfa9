//! Command-line interface for policyscout.

mod commands;

pub use commands::{is_verbose, run};

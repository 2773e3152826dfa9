//! Data models for policyscout.

mod record;

pub use record::{Category, Record};

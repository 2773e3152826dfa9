//! Service layer for policyscout business logic.
//!
//! This module contains domain logic separated from UI concerns.

pub mod categorize;
pub mod date_detection;
pub mod harvest;
pub mod query;

pub use harvest::{HarvestError, HarvestOutcome, HarvestStage, Harvester, ALERT_TARGET};
pub use query::{find_by_id, RecordFilter};

//! Record pipeline
//!
//! Normalizes raw quote records into aggregation rows and filters out rows
//! that were already forwarded in the current session.

mod dedup;
mod mapper;
mod types;

pub use dedup::Deduplicator;
pub use mapper::RecordMapper;
pub use types::{AggregationRow, SeenKey};

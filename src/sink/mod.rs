//! Aggregation sink module
//!
//! The visualization backend the pipeline feeds: one schema registration,
//! one display configuration, then incremental row batches.

mod memory;
mod parquet;
mod schema;

pub use self::parquet::{read_rows, ParquetSink};
pub use memory::{MemorySink, StockSummary};
pub use schema::{FieldType, Schema, ViewConfig};

use crate::pipeline::AggregationRow;
use thiserror::Error;

/// Aggregation sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// Backend is not initialized or has gone away
    #[error("Sink unavailable: {0}")]
    Unavailable(String),
    /// Update or configure before a schema was registered
    #[error("Schema not registered")]
    SchemaNotRegistered,
    /// Schema registered twice or not understood by the backend
    #[error("Schema rejected: {0}")]
    Schema(String),
    /// Arrow batch could not be built
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    /// Parquet write failed
    #[error("Parquet error: {0}")]
    Parquet(#[from] ::parquet::errors::ParquetError),
    /// Output file could not be opened
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Consumed interface of the aggregation backend
///
/// The backend owns merging rows into its aggregate state and re-rendering.
pub trait AggregationSink: Send {
    /// Declare the row shape. Called once, before anything else.
    fn register_schema(&mut self, schema: &Schema) -> Result<(), SinkError>;

    /// Apply display parameters. Called once, after registration.
    fn configure(&mut self, view: &ViewConfig) -> Result<(), SinkError>;

    /// Merge a non-empty batch of new rows
    fn update(&mut self, rows: &[AggregationRow]) -> Result<(), SinkError>;

    /// Flush and release resources at the end of a session
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: AggregationSink + ?Sized> AggregationSink for Box<S> {
    fn register_schema(&mut self, schema: &Schema) -> Result<(), SinkError> {
        (**self).register_schema(schema)
    }

    fn configure(&mut self, view: &ViewConfig) -> Result<(), SinkError> {
        (**self).configure(view)
    }

    fn update(&mut self, rows: &[AggregationRow]) -> Result<(), SinkError> {
        (**self).update(rows)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        (**self).finish()
    }
}

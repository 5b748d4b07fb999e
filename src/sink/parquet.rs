//! Parquet-backed aggregation sink
//!
//! Persists every forwarded batch so a session can be inspected or replayed
//! into another backend later.

use super::{AggregationSink, FieldType, Schema, SinkError, ViewConfig};
use crate::pipeline::AggregationRow;
use arrow::array::{Array, ArrayRef, Float64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn arrow_type(ty: FieldType) -> DataType {
    match ty {
        FieldType::String => DataType::Utf8,
        FieldType::Float => DataType::Float64,
        FieldType::Date => DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
    }
}

/// Arrow schema for a registered sink schema
pub fn arrow_schema(schema: &Schema) -> Result<ArrowSchema, SinkError> {
    let fields = schema
        .fields()
        .iter()
        .map(|(name, ty)| {
            check_field(name, *ty)?;
            Ok(Field::new(name, arrow_type(*ty), false))
        })
        .collect::<Result<Vec<_>, SinkError>>()?;

    Ok(ArrowSchema::new(fields))
}

/// Only fields an [`AggregationRow`] can populate are accepted
fn check_field(name: &str, ty: FieldType) -> Result<(), SinkError> {
    match (name, ty) {
        ("stock", FieldType::String)
        | ("top_ask_price", FieldType::Float)
        | ("top_bid_price", FieldType::Float)
        | ("timestamp", FieldType::Date) => Ok(()),
        _ => Err(SinkError::Schema(format!("unsupported field {name}: {ty}"))),
    }
}

fn column(name: &str, rows: &[AggregationRow]) -> ArrayRef {
    match name {
        "stock" => Arc::new(StringArray::from(
            rows.iter().map(|r| r.stock.as_str()).collect::<Vec<_>>(),
        )),
        "top_ask_price" => Arc::new(Float64Array::from(
            rows.iter().map(|r| r.top_ask_price).collect::<Vec<_>>(),
        )),
        "top_bid_price" => Arc::new(Float64Array::from(
            rows.iter().map(|r| r.top_bid_price).collect::<Vec<_>>(),
        )),
        _ => Arc::new(
            TimestampMicrosecondArray::from(
                rows.iter()
                    .map(|r| r.timestamp.timestamp_micros())
                    .collect::<Vec<_>>(),
            )
            .with_timezone("UTC"),
        ),
    }
}

/// Writes forwarded rows to a single Parquet file
pub struct ParquetSink {
    path: PathBuf,
    schema: Option<SchemaRef>,
    writer: Option<ArrowWriter<File>>,
    rows_written: usize,
}

impl ParquetSink {
    /// Create a sink writing to `path`; the file is created on registration
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            schema: None,
            writer: None,
            rows_written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

impl AggregationSink for ParquetSink {
    fn register_schema(&mut self, schema: &Schema) -> Result<(), SinkError> {
        if self.schema.is_some() {
            return Err(SinkError::Schema("schema already registered".into()));
        }

        let arrow_schema = Arc::new(arrow_schema(schema)?);

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = File::create(&self.path)?;

        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let writer = ArrowWriter::try_new(file, arrow_schema.clone(), Some(props))?;

        tracing::info!(path = ?self.path, "Opened Parquet sink");

        self.schema = Some(arrow_schema);
        self.writer = Some(writer);
        Ok(())
    }

    fn configure(&mut self, view: &ViewConfig) -> Result<(), SinkError> {
        if self.schema.is_none() {
            return Err(SinkError::SchemaNotRegistered);
        }
        // Nothing to render; keep the view with the file for whoever reads it
        if let Some(writer) = self.writer.as_mut() {
            for (key, value) in view.attributes() {
                writer.append_key_value_metadata(parquet::format::KeyValue::new(
                    format!("view.{key}"),
                    value,
                ));
            }
        }
        Ok(())
    }

    fn update(&mut self, rows: &[AggregationRow]) -> Result<(), SinkError> {
        let (Some(schema), Some(writer)) = (self.schema.as_ref(), self.writer.as_mut()) else {
            return Err(SinkError::SchemaNotRegistered);
        };

        let columns = schema
            .fields()
            .iter()
            .map(|f| column(f.name(), rows))
            .collect::<Vec<_>>();

        let batch = RecordBatch::try_new(schema.clone(), columns)?;
        writer.write(&batch)?;
        self.rows_written += rows.len();

        tracing::debug!(path = ?self.path, count = rows.len(), "Wrote rows to Parquet");
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        if let Some(writer) = self.writer.take() {
            writer.close()?;
            tracing::info!(
                path = ?self.path,
                rows = self.rows_written,
                "Closed Parquet sink"
            );
        }
        Ok(())
    }
}

impl Drop for ParquetSink {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            tracing::error!(error = %e, path = ?self.path, "Failed to close Parquet sink");
        }
    }
}

/// Read rows back from a file written by [`ParquetSink`]
pub fn read_rows(path: impl AsRef<Path>) -> Result<Vec<AggregationRow>, SinkError> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;

        let stocks = typed_column::<StringArray>(&batch, "stock")?;
        let asks = typed_column::<Float64Array>(&batch, "top_ask_price")?;
        let bids = typed_column::<Float64Array>(&batch, "top_bid_price")?;
        let timestamps = typed_column::<TimestampMicrosecondArray>(&batch, "timestamp")?;

        for i in 0..batch.num_rows() {
            let timestamp = DateTime::from_timestamp_micros(timestamps.value(i))
                .ok_or_else(|| SinkError::Schema("invalid timestamp".into()))?;

            rows.push(AggregationRow {
                stock: stocks.value(i).to_string(),
                top_ask_price: asks.value(i),
                top_bid_price: bids.value(i),
                timestamp,
            });
        }
    }

    Ok(rows)
}

fn typed_column<'a, T: Array + 'static>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a T, SinkError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| SinkError::Schema(format!("invalid {name} column")))
}

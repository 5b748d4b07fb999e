//! Sink schema and display configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Column type as understood by the aggregation sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Float,
    Date,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Float => write!(f, "float"),
            FieldType::Date => write!(f, "date"),
        }
    }
}

/// Ordered field declaration registered with a sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<(String, FieldType)>,
}

impl Schema {
    pub fn new(fields: Vec<(String, FieldType)>) -> Self {
        Self { fields }
    }

    /// The fixed shape of [`AggregationRow`](crate::pipeline::AggregationRow)
    pub fn quote_rows() -> Self {
        Self::new(vec![
            ("stock".to_string(), FieldType::String),
            ("top_ask_price".to_string(), FieldType::Float),
            ("top_bid_price".to_string(), FieldType::Float),
            ("timestamp".to_string(), FieldType::Date),
        ])
    }

    pub fn fields(&self) -> &[(String, FieldType)] {
        &self.fields
    }
}

/// Display parameters handed to the sink once after registration
///
/// The core does not interpret these; they are passed through as configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Rendering mode, e.g. `y_line`
    #[serde(default = "default_view")]
    pub view: String,
    /// Fields grouped on rows
    #[serde(default = "default_row_pivots")]
    pub row_pivots: Vec<String>,
    /// Fields split across columns
    #[serde(default = "default_column_pivots")]
    pub column_pivots: Vec<String>,
    /// Fields displayed
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,
    /// Aggregate function per field
    #[serde(default = "default_aggregates")]
    pub aggregates: BTreeMap<String, String>,
}

fn default_view() -> String {
    "y_line".to_string()
}
fn default_row_pivots() -> Vec<String> {
    vec!["timestamp".to_string()]
}
fn default_column_pivots() -> Vec<String> {
    vec!["stock".to_string()]
}
fn default_columns() -> Vec<String> {
    vec!["top_ask_price".to_string()]
}
fn default_aggregates() -> BTreeMap<String, String> {
    [
        ("stock", "distinct count"),
        ("top_ask_price", "avg"),
        ("top_bid_price", "avg"),
        ("timestamp", "distinct count"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            view: default_view(),
            row_pivots: default_row_pivots(),
            column_pivots: default_column_pivots(),
            columns: default_columns(),
            aggregates: default_aggregates(),
        }
    }
}

impl ViewConfig {
    /// Named attributes as JSON-encoded strings, the form widget hosts take
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            ("view", self.view.clone()),
            ("row-pivots", to_json(&self.row_pivots)),
            ("column-pivots", to_json(&self.column_pivots)),
            ("columns", to_json(&self.columns)),
            ("aggregates", to_json(&self.aggregates)),
        ]
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

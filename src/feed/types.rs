//! Quote feed types

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One side of the top of book
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Best price on this side
    pub price: f64,
    /// Size available at that price
    pub size: f64,
}

impl Quote {
    pub fn new(price: f64, size: f64) -> Self {
        Self { price, size }
    }
}

/// A single quote update as reported by the data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    /// Ticker symbol (the wire calls it `stock`)
    #[serde(rename = "stock", alias = "symbol")]
    pub symbol: String,
    /// Best ask, if the source reported one
    #[serde(
        default,
        deserialize_with = "deserialize_side",
        skip_serializing_if = "Option::is_none"
    )]
    pub top_ask: Option<Quote>,
    /// Best bid, if the source reported one
    #[serde(
        default,
        deserialize_with = "deserialize_side",
        skip_serializing_if = "Option::is_none"
    )]
    pub top_bid: Option<Quote>,
    /// Source timestamp of the update
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl QuoteRecord {
    pub fn new(symbol: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            top_ask: None,
            top_bid: None,
            timestamp,
        }
    }

    pub fn with_ask(mut self, price: f64, size: f64) -> Self {
        self.top_ask = Some(Quote::new(price, size));
        self
    }

    pub fn with_bid(mut self, price: f64, size: f64) -> Self {
        self.top_bid = Some(Quote::new(price, size));
        self
    }
}

/// Side as it may appear on the wire: `null`, `{}`, or a partial object
#[derive(Debug, Deserialize)]
struct WireQuote {
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    size: Option<f64>,
}

fn deserialize_side<'de, D>(deserializer: D) -> Result<Option<Quote>, D::Error>
where
    D: Deserializer<'de>,
{
    let wire = Option::<WireQuote>::deserialize(deserializer)?;
    Ok(wire.and_then(|w| {
        w.price.map(|price| Quote {
            price,
            size: w.size.unwrap_or_default(),
        })
    }))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

/// Parse a source timestamp.
///
/// Accepts RFC 3339 as well as the naive `YYYY-MM-DD HH:MM:SS[.ffffff]` form
/// the quote server emits, which is taken to be UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

//! Integration tests for configuration loading

use quote_stream::config::{Config, SinkKind, SourceKind};
use quote_stream::sink::ViewConfig;
use std::path::Path;

#[test]
fn test_config_example_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.toml.example");
    let config = Config::load(path).unwrap();

    assert_eq!(config.source.kind, SourceKind::Http);
    assert_eq!(config.source.base_url, "http://localhost:8080");
    assert_eq!(config.poller.interval_ms, 200);
    assert_eq!(config.poller.max_ticks, 2000);
    assert_eq!(config.sink.kind, SinkKind::Memory);
    assert_eq!(config.view, ViewConfig::default());
}

#[test]
fn test_partial_view_keeps_defaults() {
    let config: Config = toml::from_str(
        r#"
        [view]
        columns = ["top_ask_price", "top_bid_price"]
        "#,
    )
    .unwrap();

    let defaults = ViewConfig::default();
    assert_eq!(config.view.view, defaults.view);
    assert_eq!(config.view.row_pivots, defaults.row_pivots);
    assert_eq!(config.view.aggregates, defaults.aggregates);
    assert_eq!(config.view.columns.len(), 2);
}

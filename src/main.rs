use anyhow::Context;
use clap::Parser;
use quote_stream::cli::{Cli, Commands};
use quote_stream::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load_optional(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?
    {
        Some(config) => config,
        None => {
            eprintln!("Warning: Config file {} not found", cli.config);
            eprintln!("Using default configuration");
            Config::default()
        }
    };

    // Initialize telemetry
    let _telemetry = quote_stream::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Stream(args) => {
            tracing::info!("Starting stream session");
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Source: {:?} {} (timeout {}ms)",
                config.source.kind, config.source.base_url, config.source.request_timeout_ms
            );
            if let Some(file) = &config.source.replay_file {
                println!("  Replay file: {}", file.display());
            }
            println!(
                "  Poller: every {}ms, max {} ticks",
                config.poller.interval_ms, config.poller.max_ticks
            );
            match config.dedup.max_keys {
                Some(max) => println!("  Dedup: keep {} keys", max),
                None => println!("  Dedup: unbounded"),
            }
            println!(
                "  View: {} rows={:?} columns={:?}",
                config.view.view, config.view.row_pivots, config.view.columns
            );
            println!("  Sink: {:?} {:?}", config.sink.kind, config.sink.output);
            println!(
                "  Telemetry: level={} format={:?} metrics_port={:?}",
                config.telemetry.log_level, config.telemetry.log_format, config.telemetry.metrics_port
            );
        }
    }

    Ok(())
}

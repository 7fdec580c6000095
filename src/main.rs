use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Use the library instead of redeclaring modules
use ott_core::{
    config::Config,
    loop_channel::LoopPhase,
    state::Engine,
};

#[derive(Parser)]
#[command(name = "ott-core")]
#[command(version)]
#[command(about = "OTT client core: catalog resolution, watch progress, loop-channel scheduling")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Advance the loop channel this many times and log what would play
    #[arg(long, value_name = "N", default_value_t = 0)]
    loop_preview: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with specified level
    let log_filter = format!("ott_core={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting OTT core v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);
    if let Err(message) = config.validate() {
        anyhow::bail!("Invalid configuration: {message}");
    }

    let mut engine = Engine::new(config);
    engine
        .load_catalog()
        .await
        .context("Could not load the catalog; check connectivity and retry")?;

    info!(
        "Catalog ready: {} titles, {} entities indexed, {} featured",
        engine.titles().len(),
        engine.index().len(),
        engine.featured().len()
    );
    info!(
        "Continue watching: {} resumable entries",
        engine.continue_watching().len()
    );

    if cli.loop_preview > 0 {
        preview_loop(&mut engine, cli.loop_preview);
    }

    Ok(())
}

/// Dry-run the loop channel: advance N times and log what each step plays
fn preview_loop<C: ott_core::utils::http_client::CatalogHttpClient>(
    engine: &mut Engine<C>,
    steps: usize,
) {
    let scheduler = engine.loop_scheduler_mut();
    if scheduler.is_idle() {
        info!("Loop channel is idle (no rotation items resolved)");
        return;
    }

    for step in 1..=steps {
        scheduler.advance();
        match scheduler.phase() {
            LoopPhase::AdBreak => match scheduler.pick_ad() {
                Some(ad) => info!("step {step}: ad break - {} ({}s)", ad.label, ad.duration_sec),
                None => info!("step {step}: ad break"),
            },
            LoopPhase::Playing => {
                if let Some(item) = scheduler.current() {
                    info!("step {step}: {} [{}]", item.label, item.playback_id);
                }
            }
            LoopPhase::Idle => break,
        }
    }
}

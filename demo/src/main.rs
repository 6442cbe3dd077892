use clap::Parser;
use countdown::{LifecycleOwner, StrategyKind, sink::Surface, sink::TextSink};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use trace_err::*;
use tracing::info;

mod config;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Strategies to run, separated by ','. Defaults to the configured ones
    #[arg(short, long, value_delimiter = ',')]
    strategy: Vec<StrategyKind>,

    /// Tear everything down after this long, finished or not
    #[arg(short, long)]
    teardown_after: Option<humantime::Duration>,

    /// The spacing between ticks
    #[arg(short, long, default_value = "1s")]
    interval: humantime::Duration,
}

/// Prints every update on its own line.
struct Console;

impl Surface for Console {
    fn set_text(&self, text: &str) {
        println!("{text}");
    }
}

fn init_logging(log_level: &str) -> anyhow::Result<()> {
    let log_level = log_level.parse::<tracing_subscriber::filter::LevelFilter>()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .with_target(
            log_level > tracing_subscriber::filter::LevelFilter::from_level(tracing::Level::INFO),
        )
        .init();
    Ok(())
}

#[cfg(unix)]
async fn terminated() {
    tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .trace_expect("Failed to register signal handlers")
        .recv()
        .await;
}

#[cfg(not(unix))]
async fn terminated() {
    std::future::pending().await
}

async fn finished(owner: &LifecycleOwner) {
    let mut poll = tokio::time::interval(Duration::from_millis(100));
    while owner.is_busy() {
        poll.tick().await;
    }
}

async fn teardown_timer(delay: Option<Duration>) {
    match delay {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending().await,
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = config::load(args.config)?;

    init_logging(&config.log_level)?;

    let strategies = if args.strategy.is_empty() {
        config.strategies
    } else {
        args.strategy
    };
    config.countdown.interval = args.interval.into();

    let owner = LifecycleOwner::from_config(&config.countdown)?;
    info!("Started countdown host on '{}'", owner.delivery().name());

    for kind in strategies {
        owner.start(kind, Arc::new(TextSink::new(kind.label(), Console)));
    }

    // The background runtime also hosts the signal handlers
    let handle = owner.scheduler().handle().clone();
    handle.block_on(async {
        tokio::select! {
            _ = terminated() => info!("Received terminate signal, stopping..."),
            _ = tokio::signal::ctrl_c() => info!("Received CTRL+C, stopping..."),
            _ = teardown_timer(args.teardown_after.map(Into::into)) => info!("Teardown delay elapsed, stopping..."),
            _ = finished(&owner) => info!("All countdowns finished"),
        }
    });

    owner.shutdown();
    info!("Stopped");
    Ok(())
}

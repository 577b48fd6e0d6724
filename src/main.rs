//! Command-line driver: batch log + stream log in, flagged purchases out

use anyhow::{Context, Result};
use clap::Parser;
use rust_purchase_anomaly_detector::log_io;
use rust_purchase_anomaly_detector::ErrorPolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "purchase-anomaly-detector",
    about = "Flags purchases far above the recent spending of a customer's social network",
    version,
    long_about = None
)]
struct Cli {
    /// Batch log: configuration record followed by the initial events
    batch_log: PathBuf,

    /// Stream log: events checked for anomalous purchases
    stream_log: PathBuf,

    /// Output file for flagged purchases (one JSON object per line)
    flagged_log: PathBuf,

    /// Skip events the engine rejects (unknown friendships, bad amounts)
    /// instead of stopping
    #[arg(long)]
    skip_invalid: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Print the top spenders around this timestamp ("%Y-%m-%d %H:%M:%S")
    #[cfg(feature = "ranking")]
    #[arg(long)]
    rank_at: Option<String>,

    /// Days on either side of --rank-at to include
    #[cfg(feature = "ranking")]
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(i64).range(0..=36_500))]
    rank_days: i64,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let policy = if cli.skip_invalid {
        ErrorPolicy::Skip
    } else {
        ErrorPolicy::Abort
    };

    let (engine, summary) = log_io::run(&cli.batch_log, &cli.stream_log, &cli.flagged_log, policy)
        .with_context(|| {
            format!(
                "processing {} and {}",
                cli.batch_log.display(),
                cli.stream_log.display()
            )
        })?;

    tracing::info!(
        flagged = summary.flagged,
        output = %cli.flagged_log.display(),
        stats = ?engine.stats(),
        "Done"
    );

    #[cfg(feature = "ranking")]
    if let Some(reference) = &cli.rank_at {
        let ranking = engine
            .top_spenders(reference, cli.rank_days)
            .context("ranking spenders")?;
        for (rank, spender) in ranking.iter().enumerate() {
            println!("{:>3}. {} {:.2}", rank + 1, spender.customer_id, spender.total);
        }
    }

    Ok(())
}

//! Plot the throughput and packet loss trace written by the sender.
//!
//! Run with:  `RUST_LOG=debug perf_plot -f perf.txt -o perf.svg`

use anyhow::{Context, Result};
use perf_plot::plot::parse_cli;
use perf_plot::PerfTrace;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (perfin, imgout) = parse_cli();
    tracing::info!(
        "read data from {} and plot to {}",
        perfin.display(),
        imgout.display()
    );
    let trace = PerfTrace::from_csv(&perfin)
        .with_context(|| format!("loading {}", perfin.display()))?;
    trace
        .plot(&imgout)
        .with_context(|| format!("plotting to {}", imgout.display()))?;
    Ok(())
}

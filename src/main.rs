use std::path::PathBuf;
use std::time::Duration;

use chokepoint::app::{Monitor, TickOutcome};
use chokepoint::config::{self, load_config, load_config_from_path};
use chokepoint::format::COLUMN_HEADER;
use chokepoint::logsink::LogSink;
use chokepoint::system::collector::SystemProvider;
use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "chokepoint",
    about = "Prints one line per tick naming the system's bottleneck resource and its worst offender"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tick interval in milliseconds
    #[arg(long)]
    interval: Option<u64>,

    /// Tab-delimited output without column smoothing, for machine consumption
    #[arg(long, default_value_t = false)]
    tabs: bool,

    /// Mirror each line, with a timestamp, to this append-only file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Stop after this many rendered lines (run forever when omitted)
    #[arg(long)]
    ticks: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);

    let mut monitor = Monitor::new(SystemProvider::new(), config.output.tabs);
    if monitor.degraded() {
        tracing::warn!(
            "per-process counters lack PID-qualified labels; offender search degrades to name keying"
        );
    }
    monitor
        .prime()
        .wrap_err("initial counter collection failed")?;

    let mut sink = match &config.output.log_file {
        Some(path) => Some(
            LogSink::open(path)
                .wrap_err_with(|| format!("cannot open log file {}", path.display()))?,
        ),
        None => None,
    };

    if !config.output.tabs {
        println!("{COLUMN_HEADER}");
        if let Some(sink) = sink.as_mut()
            && let Err(err) = sink.write_line(COLUMN_HEADER)
        {
            tracing::warn!(%err, "log mirror write failed");
        }
    }

    let interval = Duration::from_millis(config.general.interval_ms.max(1));
    let retry = Duration::from_millis(config.general.retry_interval_ms.max(1));
    let mut sleep_for = interval;
    let mut remaining = cli.ticks;
    if remaining == Some(0) {
        return Ok(());
    }

    loop {
        tokio::time::sleep(sleep_for).await;
        match monitor.tick() {
            TickOutcome::Rendered(line) => {
                sleep_for = interval;
                println!("{line}");
                if let Some(sink) = sink.as_mut()
                    && let Err(err) = sink.write_line(&line)
                {
                    tracing::warn!(%err, "log mirror write failed");
                }
                if let Some(n) = remaining.as_mut() {
                    *n -= 1;
                    if *n == 0 {
                        break;
                    }
                }
            }
            TickOutcome::Abandoned => {
                tracing::debug!("tick abandoned, retrying shortly");
                sleep_for = retry;
            }
        }
    }

    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> config::Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(interval) = cli.interval {
        config.general.interval_ms = interval;
    }
    if cli.tabs {
        config.output.tabs = true;
    }
    if let Some(ref path) = cli.log_file {
        config.output.log_file = Some(path.clone());
    }

    config
}

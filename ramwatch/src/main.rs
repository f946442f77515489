//! ramwatch
//!
//! Memory pressure monitor. Warns first, then enables swap as available
//! RAM runs low; disables swap again once there is comfortable room.

use anyhow::{Context, Result};
use clap::Parser;

use ramwatch::cli::Cli;
use ramwatch::monitor::{is_privileged, resolve_mode};
use ramwatch::{logging, stats, style, MonitorLoop, Settings, SystemActions};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose)?;

    let settings = Settings::load(cli.config.as_deref(), &cli.overrides())
        .context("Failed to load configuration")?;

    let mode = resolve_mode(
        is_privileged(),
        cli.assume_yes,
        &mut std::io::stdin().lock(),
        &mut std::io::stdout(),
    )?;

    let mut monitor = MonitorLoop::new(
        &settings,
        stats::from_kind(settings.source),
        SystemActions::new(&settings.warning),
        style::for_color(settings.color),
    )
    .with_mode(mode);

    monitor
        .preflight()
        .context("Memory stats source is not readable")?;
    tracing::info!(mode = ?monitor.mode(), interval = ?settings.interval, "Monitor ready");

    if cli.once {
        monitor.run_once().await?;
        return Ok(());
    }

    monitor
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Cannot listen for Ctrl+C, run until killed");
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}

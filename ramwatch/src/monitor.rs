//! Monitor loop
//!
//! Each tick samples memory, renders the status line, evaluates the
//! threshold policy and dispatches whatever fired. The end-of-tick sleep
//! is the only point where the loop waits and the only place shutdown is
//! observed.

use std::future::Future;
use std::io::{BufRead, Write};
use std::time::Duration;

use crate::actions::{dispatch, ActionSink};
use crate::config::Settings;
use crate::error::{MonitorError, Result};
use crate::policy::ThresholdPolicy;
use crate::render::BarRenderer;
use crate::stats::StatSource;
use crate::style::TextStyling;
use crate::types::{Decision, MemorySnapshot};

/// Whether decisions are carried out or only reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Full,
    /// Privileges are missing; decisions are logged, never dispatched
    RenderOnly,
}

/// What happened during one tick
#[derive(Debug, Default)]
pub struct TickReport {
    /// Status line, when logging is enabled
    pub line: Option<String>,
    pub decisions: Vec<Decision>,
    pub failures: Vec<(Decision, MonitorError)>,
}

pub struct MonitorLoop<S, A, T> {
    source: S,
    sink: A,
    renderer: BarRenderer<T>,
    policy: ThresholdPolicy,
    interval: Duration,
    log: bool,
    mode: Mode,
}

impl<S, A, T> MonitorLoop<S, A, T>
where
    S: StatSource,
    A: ActionSink,
    T: TextStyling,
{
    pub fn new(settings: &Settings, source: S, sink: A, styling: T) -> Self {
        Self {
            source,
            sink,
            renderer: BarRenderer::new(settings.thresholds, settings.style, styling),
            policy: ThresholdPolicy::new(settings.thresholds),
            interval: settings.interval,
            log: settings.log,
            mode: Mode::Full,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Read the source once before looping; a failure here is fatal
    pub fn preflight(&mut self) -> Result<MemorySnapshot> {
        let snapshot = self.source.get()?;
        tracing::debug!(
            total = snapshot.ram_total(),
            available = snapshot.ram_available(),
            swap = snapshot.swap_used(),
            "Stats source ready"
        );
        Ok(snapshot)
    }

    /// Run a single sample/render/decide/dispatch cycle
    ///
    /// Returns `StatsUnavailable` when the source could not be read; action
    /// failures are collected in the report instead.
    pub async fn tick(&mut self) -> Result<TickReport> {
        let snapshot = self.source.get()?;

        let line = self.log.then(|| self.renderer.render(&snapshot));
        let decisions = self.policy.decide(&snapshot);
        let mut failures = Vec::new();

        for &decision in &decisions {
            match self.mode {
                Mode::RenderOnly => {
                    tracing::info!(%decision, "Render-only mode, not dispatching");
                }
                Mode::Full => match dispatch(&self.sink, decision).await {
                    Ok(()) => tracing::info!(%decision, "Dispatched"),
                    Err(e) => {
                        tracing::warn!(%decision, error = %e, "Action failed, will retry next tick");
                        failures.push((decision, e));
                    }
                },
            }
        }

        Ok(TickReport {
            line,
            decisions,
            failures,
        })
    }

    /// Tick once and print the status line
    pub async fn run_once(&mut self) -> Result<TickReport> {
        let report = self.tick().await?;
        if let Some(line) = &report.line {
            println!("{}", line);
        }
        Ok(report)
    }

    /// Tick repeatedly until `shutdown` resolves
    ///
    /// Returns the number of ticks attempted.
    pub async fn run_until<F>(&mut self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            mode = ?self.mode,
            "Starting monitor loop"
        );
        tokio::pin!(shutdown);

        let mut ticks = 0u64;
        loop {
            ticks += 1;
            if let Err(e) = self.run_once().await {
                tracing::warn!(error = %e, "Skipping tick");
            }

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(ticks, "Shutdown requested, stopping monitor");
                    return ticks;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

// ============================================================================
// Privileges
// ============================================================================

/// Whether this process may toggle swap (effective uid 0)
pub fn is_privileged() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

const PRIVILEGE_PROMPT: &str =
    "WARNING: ramwatch requires root to manage swap usage. Continue anyway? (y/n) ";

/// Decide the run mode, prompting once when privileges are missing
pub fn resolve_mode<R, W>(privileged: bool, assume_yes: bool, input: &mut R, output: &mut W) -> Result<Mode>
where
    R: BufRead,
    W: Write,
{
    if privileged {
        return Ok(Mode::Full);
    }
    if assume_yes {
        tracing::warn!("Not running as root, continuing in render-only mode");
        return Ok(Mode::RenderOnly);
    }
    confirm_degraded(input, output)
}

/// Ask the operator whether to continue without swap control
pub fn confirm_degraded<R, W>(input: &mut R, output: &mut W) -> Result<Mode>
where
    R: BufRead,
    W: Write,
{
    let prompt_failed = |e: std::io::Error| {
        MonitorError::InsufficientPrivilege(format!("could not ask for confirmation: {}", e))
    };

    output.write_all(PRIVILEGE_PROMPT.as_bytes()).map_err(prompt_failed)?;
    output.flush().map_err(prompt_failed)?;

    let mut answer = String::new();
    input.read_line(&mut answer).map_err(prompt_failed)?;

    if answer.trim() == "y" {
        tracing::warn!("Continuing in render-only mode at operator request");
        Ok(Mode::RenderOnly)
    } else {
        Err(MonitorError::InsufficientPrivilege(
            "not running as root and the operator declined to continue".into(),
        ))
    }
}

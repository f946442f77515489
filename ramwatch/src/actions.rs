//! Action execution
//!
//! [`SystemActions`] toggles swap with `swapon -a` / `swapoff -a` and runs
//! the configured warning command. Both swap commands skip devices that
//! are already in the requested state, so repeating them is harmless.

use std::ffi::OsString;
use std::process::Stdio;

use async_trait::async_trait;
use sysinfo::System;
use tokio::process::Command;

use crate::config::{ReapConfig, WarningConfig};
use crate::error::{MonitorError, Result};
use crate::types::Decision;

/// Executes policy decisions
///
/// Every method must succeed without effect when the system is already in
/// the requested state.
#[async_trait]
pub trait ActionSink: Send + Sync {
    async fn enable_swap(&self) -> Result<()>;

    async fn disable_swap(&self) -> Result<()>;

    async fn warn_operator(&self) -> Result<()>;
}

/// Route one decision to the matching sink method
pub async fn dispatch<A: ActionSink + ?Sized>(sink: &A, decision: Decision) -> Result<()> {
    match decision {
        Decision::DisableSwap => sink.disable_swap().await,
        Decision::EnableSwap => sink.enable_swap().await,
        Decision::Warn => sink.warn_operator().await,
    }
}

#[async_trait]
impl<A: ActionSink + ?Sized> ActionSink for Box<A> {
    async fn enable_swap(&self) -> Result<()> {
        (**self).enable_swap().await
    }

    async fn disable_swap(&self) -> Result<()> {
        (**self).disable_swap().await
    }

    async fn warn_operator(&self) -> Result<()> {
        (**self).warn_operator().await
    }
}

// ============================================================================
// System commands
// ============================================================================

/// Runs real commands on the host
pub struct SystemActions {
    swap_on: Vec<String>,
    swap_off: Vec<String>,
    warning: Vec<String>,
    reaper: Option<ProcessReaper>,
}

impl SystemActions {
    pub fn new(config: &WarningConfig) -> Self {
        let mut warning = Vec::new();
        if let Some(user) = &config.as_user {
            warning.extend(["sudo".to_string(), "-u".to_string(), user.clone()]);
        }
        warning.extend(config.command.iter().cloned());

        Self {
            swap_on: vec!["swapon".into(), "-a".into()],
            swap_off: vec!["swapoff".into(), "-a".into()],
            warning,
            reaper: config.reap.as_ref().map(ProcessReaper::new),
        }
    }

    /// Replace the swap toggling commands
    pub fn with_swap_commands(mut self, swap_on: Vec<String>, swap_off: Vec<String>) -> Self {
        self.swap_on = swap_on;
        self.swap_off = swap_off;
        self
    }

    pub fn warning_command(&self) -> &[String] {
        &self.warning
    }
}

/// Run a command to completion, failing on spawn error or non-zero exit
async fn run(argv: &[String]) -> Result<()> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| MonitorError::action("empty command"))?;

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| MonitorError::action(format!("{}: {}", program, e)))?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(MonitorError::action(format!(
            "{} exited with {}: {}",
            argv.join(" "),
            output.status,
            stderr.trim()
        )))
    }
}

#[async_trait]
impl ActionSink for SystemActions {
    async fn enable_swap(&self) -> Result<()> {
        run(&self.swap_on).await
    }

    async fn disable_swap(&self) -> Result<()> {
        run(&self.swap_off).await
    }

    async fn warn_operator(&self) -> Result<()> {
        let shown = run(&self.warning).await;

        if let Some(reaper) = &self.reaper {
            let killed = reaper.reap();
            if killed > 0 {
                tracing::info!(process = %reaper.process.to_string_lossy(), killed, "Reaped stale processes");
            }
        }

        shown
    }
}

// ============================================================================
// Process reaper
// ============================================================================

/// Kills all but the oldest few processes with a given name
pub struct ProcessReaper {
    process: OsString,
    spare: usize,
}

impl ProcessReaper {
    pub fn new(config: &ReapConfig) -> Self {
        Self {
            process: OsString::from(&config.process),
            spare: config.spare,
        }
    }

    /// Kill matching processes beyond the spared ones; returns how many were signalled
    pub fn reap(&self) -> usize {
        let system = System::new_all();

        let candidates: Vec<(u64, &sysinfo::Process)> = system
            .processes()
            .values()
            .filter(|p| p.name() == self.process.as_os_str())
            .map(|p| (p.start_time(), p))
            .collect();

        select_victims(candidates, self.spare)
            .into_iter()
            .filter(|p| {
                let killed = p.kill();
                if !killed {
                    tracing::debug!(pid = %p.pid(), "Failed to signal process");
                }
                killed
            })
            .count()
    }
}

/// Order by start time and drop the `spare` oldest
fn select_victims<T>(mut candidates: Vec<(u64, T)>, spare: usize) -> Vec<T> {
    candidates.sort_by_key(|(started, _)| *started);
    candidates.into_iter().skip(spare).map(|(_, p)| p).collect()
}

//! Memory counter collection

use std::collections::HashMap;
use std::path::PathBuf;

use sysinfo::System;

use crate::config::SourceKind;
use crate::error::{MonitorError, Result};
use crate::types::MemorySnapshot;

/// Produces a fresh [`MemorySnapshot`] on demand
pub trait StatSource: Send {
    fn get(&mut self) -> Result<MemorySnapshot>;
}

/// Build the source selected in configuration
pub fn from_kind(kind: SourceKind) -> Box<dyn StatSource> {
    match kind {
        SourceKind::Meminfo => Box::new(MeminfoSource::new()),
        SourceKind::Sysinfo => Box::new(SysinfoSource::new()),
    }
}

impl<S: StatSource + ?Sized> StatSource for Box<S> {
    fn get(&mut self) -> Result<MemorySnapshot> {
        (**self).get()
    }
}

// ============================================================================
// /proc/meminfo
// ============================================================================

/// Reads the kernel's meminfo table
pub struct MeminfoSource {
    path: PathBuf,
}

impl MeminfoSource {
    pub fn new() -> Self {
        Self::with_path("/proc/meminfo")
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for MeminfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl StatSource for MeminfoSource {
    fn get(&mut self) -> Result<MemorySnapshot> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            MonitorError::stats(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        snapshot_from_meminfo(&parse_meminfo(&text)?)
    }
}

/// Parse meminfo text into field name -> bytes
///
/// Lines are `Name: <n> kB` (scaled by 1024) or `Name: <n>` (a raw count).
pub fn parse_meminfo(text: &str) -> Result<HashMap<String, u64>> {
    let mut fields = HashMap::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let (name, value) = match parts.as_slice() {
            [name, value, "kB"] => (*name, parse_count(line, value)?.checked_mul(1024)),
            [name, value] => (*name, Some(parse_count(line, value)?)),
            _ => return Err(MonitorError::stats(format!("malformed meminfo line: {:?}", line))),
        };
        let value =
            value.ok_or_else(|| MonitorError::stats(format!("value overflows: {:?}", line)))?;

        let name = name
            .strip_suffix(':')
            .ok_or_else(|| MonitorError::stats(format!("missing ':' in meminfo line: {:?}", line)))?;
        if fields.insert(name.to_string(), value).is_some() {
            return Err(MonitorError::stats(format!("duplicate meminfo field: {}", name)));
        }
    }

    Ok(fields)
}

fn parse_count(line: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| MonitorError::stats(format!("non-numeric meminfo value: {:?}", line)))
}

fn snapshot_from_meminfo(fields: &HashMap<String, u64>) -> Result<MemorySnapshot> {
    let field = |name: &str| {
        fields
            .get(name)
            .copied()
            .ok_or_else(|| MonitorError::stats(format!("meminfo is missing {}", name)))
    };

    let ram_free = field("MemFree")?;
    let ram_cached = field("Cached")?;
    let ram_total = field("MemTotal")?;
    let swap_used = field("SwapTotal")?.saturating_sub(field("SwapFree")?);
    MemorySnapshot::new(ram_free, ram_cached, ram_total, swap_used)
}

// ============================================================================
// sysinfo
// ============================================================================

/// Portable source backed by the sysinfo crate
///
/// sysinfo does not expose the page cache directly, so cached is
/// approximated as `available - free`.
pub struct SysinfoSource {
    system: System,
}

impl SysinfoSource {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl StatSource for SysinfoSource {
    fn get(&mut self) -> Result<MemorySnapshot> {
        self.system.refresh_memory();

        snapshot_from_counters(
            self.system.total_memory(),
            self.system.free_memory(),
            self.system.available_memory(),
            self.system.used_swap(),
        )
    }
}

fn snapshot_from_counters(
    total: u64,
    free: u64,
    available: u64,
    swap_used: u64,
) -> Result<MemorySnapshot> {
    let cached = available.saturating_sub(free);
    MemorySnapshot::new(free, cached, total, swap_used)
}

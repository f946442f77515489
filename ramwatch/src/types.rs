//! Core value types shared by the renderer, policy and loop

use std::fmt;

use crate::error::{MonitorError, Result};

/// Bytes in one mebibyte
pub const MIB: u64 = 1 << 20;

/// Convert a byte count to mebibytes for display
pub fn to_mib(bytes: u64) -> f64 {
    bytes as f64 / MIB as f64
}

/// One reading of the host memory counters, all in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySnapshot {
    ram_free: u64,
    ram_cached: u64,
    ram_total: u64,
    swap_used: u64,
}

impl MemorySnapshot {
    /// Build a snapshot, rejecting counters that cannot describe real memory
    pub fn new(ram_free: u64, ram_cached: u64, ram_total: u64, swap_used: u64) -> Result<Self> {
        if ram_total == 0 {
            return Err(MonitorError::stats("total RAM reported as zero"));
        }
        let available = ram_free
            .checked_add(ram_cached)
            .ok_or_else(|| MonitorError::stats("free + cached overflows"))?;
        if available > ram_total {
            return Err(MonitorError::stats(format!(
                "free + cached ({} bytes) exceeds total RAM ({} bytes)",
                available, ram_total
            )));
        }

        Ok(Self {
            ram_free,
            ram_cached,
            ram_total,
            swap_used,
        })
    }

    pub fn ram_free(&self) -> u64 {
        self.ram_free
    }

    pub fn ram_cached(&self) -> u64 {
        self.ram_cached
    }

    pub fn ram_total(&self) -> u64 {
        self.ram_total
    }

    pub fn swap_used(&self) -> u64 {
        self.swap_used
    }

    /// Bytes the OS could reclaim without paging (free + cached)
    pub fn ram_available(&self) -> u64 {
        self.ram_free + self.ram_cached
    }
}

/// An action the threshold policy asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Decision {
    DisableSwap,
    EnableSwap,
    Warn,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::DisableSwap => "disable_swap",
            Decision::EnableSwap => "enable_swap",
            Decision::Warn => "warn",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Hysteresis threshold policy
//!
//! A pure function of the current snapshot and the thresholds. Whether swap
//! is currently on is tracked by the OS, not here; the action sink must
//! treat repeated enable/disable requests as no-ops.

use crate::config::ThresholdConfig;
use crate::types::{Decision, MemorySnapshot};

#[derive(Debug, Clone, Copy)]
pub struct ThresholdPolicy {
    thresholds: ThresholdConfig,
}

impl ThresholdPolicy {
    pub fn new(thresholds: ThresholdConfig) -> Self {
        Self { thresholds }
    }

    /// Decisions that fire for this snapshot, in dispatch order
    ///
    /// - `DisableSwap`: swap is in use and everything in it would fit in
    ///   available RAM with `disable_swap_above` bytes to spare.
    /// - `EnableSwap`: available RAM is below `enable_swap_below`.
    /// - `Warn`: available RAM is below `warn_below`.
    pub fn decide(&self, snapshot: &MemorySnapshot) -> Vec<Decision> {
        let available = snapshot.ram_available();
        let swap_used = snapshot.swap_used();
        let mut decisions = Vec::new();

        if swap_used > 0
            && swap_used.saturating_add(self.thresholds.disable_swap_above()) < available
        {
            decisions.push(Decision::DisableSwap);
        }
        if available < self.thresholds.enable_swap_below() {
            decisions.push(Decision::EnableSwap);
        }
        if available < self.thresholds.warn_below() {
            decisions.push(Decision::Warn);
        }

        decisions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MIB;

    const GIB: u64 = 1024 * MIB;

    fn policy() -> ThresholdPolicy {
        ThresholdPolicy::new(ThresholdConfig::new(350 * MIB, 400 * MIB, 600 * MIB).unwrap())
    }

    fn snap(free: u64, cached: u64, swap: u64) -> MemorySnapshot {
        MemorySnapshot::new(free, cached, GIB, swap).unwrap()
    }

    #[test]
    fn test_low_memory_warns_and_enables_swap() {
        let decisions = policy().decide(&snap(100 * MIB, 100 * MIB, 0));
        assert_eq!(decisions, vec![Decision::EnableSwap, Decision::Warn]);
    }

    #[test]
    fn test_plenty_of_memory_disables_swap() {
        let decisions = policy().decide(&snap(500 * MIB, 200 * MIB, 50 * MIB));
        assert_eq!(decisions, vec![Decision::DisableSwap]);
    }

    #[test]
    fn test_hysteresis_gap_holds_swap() {
        // 150 + 600 is not below 700: swap stays on even though RAM is fine
        let decisions = policy().decide(&snap(500 * MIB, 200 * MIB, 150 * MIB));
        assert!(decisions.is_empty());

        // exactly at the margin does not fire either
        let decisions = policy().decide(&snap(500 * MIB, 200 * MIB, 100 * MIB));
        assert!(decisions.is_empty());
    }

    #[test]
    fn test_warn_only_band() {
        let decisions = policy().decide(&snap(200 * MIB, 180 * MIB, 0));
        assert_eq!(decisions, vec![Decision::Warn]);
    }

    #[test]
    fn test_boundaries_are_strict() {
        assert!(policy().decide(&snap(400 * MIB, 0, 0)).is_empty());
        assert_eq!(policy().decide(&snap(350 * MIB, 0, 0)), vec![Decision::Warn]);
    }

    #[test]
    fn test_never_disables_without_swap() {
        for free in (0..=1024).step_by(64) {
            let decisions = policy().decide(&snap(free * MIB, 0, 0));
            assert!(!decisions.contains(&Decision::DisableSwap));
        }
    }

    #[test]
    fn test_enable_implies_warn() {
        let configs = [(0, 0, 0), (100, 100, 100), (350, 400, 600), (10, 900, 1000)];
        for (enable, warn, disable) in configs {
            let policy = ThresholdPolicy::new(
                ThresholdConfig::new(enable * MIB, warn * MIB, disable * MIB).unwrap(),
            );
            for free in (0..=1024).step_by(16) {
                for swap in [0, 10 * MIB, 4 * GIB] {
                    let decisions = policy.decide(&snap(free * MIB, 0, swap));
                    if decisions.contains(&Decision::EnableSwap) {
                        assert!(decisions.contains(&Decision::Warn));
                    }
                }
            }
        }
    }

    #[test]
    fn test_huge_swap_does_not_overflow() {
        let decisions = policy().decide(&snap(GIB, 0, u64::MAX));
        assert!(decisions.is_empty());
    }
}

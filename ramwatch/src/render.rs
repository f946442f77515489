//! Status line rendering
//!
//! Turns a [`MemorySnapshot`] into one line of text:
//!
//! ```text
//! 2026-01-02 03:04:05 [::::::::......    ]  200.00 / 1024.00 mb ram,   50.00 mb swap ====
//! ```
//!
//! All bar arithmetic is truncating integer math so the RAM bar is always
//! exactly `width` characters.

use chrono::{Local, NaiveDateTime};

use crate::config::{BarStyleConfig, Color, ThresholdConfig};
use crate::style::TextStyling;
use crate::types::{to_mib, MemorySnapshot};

/// Scale `bytes` into characters, where `total` bytes span `width` characters
fn scale(bytes: u64, total: u64, width: usize) -> usize {
    let chars = u128::from(bytes) * width as u128 / u128::from(total.max(1));
    usize::try_from(chars).unwrap_or(usize::MAX)
}

/// Lengths of the three RAM bar segments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamSegments {
    pub used: usize,
    pub cached: usize,
    pub free: usize,
}

impl RamSegments {
    pub fn compute(snapshot: &MemorySnapshot, width: usize) -> Self {
        let total = snapshot.ram_total();
        let cached = scale(snapshot.ram_cached(), total, width).min(width);
        let free = scale(snapshot.ram_free(), total, width).min(width - cached);
        Self {
            used: width - cached - free,
            cached,
            free,
        }
    }
}

/// Length of the swap bar, at the RAM bar's bytes-per-character ratio.
///
/// Not clamped to the bar width: swap larger than RAM draws a longer bar.
pub fn swap_len(snapshot: &MemorySnapshot, width: usize) -> usize {
    scale(snapshot.swap_used(), snapshot.ram_total(), width)
}

/// Character offsets where the warn and swap zones begin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneOffsets {
    pub warn: usize,
    pub swap: usize,
    pub end: usize,
}

impl ZoneOffsets {
    pub fn compute(thresholds: &ThresholdConfig, ram_total: u64, width: usize) -> Self {
        let warn = width.saturating_sub(scale(thresholds.warn_below(), ram_total, width));
        let swap = width.saturating_sub(scale(thresholds.enable_swap_below(), ram_total, width));
        debug_assert!(warn <= swap && swap <= width);
        Self {
            warn,
            swap,
            end: width,
        }
    }
}

/// Severity band of the available-memory reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamZone {
    Ok,
    Warn,
    Swap,
}

impl RamZone {
    pub fn classify(available: u64, thresholds: &ThresholdConfig) -> Self {
        if available < thresholds.enable_swap_below() {
            RamZone::Swap
        } else if available < thresholds.warn_below() {
            RamZone::Warn
        } else {
            RamZone::Ok
        }
    }
}

/// Renders status lines with a fixed style and threshold set
pub struct BarRenderer<T> {
    thresholds: ThresholdConfig,
    style: BarStyleConfig,
    styling: T,
}

impl<T: TextStyling> BarRenderer<T> {
    pub fn new(thresholds: ThresholdConfig, style: BarStyleConfig, styling: T) -> Self {
        Self {
            thresholds,
            style,
            styling,
        }
    }

    /// Render a line stamped with the current local time
    pub fn render(&self, snapshot: &MemorySnapshot) -> String {
        self.render_at(snapshot, Local::now().naive_local())
    }

    pub fn render_at(&self, snapshot: &MemorySnapshot, timestamp: NaiveDateTime) -> String {
        let colors = &self.style.colors;

        let ram_bar = self.ram_bar(snapshot);
        let swap_bar = self.styling.colorize(
            colors.swap_used,
            &repeat(self.style.swap.as_char(), swap_len(snapshot, self.style.width())),
        );

        let available = snapshot.ram_available();
        let available_color = match RamZone::classify(available, &self.thresholds) {
            RamZone::Ok => colors.ram_ok,
            RamZone::Warn => colors.ram_warn,
            RamZone::Swap => colors.ram_swap,
        };
        let available_str = self
            .styling
            .colorize(available_color, &format!("{:7.2}", to_mib(available)));

        let swap_color = if snapshot.swap_used() > 0 {
            colors.swap_used
        } else {
            colors.swap_unused
        };
        let swap_str = self
            .styling
            .colorize(swap_color, &format!("{:7.2}", to_mib(snapshot.swap_used())));

        format!(
            "{} [{}] {} / {:7.2} mb ram, {} mb swap {}",
            timestamp.format("%Y-%m-%d %H:%M:%S"),
            ram_bar,
            available_str,
            to_mib(snapshot.ram_total()),
            swap_str,
            swap_bar
        )
    }

    /// The RAM bar (used, cached, free) painted by zone
    fn ram_bar(&self, snapshot: &MemorySnapshot) -> String {
        let width = self.style.width();
        let segments = RamSegments::compute(snapshot, width);

        let glyphs: Vec<char> = std::iter::repeat(self.style.used.as_char())
            .take(segments.used)
            .chain(std::iter::repeat(self.style.cached.as_char()).take(segments.cached))
            .chain(std::iter::repeat(self.style.free.as_char()).take(segments.free))
            .collect();

        let zones = ZoneOffsets::compute(&self.thresholds, snapshot.ram_total(), width);
        let colors = &self.style.colors;
        let spans: [(Color, &[char]); 3] = [
            (colors.ram_ok, &glyphs[..zones.warn]),
            (colors.ram_warn, &glyphs[zones.warn..zones.swap]),
            (colors.ram_swap, &glyphs[zones.swap..zones.end]),
        ];

        spans
            .iter()
            .map(|(color, span)| {
                let text: String = span.iter().collect();
                self.styling.colorize(*color, &text)
            })
            .collect()
    }
}

fn repeat(glyph: char, len: usize) -> String {
    std::iter::repeat(glyph).take(len).collect()
}

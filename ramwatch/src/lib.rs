//! ramwatch library
//!
//! Samples host memory on a fixed interval, prints a proportional status
//! bar, warns the operator when available RAM runs low and toggles swap
//! with a hysteresis gap so it does not flap.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use ramwatch::{MonitorLoop, Settings, SystemActions, MeminfoSource, PlainStyling};
//!
//! let settings = Settings::default();
//! let sink = SystemActions::new(&settings.warning);
//! let mut monitor = MonitorLoop::new(&settings, MeminfoSource::new(), sink, PlainStyling);
//! let report = monitor.tick().await?;
//! ```
//!
//! # Usage as Binary
//!
//! Run as root: `ramwatch`, or `ramwatch --once --no-color` for a single line.

pub mod actions;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod policy;
pub mod render;
pub mod stats;
pub mod style;
pub mod types;

pub use actions::{ActionSink, ProcessReaper, SystemActions};
pub use config::{BarStyleConfig, Color, Glyph, Settings, ThresholdConfig, ZoneColors};
pub use error::{MonitorError, Result};
pub use monitor::{Mode, MonitorLoop, TickReport};
pub use policy::ThresholdPolicy;
pub use render::BarRenderer;
pub use stats::{MeminfoSource, StatSource, SysinfoSource};
pub use style::{AnsiStyling, PlainStyling, TextStyling};
pub use types::{Decision, MemorySnapshot};

//! CLI argument definitions

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::{Color, Glyph, Overrides, SourceKind};

#[derive(Parser, Debug)]
#[command(name = "ramwatch")]
#[command(about = "Watch memory pressure: warn when RAM runs low, toggle swap with hysteresis")]
pub struct Cli {
    /// Config file (default: nearest .ramwatch.toml, then ~/.config/ramwatch/config.toml)
    #[arg(long, env = "RAMWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run a single check and exit
    #[arg(long)]
    pub once: bool,

    /// Continue in render-only mode without asking when not root
    #[arg(short = 'y', long)]
    pub assume_yes: bool,

    /// Increase verbosity (-v debug, -vv trace). Default is info.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Seconds between checks
    #[arg(long, env = "RAMWATCH_INTERVAL")]
    pub interval: Option<f64>,

    /// Enable swap when available RAM drops below this many bytes
    #[arg(long, env = "RAMWATCH_ENABLE_SWAP_BELOW")]
    pub enable_swap_below: Option<u64>,

    /// Warn when available RAM drops below this many bytes
    #[arg(long, env = "RAMWATCH_WARN_BELOW")]
    pub warn_below: Option<u64>,

    /// Disable swap when available RAM exceeds swap in use by this many bytes
    #[arg(long, env = "RAMWATCH_DISABLE_SWAP_ABOVE")]
    pub disable_swap_above: Option<u64>,

    /// Where memory counters are read from
    #[arg(long, value_enum, env = "RAMWATCH_SOURCE")]
    pub source: Option<SourceKind>,

    /// Do not print status lines
    #[arg(long)]
    pub no_log: bool,

    /// Do not color status lines
    #[arg(long)]
    pub no_color: bool,

    /// Width of the RAM bar in characters
    #[arg(long)]
    pub bar_width: Option<usize>,

    /// Character for RAM in use
    #[arg(long)]
    pub used_glyph: Option<Glyph>,

    /// Character for cached RAM
    #[arg(long)]
    pub cached_glyph: Option<Glyph>,

    /// Character for free RAM
    #[arg(long)]
    pub free_glyph: Option<Glyph>,

    /// Character for swap in use
    #[arg(long)]
    pub swap_glyph: Option<Glyph>,

    #[arg(long)]
    pub ram_ok_color: Option<Color>,

    #[arg(long)]
    pub ram_warn_color: Option<Color>,

    #[arg(long)]
    pub ram_swap_color: Option<Color>,

    #[arg(long)]
    pub swap_unused_color: Option<Color>,

    #[arg(long)]
    pub swap_used_color: Option<Color>,

    /// Show the warning window as this unprivileged user
    #[arg(long, env = "RAMWATCH_WARN_AS_USER")]
    pub warn_as_user: Option<String>,
}

impl Cli {
    /// Values that override the config file
    pub fn overrides(&self) -> Overrides {
        Overrides {
            interval_secs: self.interval,
            enable_swap_below: self.enable_swap_below,
            warn_below: self.warn_below,
            disable_swap_above: self.disable_swap_above,
            log: self.no_log.then_some(false),
            color: self.no_color.then_some(false),
            source: self.source,
            bar_width: self.bar_width,
            used_glyph: self.used_glyph,
            cached_glyph: self.cached_glyph,
            free_glyph: self.free_glyph,
            swap_glyph: self.swap_glyph,
            ram_ok_color: self.ram_ok_color,
            ram_warn_color: self.ram_warn_color,
            ram_swap_color: self.ram_swap_color,
            swap_unused_color: self.swap_unused_color,
            swap_used_color: self.swap_used_color,
            warn_as_user: self.warn_as_user.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_from_flags() {
        let cli = Cli::try_parse_from([
            "ramwatch",
            "--warn-below",
            "1000",
            "--swap-glyph",
            "#",
            "--ram-ok-color",
            "blue",
            "--no-log",
            "--source",
            "sysinfo",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.warn_below, Some(1000));
        assert_eq!(overrides.swap_glyph, Some(Glyph::new('#')));
        assert_eq!(overrides.ram_ok_color, Some(Color::Blue));
        assert_eq!(overrides.log, Some(false));
        assert_eq!(overrides.color, None);
        assert_eq!(overrides.source, Some(SourceKind::Sysinfo));
    }

    #[test]
    fn test_bad_glyph_and_color_rejected() {
        assert!(Cli::try_parse_from(["ramwatch", "--used-glyph", "ab"]).is_err());
        assert!(Cli::try_parse_from(["ramwatch", "--swap-used-color", "Orange"]).is_err());
    }
}

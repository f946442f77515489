//! Configuration loading and validation
//!
//! Values come from built-in defaults, then an optional `.ramwatch.toml`,
//! then command-line overrides. The merged result is validated once into
//! an immutable [`Settings`]; nothing downstream re-checks it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{MonitorError, Result};
use crate::types::MIB;

const CONFIG_FILE_NAME: &str = ".ramwatch.toml";

/// Find a config file by walking up the directory tree, then checking global config.
///
/// Search order:
/// 1. Current directory and parent directories (walking up to root)
/// 2. Global config at ~/.config/ramwatch/config.toml
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join("ramwatch").join("config.toml");
        if global_path.exists() {
            return Some(global_path);
        }
    }

    None
}

// ============================================================================
// Palette and glyphs
// ============================================================================

/// The eight basic terminal colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    pub const ALL: [Color; 8] = [
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Magenta,
        Color::Cyan,
        Color::White,
    ];

    /// Offset from the base foreground/background escape code (30/40)
    pub fn ansi_offset(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Black => "Black",
            Color::Red => "Red",
            Color::Green => "Green",
            Color::Yellow => "Yellow",
            Color::Blue => "Blue",
            Color::Magenta => "Magenta",
            Color::Cyan => "Cyan",
            Color::White => "White",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Color {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        Color::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = Color::ALL.iter().map(|c| c.name()).collect();
                MonitorError::config(format!(
                    "unknown color '{}' (expected one of {})",
                    s,
                    names.join(", ")
                ))
            })
    }
}

impl TryFrom<String> for Color {
    type Error = MonitorError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// A single character used to draw one bar segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Glyph(char);

impl Glyph {
    pub const fn new(c: char) -> Self {
        Self(c)
    }

    pub fn as_char(self) -> char {
        self.0
    }
}

impl FromStr for Glyph {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Glyph(c)),
            _ => Err(MonitorError::config(format!(
                "glyph must be exactly one character, got {:?}",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Glyph {
    type Error = MonitorError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Where memory counters are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Parse /proc/meminfo directly
    #[default]
    Meminfo,
    /// Use the sysinfo crate (portable, derives cached from available - free)
    Sysinfo,
}

// ============================================================================
// Validated configuration
// ============================================================================

/// The three byte thresholds, guaranteed `enable <= warn <= disable`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdConfig {
    enable_swap_below: u64,
    warn_below: u64,
    disable_swap_above: u64,
}

impl ThresholdConfig {
    pub fn new(enable_swap_below: u64, warn_below: u64, disable_swap_above: u64) -> Result<Self> {
        if enable_swap_below > warn_below {
            return Err(MonitorError::config(format!(
                "enable_swap_below ({}) must not exceed warn_below ({})",
                enable_swap_below, warn_below
            )));
        }
        if warn_below > disable_swap_above {
            return Err(MonitorError::config(format!(
                "warn_below ({}) must not exceed disable_swap_above ({})",
                warn_below, disable_swap_above
            )));
        }

        Ok(Self {
            enable_swap_below,
            warn_below,
            disable_swap_above,
        })
    }

    pub fn enable_swap_below(&self) -> u64 {
        self.enable_swap_below
    }

    pub fn warn_below(&self) -> u64 {
        self.warn_below
    }

    pub fn disable_swap_above(&self) -> u64 {
        self.disable_swap_above
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            enable_swap_below: default_enable_swap_below(),
            warn_below: default_warn_below(),
            disable_swap_above: default_disable_swap_above(),
        }
    }
}

/// Color assigned to each severity zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneColors {
    pub ram_ok: Color,
    pub ram_warn: Color,
    pub ram_swap: Color,
    pub swap_unused: Color,
    pub swap_used: Color,
}

impl Default for ZoneColors {
    fn default() -> Self {
        Self {
            ram_ok: Color::Green,
            ram_warn: Color::Yellow,
            ram_swap: Color::Red,
            swap_unused: Color::Green,
            swap_used: Color::Red,
        }
    }
}

/// Bar geometry, glyphs and zone colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarStyleConfig {
    width: usize,
    pub used: Glyph,
    pub cached: Glyph,
    pub free: Glyph,
    pub swap: Glyph,
    pub colors: ZoneColors,
}

impl BarStyleConfig {
    pub fn new(
        width: usize,
        used: Glyph,
        cached: Glyph,
        free: Glyph,
        swap: Glyph,
        colors: ZoneColors,
    ) -> Result<Self> {
        if width == 0 {
            return Err(MonitorError::config("bar width must be positive"));
        }
        Ok(Self {
            width,
            used,
            cached,
            free,
            swap,
            colors,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

impl Default for BarStyleConfig {
    fn default() -> Self {
        Self {
            width: default_bar_width(),
            used: Glyph(':'),
            cached: Glyph('.'),
            free: Glyph(' '),
            swap: Glyph('='),
            colors: ZoneColors::default(),
        }
    }
}

/// Post-warning cleanup of a runaway process family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReapConfig {
    /// Exact process name to match
    pub process: String,
    /// Number of oldest matching processes to leave alive
    pub spare: usize,
}

/// How the operator is warned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningConfig {
    /// Program and arguments to run
    pub command: Vec<String>,
    /// Run the command as this (unprivileged) user via sudo
    pub as_user: Option<String>,
    pub reap: Option<ReapConfig>,
}

impl Default for WarningConfig {
    fn default() -> Self {
        Self {
            command: default_warning_command(),
            as_user: None,
            reap: None,
        }
    }
}

/// Fully validated, immutable runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub interval: Duration,
    pub thresholds: ThresholdConfig,
    pub style: BarStyleConfig,
    pub log: bool,
    pub color: bool,
    pub source: SourceKind,
    pub warning: WarningConfig,
}

impl Settings {
    /// Load the config file (explicit path or discovered), apply overrides, validate
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut file = match path {
            Some(path) => FileConfig::load_from_path(path)?,
            None => FileConfig::load()?,
        };
        file.apply(overrides);
        Settings::try_from(file)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs_f64(default_interval_secs()),
            thresholds: ThresholdConfig::default(),
            style: BarStyleConfig::default(),
            log: true,
            color: true,
            source: SourceKind::default(),
            warning: WarningConfig::default(),
        }
    }
}

// ============================================================================
// File configuration (.ramwatch.toml)
// ============================================================================

/// Raw on-disk configuration, before validation
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,
    #[serde(default = "default_true")]
    pub log: bool,
    #[serde(default = "default_true")]
    pub color: bool,
    #[serde(default)]
    pub source: SourceKind,
    #[serde(default)]
    pub thresholds: ThresholdSection,
    #[serde(default)]
    pub bar: BarSection,
    #[serde(default)]
    pub colors: ColorSection,
    #[serde(default)]
    pub warning: WarningSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdSection {
    #[serde(default = "default_enable_swap_below")]
    pub enable_swap_below: u64,
    #[serde(default = "default_warn_below")]
    pub warn_below: u64,
    #[serde(default = "default_disable_swap_above")]
    pub disable_swap_above: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BarSection {
    #[serde(default = "default_bar_width")]
    pub width: usize,
    #[serde(default = "default_used_glyph")]
    pub used: Glyph,
    #[serde(default = "default_cached_glyph")]
    pub cached: Glyph,
    #[serde(default = "default_free_glyph")]
    pub free: Glyph,
    #[serde(default = "default_swap_glyph")]
    pub swap: Glyph,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColorSection {
    #[serde(default = "default_ok_color")]
    pub ram_ok: Color,
    #[serde(default = "default_warn_color")]
    pub ram_warn: Color,
    #[serde(default = "default_swap_color")]
    pub ram_swap: Color,
    #[serde(default = "default_ok_color")]
    pub swap_unused: Color,
    #[serde(default = "default_swap_color")]
    pub swap_used: Color,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarningSection {
    #[serde(default = "default_warning_command")]
    pub command: Vec<String>,
    pub as_user: Option<String>,
    pub reap: Option<ReapSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReapSection {
    pub process: String,
    #[serde(default = "default_spare")]
    pub spare: usize,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_interval_secs() -> f64 {
    1.0
}

fn default_enable_swap_below() -> u64 {
    350 * MIB
}

fn default_warn_below() -> u64 {
    400 * MIB
}

fn default_disable_swap_above() -> u64 {
    600 * MIB
}

fn default_bar_width() -> usize {
    100
}

fn default_used_glyph() -> Glyph {
    Glyph(':')
}

fn default_cached_glyph() -> Glyph {
    Glyph('.')
}

fn default_free_glyph() -> Glyph {
    Glyph(' ')
}

fn default_swap_glyph() -> Glyph {
    Glyph('=')
}

fn default_ok_color() -> Color {
    Color::Green
}

fn default_warn_color() -> Color {
    Color::Yellow
}

fn default_swap_color() -> Color {
    Color::Red
}

fn default_warning_command() -> Vec<String> {
    ["xterm", "-geometry", "100x50+600+100"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_spare() -> usize {
    5
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            log: true,
            color: true,
            source: SourceKind::default(),
            thresholds: ThresholdSection::default(),
            bar: BarSection::default(),
            colors: ColorSection::default(),
            warning: WarningSection::default(),
        }
    }
}

impl Default for ThresholdSection {
    fn default() -> Self {
        Self {
            enable_swap_below: default_enable_swap_below(),
            warn_below: default_warn_below(),
            disable_swap_above: default_disable_swap_above(),
        }
    }
}

impl Default for BarSection {
    fn default() -> Self {
        Self {
            width: default_bar_width(),
            used: default_used_glyph(),
            cached: default_cached_glyph(),
            free: default_free_glyph(),
            swap: default_swap_glyph(),
        }
    }
}

impl Default for ColorSection {
    fn default() -> Self {
        Self {
            ram_ok: default_ok_color(),
            ram_warn: default_warn_color(),
            ram_swap: default_swap_color(),
            swap_unused: default_ok_color(),
            swap_used: default_swap_color(),
        }
    }
}

impl Default for WarningSection {
    fn default() -> Self {
        Self {
            command: default_warning_command(),
            as_user: None,
            reap: None,
        }
    }
}

impl FileConfig {
    /// Load config from a discovered `.ramwatch.toml`, or defaults when none exists
    pub fn load() -> Result<Self> {
        if let Some(config_path) = find_config_file() {
            tracing::debug!("Loading config from: {}", config_path.display());
            return Self::load_from_path(&config_path);
        }

        tracing::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
        Ok(Self::default())
    }

    /// Load from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MonitorError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| MonitorError::config(format!("{}: {}", path.display(), e)))
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply command-line overrides on top of file values
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(v) = overrides.interval_secs {
            self.interval_secs = v;
        }
        if let Some(v) = overrides.enable_swap_below {
            self.thresholds.enable_swap_below = v;
        }
        if let Some(v) = overrides.warn_below {
            self.thresholds.warn_below = v;
        }
        if let Some(v) = overrides.disable_swap_above {
            self.thresholds.disable_swap_above = v;
        }
        if let Some(v) = overrides.log {
            self.log = v;
        }
        if let Some(v) = overrides.color {
            self.color = v;
        }
        if let Some(v) = overrides.source {
            self.source = v;
        }
        if let Some(v) = overrides.bar_width {
            self.bar.width = v;
        }
        if let Some(v) = overrides.used_glyph {
            self.bar.used = v;
        }
        if let Some(v) = overrides.cached_glyph {
            self.bar.cached = v;
        }
        if let Some(v) = overrides.free_glyph {
            self.bar.free = v;
        }
        if let Some(v) = overrides.swap_glyph {
            self.bar.swap = v;
        }
        if let Some(v) = overrides.ram_ok_color {
            self.colors.ram_ok = v;
        }
        if let Some(v) = overrides.ram_warn_color {
            self.colors.ram_warn = v;
        }
        if let Some(v) = overrides.ram_swap_color {
            self.colors.ram_swap = v;
        }
        if let Some(v) = overrides.swap_unused_color {
            self.colors.swap_unused = v;
        }
        if let Some(v) = overrides.swap_used_color {
            self.colors.swap_used = v;
        }
        if let Some(v) = &overrides.warn_as_user {
            self.warning.as_user = Some(v.clone());
        }
    }
}

impl TryFrom<FileConfig> for Settings {
    type Error = MonitorError;

    fn try_from(file: FileConfig) -> Result<Self> {
        let interval = Duration::try_from_secs_f64(file.interval_secs)
            .ok()
            .filter(|d| !d.is_zero())
            .ok_or_else(|| {
                MonitorError::config(format!(
                    "interval must be a positive number of seconds, got {}",
                    file.interval_secs
                ))
            })?;

        let thresholds = ThresholdConfig::new(
            file.thresholds.enable_swap_below,
            file.thresholds.warn_below,
            file.thresholds.disable_swap_above,
        )?;

        let colors = ZoneColors {
            ram_ok: file.colors.ram_ok,
            ram_warn: file.colors.ram_warn,
            ram_swap: file.colors.ram_swap,
            swap_unused: file.colors.swap_unused,
            swap_used: file.colors.swap_used,
        };
        let style = BarStyleConfig::new(
            file.bar.width,
            file.bar.used,
            file.bar.cached,
            file.bar.free,
            file.bar.swap,
            colors,
        )?;

        let warning = validate_warning(file.warning)?;

        Ok(Settings {
            interval,
            thresholds,
            style,
            log: file.log,
            color: file.color,
            source: file.source,
            warning,
        })
    }
}

fn validate_warning(section: WarningSection) -> Result<WarningConfig> {
    if section.command.first().map_or(true, |c| c.trim().is_empty()) {
        return Err(MonitorError::config("warning.command must name a program"));
    }

    if let Some(user) = &section.as_user {
        if user.is_empty() || !user.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(MonitorError::config(format!(
                "warning.as_user must be alphanumeric, got {:?}",
                user
            )));
        }
    }

    let reap = match section.reap {
        Some(reap) => {
            if reap.process.trim().is_empty() {
                return Err(MonitorError::config("warning.reap.process must not be empty"));
            }
            Some(ReapConfig {
                process: reap.process,
                spare: reap.spare,
            })
        }
        None => None,
    };

    Ok(WarningConfig {
        command: section.command,
        as_user: section.as_user,
        reap,
    })
}

/// Individual values supplied on the command line
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub interval_secs: Option<f64>,
    pub enable_swap_below: Option<u64>,
    pub warn_below: Option<u64>,
    pub disable_swap_above: Option<u64>,
    pub log: Option<bool>,
    pub color: Option<bool>,
    pub source: Option<SourceKind>,
    pub bar_width: Option<usize>,
    pub used_glyph: Option<Glyph>,
    pub cached_glyph: Option<Glyph>,
    pub free_glyph: Option<Glyph>,
    pub swap_glyph: Option<Glyph>,
    pub ram_ok_color: Option<Color>,
    pub ram_warn_color: Option<Color>,
    pub ram_swap_color: Option<Color>,
    pub swap_unused_color: Option<Color>,
    pub swap_used_color: Option<Color>,
    pub warn_as_user: Option<String>,
}

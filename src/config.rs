//! Table configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. User values are
//! merged over stock defaults, so a config file only needs the keys it wants
//! to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [table]
//! capacity = 12             # Items on the table before the oldest fade out
//! drop_period_ms = 5000     # Drop-timer period
//! initial_drop = 3          # Loads issued at start
//! image_ratio = 0.5         # Decode size as a fraction of the surface
//! table_ratio = 0.3         # Resting size as a fraction of the surface
//! max_rotation = 45.0       # Drops rotate within ±max_rotation degrees
//! max_selection_ms = 10000  # Idle selections are dropped after this
//! fade_ms = 1000
//! manual_rotation = true    # Two-finger rotation of unselected items
//! tap_to_exit = false       # Touching empty table requests exit
//!
//! [fling]
//! enabled = true
//! damping = 0.2             # Per-step velocity decay, 0 < damping < 1
//!
//! [retry]
//! base_ms = 100             # Delay before re-requesting a failed load
//! multiplier = 1.0          # 1.0 = fixed delay
//! max_delay_ms = 5000
//!
//! [gestures]
//! tap_timeout_ms = 180
//! touch_slop = 16.0         # Pixels
//! min_fling_velocity = 400.0 # Pixels per second
//! velocity_window_ms = 100
//!
//! [sources]
//! local_roots = []          # Directories scanned for local albums
//! queue_capacity = 20       # Prefetch queue size per provider
//! stock_count = 12
//! stock_width = 640
//! stock_height = 480
//! settings_file = "album-settings.json"
//!
//! [processing]
//! max_processes = 4         # Max load workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::gesture::GestureThresholds;
use crate::table::{RetryPolicy, TableOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `config.toml`.
///
/// All fields have defaults; unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhotoTableConfig {
    pub table: TableConfig,
    pub fling: FlingConfig,
    pub retry: RetryConfig,
    pub gestures: GesturesConfig,
    pub sources: SourcesConfig,
    pub processing: ProcessingConfig,
}

impl PhotoTableConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratio_ok = |r: f64| r > 0.0 && r <= 1.0;
        if self.table.capacity == 0 {
            return Err(ConfigError::Validation(
                "table.capacity must be at least 1".into(),
            ));
        }
        if self.table.drop_period_ms == 0 {
            return Err(ConfigError::Validation(
                "table.drop_period_ms must be non-zero".into(),
            ));
        }
        if !ratio_ok(self.table.image_ratio) || !ratio_ok(self.table.table_ratio) {
            return Err(ConfigError::Validation(
                "table.image_ratio and table.table_ratio must be in (0, 1]".into(),
            ));
        }
        if !(self.fling.damping > 0.0 && self.fling.damping < 1.0) {
            return Err(ConfigError::Validation(
                "fling.damping must be strictly between 0 and 1".into(),
            ));
        }
        if self.retry.multiplier < 1.0 {
            return Err(ConfigError::Validation(
                "retry.multiplier must be at least 1.0".into(),
            ));
        }
        if self.sources.queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "sources.queue_capacity must be at least 1".into(),
            ));
        }
        if self.sources.stock_width == 0 || self.sources.stock_height == 0 {
            return Err(ConfigError::Validation(
                "sources.stock_width and sources.stock_height must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Table behavior described by this config.
    pub fn table_options(&self) -> TableOptions {
        let t = &self.table;
        TableOptions {
            capacity: t.capacity,
            drop_period: Duration::from_millis(t.drop_period_ms),
            initial_drop: t.initial_drop,
            image_ratio: t.image_ratio,
            table_ratio: t.table_ratio,
            max_rotation: t.max_rotation,
            max_selection_time: Duration::from_millis(t.max_selection_ms),
            fade_duration: Duration::from_millis(t.fade_ms),
            fling_enabled: self.fling.enabled,
            fling_damping: self.fling.damping,
            manual_rotation: t.manual_rotation,
            tap_to_exit: t.tap_to_exit,
            retry: RetryPolicy {
                base: Duration::from_millis(self.retry.base_ms),
                multiplier: self.retry.multiplier,
                max_delay: Duration::from_millis(self.retry.max_delay_ms),
            },
        }
    }

    pub fn gesture_thresholds(&self) -> GestureThresholds {
        let g = &self.gestures;
        GestureThresholds {
            tap_timeout: Duration::from_millis(g.tap_timeout_ms),
            touch_slop: g.touch_slop,
            min_fling_velocity: g.min_fling_velocity,
            velocity_window: Duration::from_millis(g.velocity_window_ms),
        }
    }
}

/// Table size, timing and motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableConfig {
    pub capacity: usize,
    pub drop_period_ms: u64,
    pub initial_drop: usize,
    pub image_ratio: f64,
    pub table_ratio: f64,
    pub max_rotation: f64,
    pub max_selection_ms: u64,
    pub fade_ms: u64,
    pub manual_rotation: bool,
    pub tap_to_exit: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        let options = TableOptions::default();
        Self {
            capacity: options.capacity,
            drop_period_ms: options.drop_period.as_millis() as u64,
            initial_drop: options.initial_drop,
            image_ratio: options.image_ratio,
            table_ratio: options.table_ratio,
            max_rotation: options.max_rotation,
            max_selection_ms: options.max_selection_time.as_millis() as u64,
            fade_ms: options.fade_duration.as_millis() as u64,
            manual_rotation: options.manual_rotation,
            tap_to_exit: options.tap_to_exit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlingConfig {
    pub enabled: bool,
    pub damping: f64,
}

impl Default for FlingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            damping: 0.2,
        }
    }
}

/// Load retry delays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub base_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            base_ms: policy.base.as_millis() as u64,
            multiplier: policy.multiplier,
            max_delay_ms: policy.max_delay.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GesturesConfig {
    pub tap_timeout_ms: u64,
    pub touch_slop: f64,
    pub min_fling_velocity: f64,
    pub velocity_window_ms: u64,
}

impl Default for GesturesConfig {
    fn default() -> Self {
        let thresholds = GestureThresholds::default();
        Self {
            tap_timeout_ms: thresholds.tap_timeout.as_millis() as u64,
            touch_slop: thresholds.touch_slop,
            min_fling_velocity: thresholds.min_fling_velocity,
            velocity_window_ms: thresholds.velocity_window.as_millis() as u64,
        }
    }
}

/// Photo providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
    /// Directories scanned by the local provider. Empty disables it.
    pub local_roots: Vec<PathBuf>,
    /// Prefetch queue size per provider.
    pub queue_capacity: usize,
    pub stock_count: usize,
    pub stock_width: u32,
    pub stock_height: u32,
    /// Where the enabled-album set is persisted.
    pub settings_file: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            local_roots: Vec::new(),
            queue_capacity: 20,
            stock_count: 12,
            stock_width: 640,
            stock_height: 480,
            settings_file: PathBuf::from("album-settings.json"),
        }
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of load workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Loading and merging
// =============================================================================

/// Stock defaults as a TOML value, the base every config is merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PhotoTableConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PhotoTableConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PhotoTableConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when it is absent.
pub fn load_config(path: &Path) -> Result<PhotoTableConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Photo Table Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Table
# ---------------------------------------------------------------------------
[table]
# Items on the table before the oldest untouched one fades out.
capacity = 12

# A new image drops every drop_period_ms milliseconds.
drop_period_ms = 5000

# Images requested as soon as the table starts.
initial_drop = 3

# Images are decoded to image_ratio of each surface side...
image_ratio = 0.5

# ...and rest on the table at table_ratio of each surface side.
table_ratio = 0.3

# Dropped images are rotated uniformly within +/- max_rotation degrees.
max_rotation = 45.0

# A picked-up image left alone this long is dropped on the next timer tick.
max_selection_ms = 10000

# Fade-out time for evicted and flung-away images.
fade_ms = 1000

# Two-finger rotation of images lying on the table.
manual_rotation = true

# Touching the empty table (with nothing picked up) requests exit.
tap_to_exit = false

# ---------------------------------------------------------------------------
# Fling
# ---------------------------------------------------------------------------
[fling]
enabled = true

# Velocity decay per 100 ms step. Must be strictly between 0 and 1;
# smaller values stop sooner.
damping = 0.2

# ---------------------------------------------------------------------------
# Load retries
# ---------------------------------------------------------------------------
[retry]
# Delay before re-requesting a load that failed. Retries never give up.
base_ms = 100

# 1.0 keeps the delay fixed; larger values back off geometrically.
multiplier = 1.0

# Upper bound for the backed-off delay.
max_delay_ms = 5000

# ---------------------------------------------------------------------------
# Gesture recognition
# ---------------------------------------------------------------------------
[gestures]
# A press released within this time (and within touch_slop) is a tap.
tap_timeout_ms = 180

# Pixels a tap may travel.
touch_slop = 16.0

# Release speed (pixels per second) above which a release is a fling.
min_fling_velocity = 400.0

# Release velocity is measured over this much recent motion.
velocity_window_ms = 100

# ---------------------------------------------------------------------------
# Photo sources
# ---------------------------------------------------------------------------
[sources]
# Directories scanned for local albums; each subdirectory is an album.
local_roots = []

# Candidates prefetched per provider query.
queue_capacity = 20

# Generated fallback images, used only when no other provider has any.
stock_count = 12
stock_width = 640
stock_height = 480

# Where the enabled-album set is stored.
settings_file = "album-settings.json"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel load workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

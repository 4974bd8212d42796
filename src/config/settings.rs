//! Recognition, engine and converter settings persisted as TOML.
//!
//! Every section is `#[serde(default)]`: keys absent from the file keep
//! their built-in values.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// RecognitionConfig
// ---------------------------------------------------------------------------

/// Scheduling and recovery policy for the recognition coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Idle window after the last stroke edit before recognition runs.
    pub debounce_ms: u64,
    /// Retries after an engine-class failure, each on a fresh session.
    pub max_retries: u32,
    /// Text shown for a block that failed and has no earlier result.
    pub error_placeholder: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1_000,
            max_retries: 1,
            error_placeholder: "[Recognition Error]".into(),
        }
    }
}

impl RecognitionConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// ---------------------------------------------------------------------------
// RendererConfig
// ---------------------------------------------------------------------------

/// Offscreen renderer resolution and cosmetic drop-shadow parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub dpi_x: f32,
    pub dpi_y: f32,
    pub drop_shadow_x_offset: f64,
    pub drop_shadow_y_offset: f64,
    /// RGBA packed into a single integer.
    pub drop_shadow_color: u32,
    pub drop_shadow_radius: f64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            dpi_x: 96.0,
            dpi_y: 96.0,
            drop_shadow_x_offset: 0.0,
            drop_shadow_y_offset: 5.0,
            drop_shadow_color: 0x0000_0066,
            drop_shadow_radius: 5.0,
        }
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Where the engine's credential, assets and scratch space live.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// File holding the recognition certificate blob.  `None` means the
    /// credential is looked up as `certificate.bin` in the resource dir.
    pub certificate_file: Option<PathBuf>,
    /// Extra asset search-path candidates, tried before the defaults.
    pub asset_dirs: Vec<PathBuf>,
    /// Scratch folder override for content packages.
    pub temp_dir: Option<PathBuf>,
    pub renderer: RendererConfig,
}

// ---------------------------------------------------------------------------
// ConverterConfig
// ---------------------------------------------------------------------------

/// Stroke → pointer-event conversion parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Arc-length spacing of resampled points.
    pub resample_interval: f32,
    /// Synthetic time between consecutive pointer events.
    pub time_step_ms: i64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            resample_interval: 1.0,
            time_step_ms: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub recognition: RecognitionConfig,
    pub engine: EngineConfig,
    pub converter: ConverterConfig,
}

impl AppConfig {
    /// Read the per-user settings file.  A first run has no file and gets
    /// the defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("config: {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Write the per-user settings file, creating its directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        std::fs::write(path, toml::to_string_pretty(self)?)
            .with_context(|| format!("writing {}", path.display()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

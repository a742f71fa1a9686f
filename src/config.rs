use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::bands::Band;
use crate::data::noise::Calibration;
use crate::data::peaks::PeakOptions;

// ---------------------------------------------------------------------------
// Application configuration
// ---------------------------------------------------------------------------

/// Optional JSON overrides file, read from the working directory.
const CONFIG_FILE: &str = "emcview.json";

pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024; // 50 MiB
pub const DEFAULT_MAX_OVERLAY_DATASETS: usize = 8;

/// The read-only configuration surface the processing pipeline consumes.
/// Every field has a default; the JSON file may override any subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Maximum input file size in bytes; larger files are rejected unread.
    pub max_file_size: u64,
    /// Lower-case extension allowlist for measurement files.
    pub supported_extensions: Vec<String>,
    /// Cap on simultaneously overlaid datasets; oldest are evicted beyond it.
    pub max_overlay_datasets: usize,
    pub peaks: PeakOptions,
    pub calibration: Calibration,
    pub limits: LimitConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            supported_extensions: vec!["csv".to_string(), "txt".to_string()],
            max_overlay_datasets: DEFAULT_MAX_OVERLAY_DATASETS,
            peaks: PeakOptions::default(),
            calibration: Calibration::default(),
            limits: LimitConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load overrides from `emcview.json` if present, else the defaults. A
    /// malformed file falls back to defaults with a logged warning.
    pub fn load_or_default() -> Self {
        let path = Path::new(CONFIG_FILE);
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("loaded configuration overrides from {CONFIG_FILE}");
                config
            }
            Err(err) => {
                log::warn!("ignoring {CONFIG_FILE}: {err:#}");
                Self::default()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Emission limit lines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitDistance {
    #[serde(rename = "50ft")]
    Ft50,
    #[serde(rename = "100ft")]
    Ft100,
}

/// Radiated-emission limit levels per band (dBμV/m/MHz) at the two
/// standard measurement distances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    pub enabled: bool,
    pub distance: LimitDistance,
    /// Indexed by band, B0..B7.
    pub limits_50ft: [f64; 8],
    pub limits_100ft: [f64; 8],
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            distance: LimitDistance::Ft50,
            limits_50ft: [126.0, 126.0, 115.0, 100.0, 85.0, 81.0, 96.0, 96.0],
            limits_100ft: [108.0, 108.0, 97.0, 94.0, 84.0, 75.0, 90.0, 90.0],
        }
    }
}

impl LimitConfig {
    /// Limit level for a band at the configured distance.
    pub fn limit_for(&self, band: Band) -> f64 {
        match self.distance {
            LimitDistance::Ft50 => self.limits_50ft[band.index()],
            LimitDistance::Ft100 => self.limits_100ft[band.index()],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

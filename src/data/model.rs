use std::fmt;

use eframe::egui::Color32;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::bands::{self, Band};
use super::noise::{self, Calibration};
use crate::color::assign_color;

// ---------------------------------------------------------------------------
// DataPoint – one measurement row
// ---------------------------------------------------------------------------

/// A single spectrum measurement: frequency in Hz, amplitude in dBμV/m.
/// Immutable once parsed; a file's measurement is a `Vec<DataPoint>` sorted
/// ascending by frequency (the loader guarantees the ordering).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Frequency in Hz (≥ 0 in well-formed files).
    pub frequency: f64,
    /// Amplitude in dBμV/m.
    pub amplitude: f64,
}

impl DataPoint {
    pub fn new(frequency: f64, amplitude: f64) -> Self {
        Self { frequency, amplitude }
    }

    /// Frequency in MHz, the unit used for band tables and display.
    pub fn frequency_mhz(&self) -> f64 {
        self.frequency / 1e6
    }
}

// ---------------------------------------------------------------------------
// ParseResult – structured outcome of a parse
// ---------------------------------------------------------------------------

/// Outcome of parsing one file. Failures are values, not panics: callers
/// must check `success` before reading `data`. `warnings` may be non-empty
/// even on success (skipped rows, missing DATA marker).
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub success: bool,
    pub data: Option<Vec<DataPoint>>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ParseResult {
    /// A failed result carrying a single error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            errors: vec![error.into()],
            warnings: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Panel identity
// ---------------------------------------------------------------------------

/// The two comparison slots a dataset can be loaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PanelId {
    DatasetA,
    DatasetB,
}

impl PanelId {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelId::DatasetA => "dataset-a",
            PanelId::DatasetB => "dataset-b",
        }
    }

    /// Human-readable panel name for status messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            PanelId::DatasetA => "Dataset A",
            PanelId::DatasetB => "Dataset B",
        }
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Dataset – the assembled record the UI consumes
// ---------------------------------------------------------------------------

/// A fully analyzed measurement file, ready for overlay display. Created
/// once per successfully parsed file; replaced wholesale (never partially
/// mutated) when the user re-selects a file for the same panel.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Unique id (UUID v4), stable for the record's lifetime.
    pub id: String,
    pub filename: String,
    /// Sorted measurement points.
    pub points: Vec<DataPoint>,
    /// Classified band, if any strategy matched.
    pub band: Option<Band>,
    /// Absolute noisiness score (1–99) computed at assembly time.
    pub noisiness_index: f64,
    pub noisiness_category: NoisinessCategory,
    /// Display color assigned by the slot/palette policy.
    pub color: Color32,
    pub label: String,
    /// Which panel the dataset was loaded from.
    pub source_panel: PanelId,
}

impl Dataset {
    /// Combine parsed points with band classification, noisiness scoring
    /// and display metadata into the record the UI consumes.
    ///
    /// Band detection prefers the filename (high confidence); the data's
    /// frequency extent is the low-confidence fallback. `index_in_panel`
    /// drives the slot/palette color policy.
    pub fn assemble(
        filename: &str,
        points: Vec<DataPoint>,
        source_panel: PanelId,
        index_in_panel: usize,
        label: Option<String>,
        cal: &Calibration,
    ) -> Dataset {
        let band = match bands::detect_band_from_filename(filename) {
            Some(band) => {
                log::debug!("{filename}: band {band} from filename");
                Some(band)
            }
            None => {
                let band = frequency_extent_mhz(&points)
                    .and_then(|(min, max)| bands::detect_band_from_range(min, max));
                if let Some(band) = band {
                    log::debug!("{filename}: band {band} from frequency range (low confidence)");
                }
                band
            }
        };

        let analysis = noise::analyze(&points, filename, cal);

        Dataset {
            id: Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            label: label.unwrap_or_else(|| filename.to_string()),
            color: assign_color(source_panel, index_in_panel),
            band,
            noisiness_index: analysis.noisiness_index,
            noisiness_category: analysis.category,
            points,
            source_panel,
        }
    }
}

/// Finite (min, max) frequency of the sequence in MHz, if any.
fn frequency_extent_mhz(points: &[DataPoint]) -> Option<(f64, f64)> {
    let finite: Vec<f64> = points
        .iter()
        .map(|p| p.frequency_mhz())
        .filter(|f| f.is_finite())
        .collect();
    if finite.is_empty() {
        return None;
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((min, max))
}

// ---------------------------------------------------------------------------
// Noise analysis records
// ---------------------------------------------------------------------------

/// The component scores behind a noisiness index, each on a 0–1 scale
/// except `overall_noisiness` which carries the final index.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NoisinessMetrics {
    /// Primary indicator: normalized + sharpened mean amplitude.
    pub average_amplitude: f64,
    pub variance_score: f64,
    pub peak_to_rms_ratio: f64,
    pub spectral_flatness: f64,
    pub high_freq_content: f64,
    pub small_peak_density: f64,
    pub overall_noisiness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoisinessCategory {
    VeryQuiet,
    Quiet,
    Moderate,
    Noisy,
    VeryNoisy,
}

impl NoisinessCategory {
    pub fn label(&self) -> &'static str {
        match self {
            NoisinessCategory::VeryQuiet => "Very Quiet",
            NoisinessCategory::Quiet => "Quiet",
            NoisinessCategory::Moderate => "Moderate",
            NoisinessCategory::Noisy => "Noisy",
            NoisinessCategory::VeryNoisy => "Very Noisy",
        }
    }
}

impl fmt::Display for NoisinessCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of noisiness analysis for one file. Two scales exist and must not
/// be conflated: absolute mode scores 1–99, band-relative mode scores 1–10
/// (comparable only within one band group).
#[derive(Debug, Clone, Serialize)]
pub struct NoiseAnalysisResult {
    pub filename: String,
    pub noisiness_index: f64,
    pub metrics: NoisinessMetrics,
    pub confidence: Confidence,
    pub category: NoisinessCategory,
}

// ---------------------------------------------------------------------------
// DetectedPeak
// ---------------------------------------------------------------------------

/// A local-maximum peak found by the detector. Ephemeral: recomputed on
/// demand, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetectedPeak {
    /// Peak frequency in MHz.
    pub frequency_mhz: f64,
    /// Peak amplitude in dBμV/m.
    pub amplitude: f64,
    /// Position in the source point sequence.
    pub index: usize,
    /// Height above the higher of the two neighboring valley minima.
    pub prominence: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

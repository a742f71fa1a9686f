use serde::{Deserialize, Serialize};

use super::model::{DataPoint, DetectedPeak};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

pub const DEFAULT_MIN_PROMINENCE: f64 = 3.0; // dB
pub const DEFAULT_MIN_HEIGHT: f64 = -120.0; // dBμV/m
pub const DEFAULT_MIN_DISTANCE: usize = 10; // data points
pub const DEFAULT_MAX_PEAKS: usize = 50;

/// Peak detection thresholds. `min_distance` is measured in index positions
/// of the source sequence, not in frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakOptions {
    pub min_prominence: f64,
    pub min_height: f64,
    pub min_distance: usize,
    pub max_peaks: usize,
}

impl Default for PeakOptions {
    fn default() -> Self {
        Self {
            min_prominence: DEFAULT_MIN_PROMINENCE,
            min_height: DEFAULT_MIN_HEIGHT,
            min_distance: DEFAULT_MIN_DISTANCE,
            max_peaks: DEFAULT_MAX_PEAKS,
        }
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Find local-maxima peaks in an ordered point sequence.
///
/// A candidate must strictly exceed both neighbors (endpoints are never
/// candidates) and reach `min_height`; candidates below `min_prominence`
/// are dropped. The `min_distance` check accepts candidates in scan order,
/// left to right: an earlier accepted peak suppresses any later candidate
/// within `min_distance` index positions, even a more prominent one. The
/// survivors come back sorted by descending prominence, truncated to
/// `max_peaks`. Fewer than 3 input points yields an empty result.
pub fn detect_peaks(points: &[DataPoint], options: &PeakOptions) -> Vec<DetectedPeak> {
    if points.len() < 3 {
        return Vec::new();
    }

    let amplitudes: Vec<f64> = points.iter().map(|p| p.amplitude).collect();
    let mut peaks: Vec<DetectedPeak> = Vec::new();

    for i in 1..points.len() - 1 {
        let current = amplitudes[i];
        if current <= amplitudes[i - 1] || current <= amplitudes[i + 1] {
            continue;
        }
        if current < options.min_height {
            continue;
        }

        let prominence = calculate_prominence(&amplitudes, i);
        if prominence < options.min_prominence {
            continue;
        }

        let too_close = peaks
            .iter()
            .any(|peak| peak.index.abs_diff(i) < options.min_distance);
        if too_close {
            continue;
        }

        peaks.push(DetectedPeak {
            frequency_mhz: points[i].frequency_mhz(),
            amplitude: current,
            index: i,
            prominence,
        });
    }

    peaks.sort_by(|a, b| b.prominence.total_cmp(&a.prominence));
    peaks.truncate(options.max_peaks);
    peaks
}

/// Prominence of the candidate at `peak_index`: scan outward on each side
/// until the edge or a higher value, tracking the minimum seen; the peak
/// stands on the higher of the two valley minima.
fn calculate_prominence(amplitudes: &[f64], peak_index: usize) -> f64 {
    let peak_value = amplitudes[peak_index];
    let mut left_min = peak_value;
    let mut right_min = peak_value;

    for &value in amplitudes[..peak_index].iter().rev() {
        if value < left_min {
            left_min = value;
        }
        if value > peak_value {
            break;
        }
    }

    for &value in &amplitudes[peak_index + 1..] {
        if value < right_min {
            right_min = value;
        }
        if value > peak_value {
            break;
        }
    }

    peak_value - left_min.max(right_min)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use super::bands::Band;
use super::model::DataPoint;

// ---------------------------------------------------------------------------
// Band filtering
// ---------------------------------------------------------------------------

/// Restrict a point sequence to the band's inclusive Hz interval. Input
/// ordering is preserved, so a sorted sequence stays sorted.
pub fn filter_to_band(points: &[DataPoint], band: Band) -> Vec<DataPoint> {
    let (start_mhz, end_mhz) = band.range_mhz();
    let start_hz = start_mhz * 1e6;
    let end_hz = end_mhz * 1e6;

    points
        .iter()
        .copied()
        .filter(|p| p.frequency >= start_hz && p.frequency <= end_hz)
        .collect()
}

// ---------------------------------------------------------------------------
// Axis ranges
// ---------------------------------------------------------------------------

/// Padded axis bounds for plotting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NiceRanges {
    /// (min, max) frequency, same unit as the inputs.
    pub frequency: (f64, f64),
    /// (min, max) amplitude in dBμV/m.
    pub amplitude: (f64, f64),
}

/// Pad the data extents for display: 5 % on frequency (never below zero),
/// 10 % on amplitude.
pub fn nice_ranges(min_freq: f64, max_freq: f64, min_amp: f64, max_amp: f64) -> NiceRanges {
    let freq_padding = (max_freq - min_freq) * 0.05;
    let amp_padding = (max_amp - min_amp) * 0.1;

    NiceRanges {
        frequency: ((min_freq - freq_padding).max(0.0), max_freq + freq_padding),
        amplitude: (min_amp - amp_padding, max_amp + amp_padding),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::bands::Band;
use super::model::{
    Confidence, DataPoint, NoiseAnalysisResult, NoisinessCategory, NoisinessMetrics,
};

// ---------------------------------------------------------------------------
// Calibration – the tuning surface of the noisiness model
// ---------------------------------------------------------------------------

/// Every threshold, center and steepness the scoring pipeline uses. The
/// defaults are calibrated for radiated-emission sweeps in dBμV/m; override
/// through the configuration file when measuring a different setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Mean amplitude mapped to score 0 (a very quiet sweep), in dB.
    pub min_expected_amplitude_db: f64,
    /// Mean amplitude mapped to score 1 (a very noisy sweep), in dB.
    pub max_expected_amplitude_db: f64,
    /// Sigmoid steepness sharpening the mean-amplitude score around 0.5.
    pub amplitude_steepness: f64,
    /// Sigmoid steepness for the variance score, centered at 1.0.
    pub variance_steepness: f64,
    /// Crest factor (peak/RMS) at the center of its sigmoid.
    pub crest_factor_center: f64,
    pub crest_steepness: f64,
    /// Second-derivative average at the center of the smoothness sigmoid.
    pub smoothness_center: f64,
    pub smoothness_steepness: f64,
    /// Amplitude span treated as the full dynamic range, in dB.
    pub dynamic_range_span_db: f64,
    /// Rise above both neighbor averages for a point to count as a small
    /// peak, in dB.
    pub small_peak_threshold_db: f64,
    /// Standard-deviation normalizer for the reduced-data path, in dB.
    pub simple_std_norm_db: f64,
    pub simple_variance_steepness: f64,
    /// Steepness of the final blend sigmoid, centered at 0.5.
    pub final_steepness: f64,
    /// Group mean-amplitude range below which band-relative scoring gives
    /// every member the neutral score, in dB.
    pub group_sensitivity_floor_db: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            min_expected_amplitude_db: -80.0,
            max_expected_amplitude_db: 20.0,
            amplitude_steepness: 6.0,
            variance_steepness: 3.0,
            crest_factor_center: 4.0,
            crest_steepness: 0.5,
            smoothness_center: 3.0,
            smoothness_steepness: 0.5,
            dynamic_range_span_db: 50.0,
            small_peak_threshold_db: 2.0,
            simple_std_norm_db: 8.0,
            simple_variance_steepness: 2.0,
            final_steepness: 4.0,
            group_sensitivity_floor_db: 0.1,
        }
    }
}

// Blend weights. Mean amplitude dominates; smoothness and dynamic range are
// computed but currently inactive.
const W_AVERAGE_AMPLITUDE: f64 = 0.95;
const W_VARIANCE: f64 = 0.02;
const W_PEAK_TO_RMS: f64 = 0.01;
const W_SPECTRAL_FLATNESS: f64 = 0.01;
const W_HIGH_FREQ_CONTENT: f64 = 0.005;
const W_SMALL_PEAK_DENSITY: f64 = 0.005;
const W_SIGNAL_SMOOTHNESS: f64 = 0.0;
const W_DYNAMIC_RANGE: f64 = 0.0;

/// Minimum finite samples for the full metric pipeline.
const FULL_PIPELINE_MIN_SAMPLES: usize = 10;

// ---------------------------------------------------------------------------
// Categorization
// ---------------------------------------------------------------------------

/// Bucket a band-relative score (1–10 scale): ≤2 very quiet, ≤4 quiet,
/// ≤6 moderate, ≤8 noisy, else very noisy.
pub fn categorize_relative(score: f64) -> NoisinessCategory {
    if score <= 2.0 {
        NoisinessCategory::VeryQuiet
    } else if score <= 4.0 {
        NoisinessCategory::Quiet
    } else if score <= 6.0 {
        NoisinessCategory::Moderate
    } else if score <= 8.0 {
        NoisinessCategory::Noisy
    } else {
        NoisinessCategory::VeryNoisy
    }
}

/// Bucket an absolute score (1–99 scale). Same five categories as the
/// relative table, re-bucketed proportionally: ≤20/≤40/≤60/≤80.
pub fn categorize_absolute(score: f64) -> NoisinessCategory {
    if score <= 20.0 {
        NoisinessCategory::VeryQuiet
    } else if score <= 40.0 {
        NoisinessCategory::Quiet
    } else if score <= 60.0 {
        NoisinessCategory::Moderate
    } else if score <= 80.0 {
        NoisinessCategory::Noisy
    } else {
        NoisinessCategory::VeryNoisy
    }
}

// ---------------------------------------------------------------------------
// Absolute mode
// ---------------------------------------------------------------------------

/// Compute the absolute noisiness index (1–99) for one file.
///
/// Degenerate inputs step down gracefully: fewer than 3 points total gives
/// an amplitude-only estimate (or the neutral 50 with no finite samples);
/// fewer than 10 finite amplitudes gives a 95 % mean-amplitude / 5 %
/// simple-variance blend. Both reduced paths report low confidence.
pub fn analyze(points: &[DataPoint], filename: &str, cal: &Calibration) -> NoiseAnalysisResult {
    if points.len() < 3 {
        let amplitudes: Vec<f64> = points
            .iter()
            .map(|p| p.amplitude)
            .filter(|a| a.is_finite())
            .collect();
        let average_amplitude = if amplitudes.is_empty() {
            0.0
        } else {
            average_amplitude_score(&amplitudes, cal)
        };
        let fallback = if amplitudes.is_empty() {
            50.0
        } else {
            (average_amplitude * 95.0 + 5.0).round().clamp(1.0, 99.0)
        };
        return NoiseAnalysisResult {
            filename: filename.to_string(),
            noisiness_index: fallback,
            metrics: NoisinessMetrics {
                average_amplitude,
                overall_noisiness: fallback,
                ..NoisinessMetrics::default()
            },
            confidence: Confidence::Low,
            category: NoisinessCategory::Moderate,
        };
    }

    let amplitudes: Vec<f64> = points
        .iter()
        .map(|p| p.amplitude)
        .filter(|a| a.is_finite())
        .collect();
    let frequencies: Vec<f64> = points
        .iter()
        .map(|p| p.frequency)
        .filter(|f| f.is_finite())
        .collect();

    if amplitudes.len() < FULL_PIPELINE_MIN_SAMPLES {
        let average_amplitude = average_amplitude_score(&amplitudes, cal);
        let simple = simple_noisiness(&amplitudes, cal);
        let combined = average_amplitude * 0.95 + (simple / 100.0) * 0.05;
        let final_score = (combined * 100.0).round().clamp(1.0, 99.0);
        return NoiseAnalysisResult {
            filename: filename.to_string(),
            noisiness_index: final_score,
            metrics: NoisinessMetrics {
                average_amplitude,
                variance_score: simple / 100.0,
                peak_to_rms_ratio: 0.5,
                spectral_flatness: 0.5,
                high_freq_content: 0.5,
                small_peak_density: 0.5,
                overall_noisiness: final_score,
            },
            confidence: Confidence::Low,
            category: categorize_absolute(final_score),
        };
    }

    let raw = RawMetrics {
        average_amplitude: average_amplitude_score(&amplitudes, cal),
        variance_score: variance_score(&amplitudes, cal),
        peak_to_rms_ratio: peak_to_rms_score(&amplitudes, cal),
        spectral_flatness: spectral_flatness(&amplitudes),
        high_freq_content: high_freq_content(points),
        small_peak_density: small_peak_density(&amplitudes, cal),
        signal_smoothness: signal_smoothness(&amplitudes, cal),
        dynamic_range: dynamic_range(&amplitudes, cal),
    };

    let overall = combine_metrics(&raw, cal);
    let final_score = finite_or(overall, 50.0, "overall noisiness").round().clamp(1.0, 99.0);

    NoiseAnalysisResult {
        filename: filename.to_string(),
        noisiness_index: final_score,
        metrics: NoisinessMetrics {
            average_amplitude: raw.average_amplitude,
            variance_score: raw.variance_score,
            peak_to_rms_ratio: raw.peak_to_rms_ratio,
            spectral_flatness: raw.spectral_flatness,
            high_freq_content: raw.high_freq_content,
            small_peak_density: raw.small_peak_density,
            overall_noisiness: overall,
        },
        confidence: assess_confidence(points.len(), &frequencies),
        category: categorize_absolute(final_score),
    }
}

/// Analyze a set of files with absolute scoring and rank noisiest-first.
pub fn batch_analyze_and_rank(
    files: &[BandedSeries<'_>],
    cal: &Calibration,
) -> Vec<NoiseAnalysisResult> {
    let mut results: Vec<NoiseAnalysisResult> = files
        .iter()
        .map(|file| analyze(file.points, file.filename, cal))
        .collect();
    results.sort_by(|a, b| b.noisiness_index.total_cmp(&a.noisiness_index));
    results
}

// ---------------------------------------------------------------------------
// Band-relative mode
// ---------------------------------------------------------------------------

/// One file's series plus its classified band, the input unit of the
/// band-relative batch.
#[derive(Debug, Clone, Copy)]
pub struct BandedSeries<'a> {
    pub filename: &'a str,
    pub points: &'a [DataPoint],
    /// `None` files form their own comparison group.
    pub band: Option<Band>,
}

/// Rank-normalize noisiness within each band group on a 1–10 scale.
///
/// Within a group, the file with the lowest mean amplitude scores 1 and the
/// highest scores 10, linearly in between. A group whose mean-amplitude
/// range is at or below the sensitivity floor gets the neutral mid score
/// for every member. Files without a single finite amplitude are excluded.
/// Scores are comparable only inside one group, never across bands; the
/// whole batch is recomputed whenever group membership changes.
pub fn analyze_band_relative(
    files: &[BandedSeries<'_>],
    cal: &Calibration,
) -> Vec<NoiseAnalysisResult> {
    if files.is_empty() {
        return Vec::new();
    }

    let mut groups: BTreeMap<Option<Band>, Vec<&BandedSeries<'_>>> = BTreeMap::new();
    for file in files {
        groups.entry(file.band).or_default().push(file);
    }

    let mut results = Vec::with_capacity(files.len());

    for (band, group) in groups {
        let rated: Vec<(&BandedSeries<'_>, Vec<f64>, f64)> = group
            .iter()
            .filter_map(|file| {
                let amplitudes: Vec<f64> = file
                    .points
                    .iter()
                    .map(|p| p.amplitude)
                    .filter(|a| a.is_finite())
                    .collect();
                if amplitudes.is_empty() {
                    log::debug!("{}: no finite amplitudes, excluded from group", file.filename);
                    return None;
                }
                let avg = mean(&amplitudes);
                Some((*file, amplitudes, avg))
            })
            .collect();

        if rated.is_empty() {
            continue;
        }

        let min_avg = rated.iter().map(|r| r.2).fold(f64::INFINITY, f64::min);
        let max_avg = rated.iter().map(|r| r.2).fold(f64::NEG_INFINITY, f64::max);
        let range = max_avg - min_avg;

        log::debug!(
            "band {:?}: {} files, mean amplitude {:.1}..{:.1} dB",
            band,
            rated.len(),
            min_avg,
            max_avg
        );

        for (file, amplitudes, avg) in rated {
            let relative_position = if range > cal.group_sensitivity_floor_db {
                (avg - min_avg) / range
            } else {
                0.5
            };
            let score = (relative_position * 9.0 + 1.0).round();

            let confidence = if amplitudes.len() >= 100 {
                Confidence::High
            } else if amplitudes.len() >= 50 {
                Confidence::Medium
            } else {
                Confidence::Low
            };

            results.push(NoiseAnalysisResult {
                filename: file.filename.to_string(),
                noisiness_index: score,
                metrics: NoisinessMetrics {
                    // Relative position inside the group, not the absolute score.
                    average_amplitude: relative_position,
                    variance_score: variance_score(&amplitudes, cal),
                    peak_to_rms_ratio: peak_to_rms_score(&amplitudes, cal),
                    spectral_flatness: spectral_flatness(&amplitudes),
                    high_freq_content: high_freq_content(file.points),
                    small_peak_density: small_peak_density(&amplitudes, cal),
                    overall_noisiness: score,
                },
                confidence,
                category: categorize_relative(score),
            });
        }
    }

    results
}

// ---------------------------------------------------------------------------
// Component metrics
// ---------------------------------------------------------------------------

struct RawMetrics {
    average_amplitude: f64,
    variance_score: f64,
    peak_to_rms_ratio: f64,
    spectral_flatness: f64,
    high_freq_content: f64,
    small_peak_density: f64,
    signal_smoothness: f64,
    dynamic_range: f64,
}

/// Normalized + sharpened mean amplitude, the dominant indicator.
fn average_amplitude_score(amplitudes: &[f64], cal: &Calibration) -> f64 {
    let valid: Vec<f64> = amplitudes.iter().copied().filter(|a| a.is_finite()).collect();
    if valid.is_empty() {
        return 0.0;
    }
    let average = mean(&valid);
    if !average.is_finite() {
        return 0.0;
    }

    let span = cal.max_expected_amplitude_db - cal.min_expected_amplitude_db;
    let normalized = ((average - cal.min_expected_amplitude_db) / span).clamp(0.0, 1.0);
    let sharpened = sigmoid((normalized - 0.5) * cal.amplitude_steepness);
    finite_or(sharpened, 0.5, "average amplitude score")
}

/// IQR-derived normalizer for the variance score: clean sweeps have a small
/// interquartile range, noisy ones a large one.
fn adaptive_threshold(amplitudes: &[f64]) -> f64 {
    if amplitudes.is_empty() {
        return 10.0;
    }
    let mut sorted = amplitudes.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    let q1 = sorted[(n as f64 * 0.25) as usize];
    let q3 = sorted[(n as f64 * 0.75) as usize];
    let iqr = q3 - q1;
    (iqr * 2.0 + 5.0).clamp(3.0, 25.0)
}

fn variance_score(amplitudes: &[f64], cal: &Calibration) -> f64 {
    let valid: Vec<f64> = amplitudes.iter().copied().filter(|a| a.is_finite()).collect();
    if valid.is_empty() {
        return 0.0;
    }
    let std_dev = std_deviation(&valid);
    let normalized = std_dev / adaptive_threshold(&valid);
    let score = sigmoid(cal.variance_steepness * (normalized - 1.0));
    finite_or(score, 0.0, "variance score")
}

/// Crest factor (peak/RMS) blended with a skewness penalty, 70/30.
fn peak_to_rms_score(amplitudes: &[f64], cal: &Calibration) -> f64 {
    let valid: Vec<f64> = amplitudes.iter().copied().filter(|a| a.is_finite()).collect();
    if valid.is_empty() {
        return 0.0;
    }

    let peak = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let rms = (valid.iter().map(|v| v * v).sum::<f64>() / valid.len() as f64).sqrt();
    if !peak.is_finite() || !rms.is_finite() || rms == 0.0 {
        return 0.0;
    }

    let crest_factor = peak / rms;
    if !crest_factor.is_finite() {
        return 0.0;
    }

    let average = mean(&valid);
    let skew = skewness(&valid, average);

    let crest_score = sigmoid(cal.crest_steepness * (crest_factor - cal.crest_factor_center));
    let skewness_score = skew.abs() / 3.0;

    (crest_score * 0.7 + (1.0 - skewness_score) * 0.3).clamp(0.0, 1.0)
}

fn skewness(amplitudes: &[f64], mean_value: f64) -> f64 {
    if amplitudes.is_empty() {
        return 0.0;
    }
    let std_dev = std_deviation(amplitudes);
    if std_dev == 0.0 {
        return 0.0;
    }
    let skew = amplitudes
        .iter()
        .map(|v| ((v - mean_value) / std_dev).powi(3))
        .sum::<f64>()
        / amplitudes.len() as f64;
    finite_or(skew, 0.0, "skewness")
}

/// Geometric-mean / arithmetic-mean ratio of the linear-scale amplitudes.
/// The geometric mean runs in log-space so long quiet sweeps cannot
/// underflow the product.
fn spectral_flatness(amplitudes: &[f64]) -> f64 {
    if amplitudes.is_empty() {
        return 0.0;
    }

    let linear: Vec<f64> = amplitudes
        .iter()
        .map(|&amp| 10f64.powf(amp / 20.0).max(1e-12))
        .collect();

    let log_sum: f64 = linear
        .iter()
        .map(|&v| finite_or(v.ln(), -27.6, "log amplitude"))
        .sum();
    let geometric_mean = (log_sum / linear.len() as f64).exp();
    let arithmetic_mean = mean(&linear);

    if !geometric_mean.is_finite() || !arithmetic_mean.is_finite() || arithmetic_mean == 0.0 {
        return 0.0;
    }

    let flatness = geometric_mean / arithmetic_mean;
    if flatness.is_finite() {
        flatness.min(1.0)
    } else {
        0.0
    }
}

/// Mean amplitude of the top-25 %-by-frequency slice relative to the rest,
/// rescaled from [0.5, 2.0] onto [0, 1].
fn high_freq_content(points: &[DataPoint]) -> f64 {
    if points.len() < 4 {
        return 0.0;
    }

    let valid: Vec<DataPoint> = points
        .iter()
        .copied()
        .filter(|p| p.frequency.is_finite() && p.amplitude.is_finite())
        .collect();
    if valid.len() < 4 {
        return 0.0;
    }

    let mut sorted = valid.clone();
    sorted.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));
    let low = sorted[0].frequency;
    let high = sorted[sorted.len() - 1].frequency;
    let total_range = high - low;
    if total_range == 0.0 || !total_range.is_finite() {
        return 0.0;
    }

    let threshold = low + total_range * 0.75;
    let (high_part, low_part): (Vec<&DataPoint>, Vec<&DataPoint>) =
        valid.iter().partition(|p| p.frequency >= threshold);
    if high_part.is_empty() || low_part.is_empty() {
        return 0.0;
    }

    let high_mean = high_part.iter().map(|p| p.amplitude).sum::<f64>() / high_part.len() as f64;
    let low_mean = low_part.iter().map(|p| p.amplitude).sum::<f64>() / low_part.len() as f64;
    if !high_mean.is_finite() || !low_mean.is_finite() || low_mean == 0.0 {
        return 0.0;
    }

    let ratio = high_mean / low_mean;
    if !ratio.is_finite() {
        return 0.0;
    }

    let score = ((ratio - 0.5) / 1.5).clamp(0.0, 1.0);
    finite_or(score, 0.0, "high frequency content")
}

/// Fraction of points standing at least the threshold above both 2-point
/// neighbor averages, scaled so 10 peaks per 100 points saturates at 1.
fn small_peak_density(amplitudes: &[f64], cal: &Calibration) -> f64 {
    let valid: Vec<f64> = amplitudes.iter().copied().filter(|a| a.is_finite()).collect();
    if valid.len() < 5 {
        return 0.0;
    }

    let threshold = cal.small_peak_threshold_db;
    let mut peak_count = 0usize;
    for i in 2..valid.len() - 2 {
        let current = valid[i];
        let left_avg = (valid[i - 1] + valid[i - 2]) / 2.0;
        let right_avg = (valid[i + 1] + valid[i + 2]) / 2.0;
        if current > left_avg + threshold && current > right_avg + threshold {
            peak_count += 1;
        }
    }

    let density = (peak_count as f64 / valid.len() as f64) * 100.0;
    if !density.is_finite() {
        return 0.0;
    }
    (density / 10.0).min(1.0)
}

/// Average absolute second derivative through a sigmoid: jagged sweeps
/// score high. Currently weighted 0 in the blend.
fn signal_smoothness(amplitudes: &[f64], cal: &Calibration) -> f64 {
    if amplitudes.len() < 3 {
        return 0.0;
    }
    let mut total_variation = 0.0;
    for i in 1..amplitudes.len() - 1 {
        let second_derivative = amplitudes[i + 1] - 2.0 * amplitudes[i] + amplitudes[i - 1];
        total_variation += second_derivative.abs();
    }
    let avg_variation = total_variation / (amplitudes.len() - 2) as f64;
    sigmoid(cal.smoothness_steepness * (avg_variation - cal.smoothness_center))
}

/// Min-to-max amplitude span normalized by the calibrated full range.
/// Currently weighted 0 in the blend.
fn dynamic_range(amplitudes: &[f64], cal: &Calibration) -> f64 {
    if amplitudes.is_empty() {
        return 0.0;
    }
    let min = amplitudes.iter().copied().fold(f64::INFINITY, f64::min);
    let max = amplitudes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    ((max - min) / cal.dynamic_range_span_db).min(1.0)
}

/// Reduced-data score (0–100): mean-amplitude dominant with a fixed-scale
/// standard-deviation sigmoid as the minor term.
fn simple_noisiness(amplitudes: &[f64], cal: &Calibration) -> f64 {
    if amplitudes.is_empty() {
        return 50.0;
    }

    let average_amplitude_score = average_amplitude_score(amplitudes, cal);
    let std_dev = std_deviation(amplitudes);
    let normalized_std = std_dev / cal.simple_std_norm_db;
    let variance_score = 100.0 * sigmoid(cal.simple_variance_steepness * (normalized_std - 1.0));
    let variance_normalized = variance_score.clamp(5.0, 95.0) / 100.0;

    let combined = average_amplitude_score * 0.95 + variance_normalized * 0.05;
    (combined * 100.0).round().clamp(5.0, 95.0)
}

/// Weighted blend of the component metrics, sharpened and scaled to 1–99.
fn combine_metrics(raw: &RawMetrics, cal: &Calibration) -> f64 {
    let weighted_sum = finite_or(raw.average_amplitude, 0.5, "average amplitude")
        * W_AVERAGE_AMPLITUDE
        + finite_or(raw.variance_score, 0.5, "variance") * W_VARIANCE
        + finite_or(raw.peak_to_rms_ratio, 0.5, "peak-to-RMS") * W_PEAK_TO_RMS
        + finite_or(raw.spectral_flatness, 0.5, "spectral flatness") * W_SPECTRAL_FLATNESS
        + finite_or(raw.high_freq_content, 0.5, "high-frequency content") * W_HIGH_FREQ_CONTENT
        + finite_or(raw.small_peak_density, 0.5, "small-peak density") * W_SMALL_PEAK_DENSITY
        + finite_or(raw.signal_smoothness, 0.5, "smoothness") * W_SIGNAL_SMOOTHNESS
        + finite_or(raw.dynamic_range, 0.5, "dynamic range") * W_DYNAMIC_RANGE;

    let sharpened = sigmoid((weighted_sum - 0.5) * cal.final_steepness);
    let result = sharpened * 100.0;
    if result.is_finite() {
        result.clamp(1.0, 99.0)
    } else {
        50.0
    }
}

fn assess_confidence(data_len: usize, frequencies: &[f64]) -> Confidence {
    let freq_range = match (
        frequencies.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        frequencies.iter().copied().fold(f64::INFINITY, f64::min),
    ) {
        (max, min) if max.is_finite() && min.is_finite() => max - min,
        _ => 0.0,
    };

    if data_len >= 1000 && freq_range > 0.0 {
        Confidence::High
    } else if data_len >= 100 && freq_range > 0.0 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

// ---------------------------------------------------------------------------
// Numeric helpers
// ---------------------------------------------------------------------------

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_deviation(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Substitute a neutral fallback for non-finite intermediates. The
/// substitution is traced: it indicates degenerate input, not a normal path.
fn finite_or(value: f64, fallback: f64, what: &str) -> f64 {
    if value.is_finite() {
        value
    } else {
        log::trace!("non-finite {what}, substituting {fallback}");
        fallback
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_series(n: usize, amplitude: f64) -> Vec<DataPoint> {
        (0..n)
            .map(|i| DataPoint::new(1e6 + i as f64 * 1e4, amplitude))
            .collect()
    }

    /// Deterministic sawtooth around a floor, no RNG needed.
    fn jittered_series(n: usize, floor: f64, swing: f64) -> Vec<DataPoint> {
        (0..n)
            .map(|i| {
                let jitter = ((i % 7) as f64 - 3.0) / 3.0 * swing;
                DataPoint::new(1e6 + i as f64 * 1e4, floor + jitter)
            })
            .collect()
    }

    #[test]
    fn absolute_score_stays_in_bounds() {
        for amplitude in [-120.0, -75.0, -30.0, 0.0, 40.0] {
            let result = analyze(&jittered_series(200, amplitude, 6.0), "x.csv", &Calibration::default());
            assert!(
                (1.0..=99.0).contains(&result.noisiness_index),
                "amplitude {amplitude}: score {}",
                result.noisiness_index
            );
            assert_eq!(result.noisiness_index, result.noisiness_index.round());
        }
    }

    #[test]
    fn louder_sweep_scores_noisier() {
        let cal = Calibration::default();
        let quiet = analyze(&jittered_series(500, -70.0, 4.0), "quiet.csv", &cal);
        let loud = analyze(&jittered_series(500, -20.0, 4.0), "loud.csv", &cal);
        assert!(
            loud.noisiness_index > quiet.noisiness_index,
            "loud {} vs quiet {}",
            loud.noisiness_index,
            quiet.noisiness_index
        );
    }

    #[test]
    fn two_points_use_amplitude_only_estimate() {
        let points = vec![DataPoint::new(1e6, -50.0), DataPoint::new(2e6, -40.0)];
        let result = analyze(&points, "tiny.csv", &Calibration::default());
        assert_eq!(result.confidence, Confidence::Low);
        // round(sigmoid((0.35 - 0.5) * 6) * 95 + 5) for a -45 dB mean.
        assert_eq!(result.noisiness_index, 32.0);
        assert_eq!(result.metrics.variance_score, 0.0);
        assert_eq!(result.category, NoisinessCategory::Moderate);
    }

    #[test]
    fn empty_input_gets_neutral_score() {
        let result = analyze(&[], "empty.csv", &Calibration::default());
        assert_eq!(result.noisiness_index, 50.0);
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.category, NoisinessCategory::Moderate);
    }

    #[test]
    fn sparse_finite_samples_take_reduced_path() {
        // 12 points but only 6 finite amplitudes: the 95/5 blend applies
        // and the placeholder metrics mark the reduced path.
        let mut points = flat_series(6, -55.0);
        for i in 0..6 {
            points.push(DataPoint::new(2e6 + i as f64 * 1e4, f64::NAN));
        }
        let result = analyze(&points, "sparse.csv", &Calibration::default());
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.metrics.peak_to_rms_ratio, 0.5);
        assert!((1.0..=99.0).contains(&result.noisiness_index));
    }

    #[test]
    fn non_finite_amplitudes_never_panic_full_path() {
        let mut points = jittered_series(50, -60.0, 5.0);
        points[7].amplitude = f64::INFINITY;
        points[13].amplitude = f64::NAN;
        let result = analyze(&points, "dirty.csv", &Calibration::default());
        assert!((1.0..=99.0).contains(&result.noisiness_index));
    }

    #[test]
    fn confidence_scales_with_sample_count() {
        let cal = Calibration::default();
        assert_eq!(
            analyze(&jittered_series(1000, -50.0, 3.0), "big.csv", &cal).confidence,
            Confidence::High
        );
        assert_eq!(
            analyze(&jittered_series(150, -50.0, 3.0), "mid.csv", &cal).confidence,
            Confidence::Medium
        );
        assert_eq!(
            analyze(&jittered_series(20, -50.0, 3.0), "small.csv", &cal).confidence,
            Confidence::Low
        );
    }

    #[test]
    fn flat_series_has_unit_spectral_flatness() {
        let amps = vec![-30.0; 64];
        let flatness = spectral_flatness(&amps);
        assert!((flatness - 1.0).abs() < 1e-9, "flatness {flatness}");
    }

    #[test]
    fn adaptive_threshold_clamps_to_range() {
        assert_eq!(adaptive_threshold(&[-50.0; 40]), 5.0); // iqr 0 → 2*0+5
        let wide: Vec<f64> = (0..40).map(|i| i as f64 * 3.0).collect();
        assert_eq!(adaptive_threshold(&wide), 25.0); // hits the ceiling
    }

    #[test]
    fn small_peak_density_counts_spikes() {
        let mut amps = vec![-70.0; 100];
        for i in (10..90).step_by(10) {
            amps[i] = -60.0;
        }
        let density = small_peak_density(&amps, &Calibration::default());
        assert!(density > 0.0);
        assert!(density <= 1.0);
    }

    // ---- band-relative mode ----

    #[test]
    fn band_relative_extremes_score_one_and_ten() {
        let quiet = flat_series(120, -60.0);
        let loud = flat_series(120, -20.0);
        let files = vec![
            BandedSeries { filename: "quiet.csv", points: &quiet, band: Some(Band::B5) },
            BandedSeries { filename: "loud.csv", points: &loud, band: Some(Band::B5) },
        ];
        let mut results = analyze_band_relative(&files, &Calibration::default());
        results.sort_by(|a, b| a.filename.cmp(&b.filename));
        let loud_result = &results[0];
        let quiet_result = &results[1];
        assert_eq!(loud_result.noisiness_index, 10.0);
        assert_eq!(loud_result.category, NoisinessCategory::VeryNoisy);
        assert_eq!(quiet_result.noisiness_index, 1.0);
        assert_eq!(quiet_result.category, NoisinessCategory::VeryQuiet);
        assert_eq!(loud_result.confidence, Confidence::High);
    }

    #[test]
    fn band_relative_monotone_in_mean_amplitude() {
        let a = flat_series(60, -70.0);
        let b = flat_series(60, -50.0);
        let c = flat_series(60, -30.0);
        let files = vec![
            BandedSeries { filename: "a.csv", points: &a, band: Some(Band::B2) },
            BandedSeries { filename: "b.csv", points: &b, band: Some(Band::B2) },
            BandedSeries { filename: "c.csv", points: &c, band: Some(Band::B2) },
        ];
        let results = analyze_band_relative(&files, &Calibration::default());
        let score_of = |name: &str| {
            results
                .iter()
                .find(|r| r.filename == name)
                .unwrap()
                .noisiness_index
        };
        assert_eq!(score_of("a.csv"), 1.0);
        assert_eq!(score_of("b.csv"), 6.0); // round(0.5 * 9 + 1)
        assert_eq!(score_of("c.csv"), 10.0);
        assert!(score_of("a.csv") <= score_of("b.csv"));
        assert!(score_of("b.csv") <= score_of("c.csv"));
    }

    #[test]
    fn near_identical_group_collapses_to_neutral() {
        let a = flat_series(40, -50.00);
        let b = flat_series(40, -50.05);
        let files = vec![
            BandedSeries { filename: "a.csv", points: &a, band: Some(Band::B1) },
            BandedSeries { filename: "b.csv", points: &b, band: Some(Band::B1) },
        ];
        let results = analyze_band_relative(&files, &Calibration::default());
        assert!(results.iter().all(|r| r.noisiness_index == 6.0));
        assert!(results.iter().all(|r| r.category == NoisinessCategory::Moderate));
    }

    #[test]
    fn groups_are_scored_independently() {
        let a = flat_series(40, -80.0);
        let b = flat_series(40, -10.0);
        let files = vec![
            BandedSeries { filename: "solo_b0.csv", points: &a, band: Some(Band::B0) },
            BandedSeries { filename: "solo_b7.csv", points: &b, band: Some(Band::B7) },
        ];
        let results = analyze_band_relative(&files, &Calibration::default());
        // Each single-member group has zero range: both collapse to neutral
        // despite wildly different absolute levels.
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.noisiness_index == 6.0));
    }

    #[test]
    fn unbanded_files_form_their_own_group() {
        let a = flat_series(40, -60.0);
        let b = flat_series(40, -30.0);
        let files = vec![
            BandedSeries { filename: "a.csv", points: &a, band: None },
            BandedSeries { filename: "b.csv", points: &b, band: None },
        ];
        let results = analyze_band_relative(&files, &Calibration::default());
        assert_eq!(results.len(), 2);
        let scores: Vec<f64> = results.iter().map(|r| r.noisiness_index).collect();
        assert!(scores.contains(&1.0) && scores.contains(&10.0));
    }

    #[test]
    fn files_without_finite_amplitudes_are_excluded() {
        let good = flat_series(40, -50.0);
        let bad: Vec<DataPoint> = (0..10).map(|i| DataPoint::new(i as f64, f64::NAN)).collect();
        let files = vec![
            BandedSeries { filename: "good.csv", points: &good, band: Some(Band::B4) },
            BandedSeries { filename: "bad.csv", points: &bad, band: Some(Band::B4) },
        ];
        let results = analyze_band_relative(&files, &Calibration::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].filename, "good.csv");
    }

    #[test]
    fn batch_rank_orders_noisiest_first() {
        let quiet = flat_series(60, -70.0);
        let mid = flat_series(60, -40.0);
        let loud = flat_series(60, -10.0);
        let files = vec![
            BandedSeries { filename: "mid.csv", points: &mid, band: None },
            BandedSeries { filename: "loud.csv", points: &loud, band: None },
            BandedSeries { filename: "quiet.csv", points: &quiet, band: None },
        ];
        let ranked = batch_analyze_and_rank(&files, &Calibration::default());
        assert_eq!(ranked[0].filename, "loud.csv");
        assert_eq!(ranked[2].filename, "quiet.csv");
        for pair in ranked.windows(2) {
            assert!(pair[0].noisiness_index >= pair[1].noisiness_index);
        }
    }

    #[test]
    fn category_tables_cover_both_scales() {
        assert_eq!(categorize_relative(1.0), NoisinessCategory::VeryQuiet);
        assert_eq!(categorize_relative(6.0), NoisinessCategory::Moderate);
        assert_eq!(categorize_relative(10.0), NoisinessCategory::VeryNoisy);
        assert_eq!(categorize_absolute(15.0), NoisinessCategory::VeryQuiet);
        assert_eq!(categorize_absolute(55.0), NoisinessCategory::Moderate);
        assert_eq!(categorize_absolute(95.0), NoisinessCategory::VeryNoisy);
    }
}

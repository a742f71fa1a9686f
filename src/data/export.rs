use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use super::bands::Band;
use super::model::Dataset;

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Serialize the overlay datasets to CSV text: an optional `#` comment
/// header block, a column header row, then one row per point tagged with
/// its dataset filename.
pub fn export_csv(
    datasets: &[Dataset],
    include_header: bool,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    if datasets.is_empty() {
        return Ok(String::new());
    }

    let mut out = String::new();

    if include_header {
        out.push_str("# EMC View Export\n");
        out.push_str(&format!("# Generated: {}\n", generated_at.to_rfc3339()));
        out.push_str(&format!("# Datasets: {}\n", datasets.len()));
        out.push_str("#\n");
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["Frequency (Hz)", "Amplitude (dBμV/m)", "Dataset"])
        .context("writing CSV header")?;

    for dataset in datasets {
        for point in &dataset.points {
            writer
                .write_record([
                    point.frequency.to_string(),
                    point.amplitude.to_string(),
                    dataset.filename.clone(),
                ])
                .with_context(|| format!("writing rows for {}", dataset.filename))?;
        }
    }

    let bytes = writer.into_inner().context("flushing CSV writer")?;
    out.push_str(&String::from_utf8(bytes).context("CSV output was not UTF-8")?);
    Ok(out)
}

/// Suggested export filename: `emc_export[_<band>][_<run>]_<YYYY-MM-DD>.csv`.
pub fn export_filename(
    band: Option<Band>,
    run_id: Option<&str>,
    timestamp: DateTime<Utc>,
) -> String {
    let mut parts = vec!["emc_export".to_string()];
    if let Some(band) = band {
        parts.push(band.to_string().to_lowercase());
    }
    if let Some(run_id) = run_id {
        parts.push(run_id.to_string());
    }
    parts.push(timestamp.format("%Y-%m-%d").to_string());
    format!("{}.csv", parts.join("_"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

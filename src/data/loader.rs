use std::io;
use std::path::Path;

use thiserror::Error;

use super::model::{DataPoint, ParseResult};
use crate::config::AppConfig;

// ---------------------------------------------------------------------------
// File access capability
// ---------------------------------------------------------------------------

/// File access seam so parsing can be exercised against in-memory content.
/// `len` is consulted before `read`: oversized files are rejected without
/// their content ever being loaded.
pub trait FileSource {
    fn len(&self, path: &Path) -> io::Result<u64>;
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl FileSource for FsSource {
    fn len(&self, path: &Path) -> io::Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

// ---------------------------------------------------------------------------
// Precondition errors
// ---------------------------------------------------------------------------

/// File-level precondition failures, checked before any content parsing.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unsupported file type. Please select a valid file.")]
    UnsupportedType,
    #[error("File size exceeds maximum limit of {limit_mib}MB")]
    TooLarge { limit_mib: u64 },
    #[error("Failed to read file: {0}")]
    Io(#[from] io::Error),
}

/// Whether the path's extension is on the configured CSV/text allowlist.
pub fn is_supported_file(path: &Path, config: &AppConfig) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    config.supported_extensions.iter().any(|s| s == &ext)
}

fn validate_file<S: FileSource>(
    source: &S,
    path: &Path,
    config: &AppConfig,
) -> Result<(), LoadError> {
    if !is_supported_file(path, config) {
        return Err(LoadError::UnsupportedType);
    }
    let size = source.len(path)?;
    if size > config.max_file_size {
        return Err(LoadError::TooLarge {
            limit_mib: config.max_file_size / (1024 * 1024),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load and parse one measurement file. Preconditions (extension allowlist,
/// size cap) fail fast as a single-error result; everything else flows
/// through [`parse_csv_text`]. Never panics: all failures are result values.
pub fn load_file<S: FileSource>(source: &S, path: &Path, config: &AppConfig) -> ParseResult {
    if let Err(err) = validate_file(source, path, config) {
        log::warn!("rejected {}: {err}", path.display());
        return ParseResult::failure(err.to_string());
    }

    let bytes = match source.read(path) {
        Ok(bytes) => bytes,
        Err(err) => return ParseResult::failure(LoadError::Io(err).to_string()),
    };

    parse_csv_text(&String::from_utf8_lossy(&bytes))
}

// ---------------------------------------------------------------------------
// Text parsing
// ---------------------------------------------------------------------------

const NO_DATA_FOUND: &str = "No valid data found in the file.";
const NO_MARKER_WARNING: &str = "No DATA marker found. Processing from first line.";

/// Parse whole-file text into a sorted point sequence.
///
/// Layout: free-form header lines, an optional sentinel line whose trimmed
/// content is exactly `DATA` or `DATA,`, then comma-separated
/// `frequency,amplitude[,...]` rows. Blank and `#`/`//` comment lines are
/// skipped; malformed rows are counted and summarized as a warning, never a
/// fatal error. Points come back sorted ascending by frequency.
pub fn parse_csv_text(text: &str) -> ParseResult {
    let lines: Vec<&str> = text.lines().collect();
    let mut warnings = Vec::new();

    let data_start = match lines
        .iter()
        .position(|line| matches!(line.trim(), "DATA" | "DATA,"))
    {
        Some(i) => i + 1,
        None => {
            warnings.push(NO_MARKER_WARNING.to_string());
            0
        }
    };

    let mut points = Vec::new();
    let mut invalid_rows = 0usize;

    for line in &lines[data_start.min(lines.len())..] {
        match parse_data_line(line) {
            LineOutcome::Point(point) => points.push(point),
            LineOutcome::Invalid => invalid_rows += 1,
            LineOutcome::Skip => {}
        }
    }

    if points.is_empty() {
        return ParseResult {
            success: false,
            data: None,
            errors: vec![NO_DATA_FOUND.to_string()],
            warnings,
        };
    }

    if invalid_rows > 0 {
        warnings.push(format!("{invalid_rows} invalid rows were skipped"));
    }

    // Stable sort keeps duplicate-frequency rows in file order.
    points.sort_by(|a: &DataPoint, b: &DataPoint| a.frequency.total_cmp(&b.frequency));

    ParseResult {
        success: true,
        data: Some(points),
        errors: Vec::new(),
        warnings,
    }
}

// ---------------------------------------------------------------------------
// Numeric line parser
// ---------------------------------------------------------------------------

/// Per-line outcome: skipped lines are not counted against the file,
/// invalid ones are.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineOutcome {
    Skip,
    Invalid,
    Point(DataPoint),
}

/// Parse one raw CSV row into a (frequency, amplitude) pair. The first two
/// comma-separated fields are the candidates; both must sanitize to finite
/// numbers. Extra columns are ignored.
pub fn parse_data_line(line: &str) -> LineOutcome {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
        return LineOutcome::Skip;
    }

    let mut fields = trimmed.split(',');
    let (Some(freq_field), Some(amp_field)) = (fields.next(), fields.next()) else {
        return LineOutcome::Invalid;
    };

    match (sanitize_number(freq_field), sanitize_number(amp_field)) {
        (Some(frequency), Some(amplitude)) => {
            LineOutcome::Point(DataPoint::new(frequency, amplitude))
        }
        _ => LineOutcome::Invalid,
    }
}

/// Strip everything that is not part of a float literal (units, stray
/// symbols), then require the remainder to parse as a finite `f64`.
fn sanitize_number(field: &str) -> Option<f64> {
    let cleaned: String = field
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::*;
    use crate::config::AppConfig;

    /// In-memory [`FileSource`] for exercising the loader without a disk.
    struct MemSource(HashMap<PathBuf, Vec<u8>>);

    impl MemSource {
        fn with(path: &str, content: &str) -> Self {
            let mut files = HashMap::new();
            files.insert(PathBuf::from(path), content.as_bytes().to_vec());
            MemSource(files)
        }
    }

    impl FileSource for MemSource {
        fn len(&self, path: &Path) -> io::Result<u64> {
            self.0
                .get(path)
                .map(|b| b.len() as u64)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
        }

        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
        }
    }

    #[test]
    fn parses_and_sorts_after_sentinel() {
        let result = parse_csv_text("DATA\n100,-50\n200,-40\n50,-60\n");
        assert!(result.success);
        assert!(result.warnings.is_empty());
        let data = result.data.unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data[0], DataPoint::new(50.0, -60.0));
        assert_eq!(data[1], DataPoint::new(100.0, -50.0));
        assert_eq!(data[2], DataPoint::new(200.0, -40.0));
    }

    #[test]
    fn missing_sentinel_warns_and_parses_from_start() {
        let result = parse_csv_text("1,abc\n2,-30\n");
        assert!(result.success);
        assert_eq!(result.data.as_deref(), Some(&[DataPoint::new(2.0, -30.0)][..]));
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains("No DATA marker"));
        assert!(result.warnings[1].contains("1 invalid rows"));
    }

    #[test]
    fn sentinel_with_trailing_comma_and_header_noise() {
        let text = "Model,N9038A\nRun,42\nDATA,\n1000,-70\n2000,-65\n";
        let result = parse_csv_text(text);
        assert!(result.success);
        assert!(result.warnings.is_empty());
        assert_eq!(result.data.unwrap().len(), 2);
    }

    #[test]
    fn comments_and_blanks_are_skipped_not_counted() {
        let text = "DATA\n# comment\n// another\n\n   \n100,-50\n";
        let result = parse_csv_text(text);
        assert!(result.success);
        // No invalid-row warning: skipped lines are not defects.
        assert!(result.warnings.is_empty());
        assert_eq!(result.data.unwrap().len(), 1);
    }

    #[test]
    fn row_count_conservation() {
        // 5 non-blank non-comment lines after the sentinel: 3 valid, 2 invalid.
        let text = "DATA\n1,-10\nbogus\n2,-20\nx,y\n3,-30\n";
        let result = parse_csv_text(text);
        let data = result.data.unwrap();
        assert_eq!(data.len(), 3);
        assert!(result.warnings.iter().any(|w| w.contains("2 invalid rows")));
    }

    #[test]
    fn units_are_stripped_from_fields() {
        let result = parse_csv_text("DATA\n100 Hz, -50 dB\n1.5e6 Hz,-42.5\n");
        let data = result.data.unwrap();
        assert_eq!(data[0], DataPoint::new(100.0, -50.0));
        assert_eq!(data[1], DataPoint::new(1.5e6, -42.5));
    }

    #[test]
    fn single_field_rows_are_invalid() {
        assert_eq!(parse_data_line("12345"), LineOutcome::Invalid);
        assert_eq!(parse_data_line(""), LineOutcome::Skip);
        assert_eq!(parse_data_line("# header"), LineOutcome::Skip);
    }

    #[test]
    fn extra_columns_are_ignored() {
        assert_eq!(
            parse_data_line("100,-50,peak-hold,3"),
            LineOutcome::Point(DataPoint::new(100.0, -50.0))
        );
    }

    #[test]
    fn empty_input_is_structural_failure() {
        let result = parse_csv_text("");
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.errors, vec![NO_DATA_FOUND.to_string()]);
    }

    #[test]
    fn parsing_is_idempotent() {
        let text = "DATA\n300,-55\n100,-50\n100,-60\n";
        let first = parse_csv_text(text);
        let second = parse_csv_text(text);
        assert_eq!(first.data, second.data);
        // Stable sort: the two 100 Hz rows keep file order.
        let data = first.data.unwrap();
        assert_eq!(data[0].amplitude, -50.0);
        assert_eq!(data[1].amplitude, -60.0);
    }

    #[test]
    fn sort_invariant_holds() {
        let result = parse_csv_text("DATA\n5,-1\n3,-2\n4,-3\n1,-4\n2,-5\n");
        let data = result.data.unwrap();
        for pair in data.windows(2) {
            assert!(pair[0].frequency <= pair[1].frequency);
        }
    }

    #[test]
    fn unsupported_extension_fails_fast() {
        let config = AppConfig::default();
        let source = MemSource::with("scan.parquet", "DATA\n1,2\n");
        let result = load_file(&source, Path::new("scan.parquet"), &config);
        assert!(!result.success);
        assert!(result.errors[0].contains("Unsupported file type"));
    }

    #[test]
    fn oversized_file_fails_fast() {
        let config = AppConfig {
            max_file_size: 8,
            ..AppConfig::default()
        };
        let source = MemSource::with("scan.csv", "DATA\n100,-50\n200,-40\n");
        let result = load_file(&source, Path::new("scan.csv"), &config);
        assert!(!result.success);
        assert!(result.errors[0].contains("exceeds maximum limit"));
    }

    #[test]
    fn load_file_happy_path() {
        let config = AppConfig::default();
        let source = MemSource::with("b5_run.csv", "DATA\n30e6,-48\n25e6,-52\n");
        let result = load_file(&source, Path::new("b5_run.csv"), &config);
        assert!(result.success, "errors: {:?}", result.errors);
        assert_eq!(result.data.unwrap()[0].frequency, 25e6);
    }
}

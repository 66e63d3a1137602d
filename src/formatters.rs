/// Human-readable statistics for the compression workflow
///
/// Every function in this module is pure; the workflow state feeds it raw
/// byte counts and durations and gets display strings back.
use crate::constants::{DEFAULT_DECIMALS, MISSING_STAT, SIZE_THRESHOLD, SIZE_UNITS};

/// Format a byte count with binary units and two decimals
///
/// # Examples
/// ```
/// use pca_squeeze::formatters::format_bytes;
///
/// assert_eq!(format_bytes(1536), "1.5 KB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    format_bytes_with(bytes, DEFAULT_DECIMALS)
}

/// Format a byte count with binary units and the given precision
///
/// # Arguments
/// * `bytes` - Size in bytes
/// * `decimals` - Maximum number of decimals; negative values mean none
///
/// # Returns
/// * Human-readable size string with trailing zeros dropped (e.g. "1 MB", "1.5 KB")
pub fn format_bytes_with(bytes: u64, decimals: i32) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let precision = decimals.max(0) as usize;

    // floor(log_1024(bytes)) computed on integers, clamped to the last unit
    let mut unit_index = 0;
    let mut divisor = 1u64;
    while unit_index < SIZE_UNITS.len() - 1 && bytes / divisor >= SIZE_THRESHOLD {
        divisor *= SIZE_THRESHOLD;
        unit_index += 1;
    }

    let scaled = to_fixed(bytes as f64 / divisor as f64, precision);
    format!("{} {}", trim_trailing_zeros(&scaled), SIZE_UNITS[unit_index])
}

/// Fixed-point rendering where an exact tie rounds away from zero.
///
/// `{:.N}` resolves a tie to the even digit; `1.125` must become `"1.13"`.
fn to_fixed(value: f64, decimals: usize) -> String {
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    // zero residual means the product is exact, so a .5 fraction is a real tie
    let exact = value.mul_add(factor, -scaled) == 0.0;
    if exact && scaled.fract().abs() == 0.5 {
        format!("{:.*}", decimals, scaled.round() / factor)
    } else {
        format!("{:.*}", decimals, value)
    }
}

fn trim_trailing_zeros(value: &str) -> &str {
    if value.contains('.') {
        value.trim_end_matches('0').trim_end_matches('.')
    } else {
        value
    }
}

/// Calculate the percentage size reduction with one decimal
///
/// Returns `"0"` when either size is zero. A result larger than the original
/// yields a negative percentage.
pub fn calculate_reduction(original: u64, compressed: u64) -> String {
    if original == 0 || compressed == 0 {
        return "0".to_string();
    }
    let ratio = (original as f64 - compressed as f64) / original as f64 * 100.0;
    to_fixed(ratio, 1)
}

/// Render a duration in milliseconds as seconds with three decimals.
pub fn format_elapsed(elapsed_ms: f64) -> String {
    format!("{}s", to_fixed(elapsed_ms.max(0.0) / 1000.0, 3))
}

/// Display values of the statistics panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub original_size: String,
    pub result_size: String,
    pub reduction: String,
    pub elapsed: String,
}

impl StatsSnapshot {
    /// Build the panel. `original_size` is `None` before a file is selected,
    /// `result` is `None` until a compression succeeds.
    pub fn new(original_size: Option<u64>, result: Option<(u64, f64)>) -> Self {
        let original_display = original_size
            .map(format_bytes)
            .unwrap_or_else(|| MISSING_STAT.to_string());

        match result {
            Some((result_size, elapsed_ms)) => Self {
                original_size: original_display,
                result_size: format_bytes(result_size),
                reduction: format!(
                    "{}%",
                    calculate_reduction(original_size.unwrap_or(0), result_size)
                ),
                elapsed: format_elapsed(elapsed_ms),
            },
            None => Self {
                original_size: original_display,
                result_size: MISSING_STAT.to_string(),
                reduction: MISSING_STAT.to_string(),
                elapsed: MISSING_STAT.to_string(),
            },
        }
    }
}

//! Number formatting for statistics read-outs.
//!
//! Values are printed with a fixed number of significant digits, capped by a
//! maximum number of fractional digits, so that `0.0123` and `123.4` both
//! read naturally.

use crate::selection::Milliseconds;

/// Format `value` keeping about `significant_digits` significant digits and
/// at most `max_fractional_digits` digits after the decimal point.
pub fn format_number(value: f64, significant_digits: u32, max_fractional_digits: u32) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    let places = if value == 0.0 {
        0
    } else {
        let magnitude = value.abs().log10().floor() as i64;
        (i64::from(significant_digits) - magnitude - 1).clamp(0, i64::from(max_fractional_digits))
    };
    format!("{:.*}", places as usize, value)
}

pub fn format_milliseconds(
    value: Milliseconds,
    significant_digits: u32,
    max_fractional_digits: u32,
) -> String {
    format!(
        "{}ms",
        format_number(value, significant_digits, max_fractional_digits)
    )
}

/// Format a millisecond timestamp as seconds.
pub fn format_seconds(value: Milliseconds) -> String {
    format!("{}s", format_number(value / 1_000.0, 2, 3))
}

pub fn format_percent(ratio: f64) -> String {
    format!("{}%", format_number(ratio * 100.0, 2, 1))
}

pub fn format_bytes(bytes: u64) -> String {
    let value = bytes as f64;
    if value < 10_000.0 {
        format!("{bytes}B")
    } else if value < 10.0 * 1_048_576.0 {
        format!("{}KB", format_number(value / 1_024.0, 2, 2))
    } else if value < 10.0 * 1_073_741_824.0 {
        format!("{}MB", format_number(value / 1_048_576.0, 2, 2))
    } else {
        format!("{}GB", format_number(value / 1_073_741_824.0, 2, 2))
    }
}

/// Format `value` followed by its share of `total`, e.g. `12ms (4.5%)`.
/// Without a positive total only the value is printed.
pub fn format_value_total(value: f64, total: f64, format_value: impl Fn(f64) -> String) -> String {
    if total > 0.0 {
        format!("{} ({})", format_value(value), format_percent(value / total))
    } else {
        format_value(value)
    }
}

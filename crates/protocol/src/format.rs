//! Human-readable labels for sizes, counts and progress.

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Formats a byte count with binary (1024) steps and at most two decimals.
///
/// Trailing zeros are dropped: `1536` becomes `"1.5 KB"`, `1024` becomes
/// `"1 KB"`. Sizes beyond the last unit stay in TB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{} {}", trim_decimals(&format!("{value:.2}")), SIZE_UNITS[unit])
}

/// Strips trailing zeros (and a dangling point) from a fixed-point string.
fn trim_decimals(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Formats an integer with comma thousands separators.
pub fn format_number(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Rounded completion percentage, e.g. `"50%"`.
///
/// A zero total reads as `"0%"`; the result never exceeds `"100%"`.
pub fn format_percent(done: u64, total: u64) -> String {
    format!("{}%", percent(done, total))
}

/// Rounded completion percentage in `0..=100`.
pub fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (done as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_size_zero() {
        assert_eq!(format_file_size(0), "0 B");
    }

    #[test]
    fn file_size_bytes() {
        assert_eq!(format_file_size(1), "1 B");
        assert_eq!(format_file_size(1023), "1023 B");
    }

    #[test]
    fn file_size_whole_units() {
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1_048_576), "1 MB");
        assert_eq!(format_file_size(1_073_741_824), "1 GB");
        assert_eq!(format_file_size(1_099_511_627_776), "1 TB");
    }

    #[test]
    fn file_size_fractional() {
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1_572_864), "1.5 MB");
        // 1.2345 KB rounds to two decimals.
        assert_eq!(format_file_size(1264), "1.23 KB");
    }

    #[test]
    fn file_size_caps_at_terabytes() {
        assert_eq!(format_file_size(1024 * 1_099_511_627_776), "1024 TB");
    }

    #[test]
    fn number_separators() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
        assert_eq!(format_number(-12_345), "-12,345");
    }

    #[test]
    fn percent_labels() {
        assert_eq!(format_percent(500, 1000), "50%");
        assert_eq!(format_percent(0, 1000), "0%");
        assert_eq!(format_percent(1000, 1000), "100%");
        assert_eq!(format_percent(1, 3), "33%");
        assert_eq!(format_percent(2, 3), "67%");
    }

    #[test]
    fn percent_zero_total() {
        assert_eq!(format_percent(10, 0), "0%");
        assert_eq!(percent(0, 0), 0);
    }

    #[test]
    fn percent_clamped() {
        assert_eq!(percent(2000, 1000), 100);
    }
}

//! Byte size parsing and summary-line formatting.

/// Parse a size string (e.g. `"10KB"`) to bytes.
///
/// Accepts `B`, `KB` and `MB` suffixes (case-insensitive) or a bare number.
/// Returns `None` when the number part does not parse or the size overflows.
pub fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim().to_ascii_uppercase();
    let (number, unit) = if let Some(n) = s.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1)
    } else {
        (s.as_str(), 1)
    };
    number.trim().parse::<u64>().ok()?.checked_mul(unit)
}

/// Format a byte count for summary lines (`"512 B"`, `"3.4 KB"`, `"1.2 MB"`).
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

/// Format a count with its noun, pluralized (`"1 file"`, `"3 files"`).
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}

//! Human-readable formatting for byte counts and durations.

const BYTE_UNITS: [&str; 6] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// Formats a byte count with binary magnitude prefixes.
///
/// Counts below 1024 are rendered as a raw integer with a `B` suffix; larger
/// counts use the largest unit that keeps the scaled value in `[1, 1024)`,
/// with one decimal digit.
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{bytes}B");
    }

    let mut div = UNIT;
    let mut exp = 0_usize;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp + 1 < BYTE_UNITS.len() {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!("{:.1}{}", bytes as f64 / div as f64, BYTE_UNITS[exp])
}

/// Formats an elapsed-seconds count as a compact `"Xd Yh Zm"` label.
///
/// Zero components are omitted. Returns `None` when no whole minute has
/// elapsed, so callers can tell "below one minute" apart from blank output.
pub fn format_duration(secs: u64) -> Option<String> {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let mins = (secs % 3_600) / 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if mins > 0 {
        parts.push(format!("{mins}m"));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_below_one_kib_have_no_decimal() {
        assert_eq!(format_bytes(0), "0B");
        assert_eq!(format_bytes(1), "1B");
        assert_eq!(format_bytes(1023), "1023B");
    }

    #[test]
    fn bytes_use_largest_fitting_unit() {
        assert_eq!(format_bytes(1024), "1.0KiB");
        assert_eq!(format_bytes(1536), "1.5KiB");
        assert_eq!(format_bytes(1024 * 1024), "1.0MiB");
        assert_eq!(format_bytes(8_589_934_592), "8.0GiB");
        assert_eq!(format_bytes(4_294_967_296), "4.0GiB");
        assert_eq!(format_bytes(1_099_511_627_776), "1.0TiB");
        assert_eq!(format_bytes(u64::MAX), "16.0EiB");
    }

    #[test]
    fn bytes_above_one_kib_have_one_decimal() {
        for b in [1024_u64, 10_000, 123_456_789, 987_654_321_000] {
            let out = format_bytes(b);
            let point = out.find('.').expect("expected a decimal point");
            // one digit between the point and the unit suffix
            assert_eq!(out.len() - point, 5, "unexpected shape: {out}");
        }
    }

    #[test]
    fn duration_below_one_minute_is_sentinel() {
        assert_eq!(format_duration(0), None);
        assert_eq!(format_duration(59), None);
    }

    #[test]
    fn duration_composes_nonzero_components() {
        assert_eq!(format_duration(60).as_deref(), Some("1m"));
        assert_eq!(format_duration(3_661).as_deref(), Some("1h 1m"));
        assert_eq!(format_duration(90_000).as_deref(), Some("1d 1h"));
        assert_eq!(format_duration(90_061).as_deref(), Some("1d 1h 1m"));
        assert_eq!(format_duration(86_400).as_deref(), Some("1d"));
    }

    #[test]
    fn duration_omits_zero_components_in_the_middle() {
        // exactly 1 day and 5 minutes, zero hours
        assert_eq!(format_duration(86_700).as_deref(), Some("1d 5m"));
    }
}

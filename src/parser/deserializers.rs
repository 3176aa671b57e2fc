use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Storage format for timestamps written to SQLite.
pub const STORAGE_DT_FMT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Offset-carrying forms; the wall-clock time of the export is kept.
const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Parses a source timestamp. Returns None for empty or unparseable input,
/// never an error: such rows simply never match a date filter.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }
    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.naive_local());
        }
    }
    parse_date(trimmed).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// "2024-03-01" or "01/03/2024" → NaiveDate.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

pub fn format_timestamp(dt: &NaiveDateTime) -> String {
    dt.format(STORAGE_DT_FMT).to_string()
}

/// Parses an integral code that may have been exported as a float
/// ("7", "7.0", "1 234") → Some(7). Empty, NaN or fractional → None.
pub fn parse_code(s: &str) -> Option<i64> {
    let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(v) = cleaned.parse::<i64>() {
        return Some(v);
    }
    let f = cleaned.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Team codes arrive as floats ("1.0", "3.0").
pub fn parse_team_code(s: &str) -> Option<u32> {
    parse_code(s).and_then(|v| u32::try_from(v).ok())
}

/// "" → None, "22.0" → Some(22.0). Non-finite values are treated as missing.
pub fn parse_opt_f64(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Empty (or whitespace-only) text → None.
pub fn parse_opt_text(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = "2024-03-05T16:24:00";
        for s in [
            "2024-03-05 16:24:00",
            "2024-03-05T16:24:00",
            "2024-03-05 16:24",
            "05/03/2024 16:24",
            "2024-03-05 16:24:00.000",
            "2024-03-05T16:24:00-03:00",
            "2024-03-05 16:24:00+00:00",
            "2024-03-05T16:24:00Z",
            "2024-03-05 16:24:00-0300",
        ] {
            let dt = parse_timestamp(s).unwrap_or_else(|| panic!("failed on {s}"));
            assert_eq!(format_timestamp(&dt), expected, "input {s}");
        }
    }

    #[test]
    fn test_storage_format_keeps_fractional_seconds() {
        let dt = parse_timestamp("2024-03-05 16:24:00.250").unwrap();
        let stored = format_timestamp(&dt);
        assert_eq!(stored, "2024-03-05T16:24:00.250");
        assert_eq!(NaiveDateTime::parse_from_str(&stored, STORAGE_DT_FMT).unwrap(), dt);
    }

    #[test]
    fn test_parse_timestamp_fractional_utc_suffix() {
        let dt = parse_timestamp("2024-03-05T16:24:00.123Z").unwrap();
        assert_eq!(format_timestamp(&dt), "2024-03-05T16:24:00.123");
    }

    #[test]
    fn test_parse_timestamp_date_only_is_midnight() {
        let dt = parse_timestamp("2024-03-05").unwrap();
        assert_eq!(format_timestamp(&dt), "2024-03-05T00:00:00");
    }

    #[test]
    fn test_parse_timestamp_unparseable_is_none() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("not a date").is_none());
        assert!(parse_timestamp("2024-13-45 10:00:00").is_none());
    }

    #[test]
    fn test_parse_code() {
        assert_eq!(parse_code("7"), Some(7));
        assert_eq!(parse_code("7.0"), Some(7));
        assert_eq!(parse_code(" 497 "), Some(497));
        assert_eq!(parse_code("5\u{00A0}732"), Some(5732));
        assert_eq!(parse_code(""), None);
        assert_eq!(parse_code("nan"), None);
        assert_eq!(parse_code("7.5"), None);
        assert_eq!(parse_code("abc"), None);
    }

    #[test]
    fn test_parse_team_code() {
        assert_eq!(parse_team_code("1.0"), Some(1));
        assert_eq!(parse_team_code("3"), Some(3));
        assert_eq!(parse_team_code("-1"), None);
    }

    #[test]
    fn test_parse_opt_f64() {
        assert_eq!(parse_opt_f64("22.0"), Some(22.0));
        assert_eq!(parse_opt_f64("20"), Some(20.0));
        assert_eq!(parse_opt_f64(""), None);
        assert_eq!(parse_opt_f64("NaN"), None);
        assert_eq!(parse_opt_f64("x"), None);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-01-31"),
            NaiveDate::from_ymd_opt(2024, 1, 31)
        );
        assert_eq!(
            parse_date("31/01/2024"),
            NaiveDate::from_ymd_opt(2024, 1, 31)
        );
        assert!(parse_date("2024-02-30").is_none());
    }
}

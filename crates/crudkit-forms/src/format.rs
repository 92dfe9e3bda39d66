//! Formatting and parsing helpers shared by the codec, editors, and cells.
//!
//! Numbers are grouped with commas, currency is kept in minor units on the
//! wire, phone numbers are stored as E.164 and shown in national format, and
//! date-times are stored as ISO-8601 UTC and shown in a fixed local offset at
//! minute precision.

use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use regex::Regex;

/// Region of `united_states_phone_number` fields, whatever the user picked.
pub const UNITED_STATES_REGION: &str = "US";

/// Maximum fraction digits shown for floating-point fields.
pub const FLOAT_FRACTION_DIGITS: usize = 10;

/// Maximum fraction digits shown for integer and percentage fields.
pub const DEFAULT_FRACTION_DIGITS: usize = 3;

/// Local date-time display format (minute precision).
pub const LOCAL_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Phone regions the editors offer, with their calling code and trunk prefix.
pub const PHONE_REGIONS: &[(&str, &str, &str)] = &[
    ("US", "1", ""),
    ("CA", "1", ""),
    ("GB", "44", "0"),
    ("AU", "61", "0"),
    ("DE", "49", "0"),
    ("FR", "33", "0"),
    ("IN", "91", "0"),
    ("JP", "81", "0"),
    ("MX", "52", ""),
];

/// Time zones offered by the time zone editor and accepted by validation.
pub const TIME_ZONES: &[&str] = &[
    "UTC",
    "Africa/Cairo",
    "Africa/Johannesburg",
    "Africa/Lagos",
    "Africa/Nairobi",
    "America/Anchorage",
    "America/Argentina/Buenos_Aires",
    "America/Bogota",
    "America/Chicago",
    "America/Denver",
    "America/Halifax",
    "America/Los_Angeles",
    "America/Mexico_City",
    "America/New_York",
    "America/Phoenix",
    "America/Sao_Paulo",
    "America/Toronto",
    "America/Vancouver",
    "Asia/Bangkok",
    "Asia/Dubai",
    "Asia/Hong_Kong",
    "Asia/Jakarta",
    "Asia/Kolkata",
    "Asia/Seoul",
    "Asia/Shanghai",
    "Asia/Singapore",
    "Asia/Tokyo",
    "Atlantic/Reykjavik",
    "Australia/Melbourne",
    "Australia/Perth",
    "Australia/Sydney",
    "Europe/Amsterdam",
    "Europe/Berlin",
    "Europe/Dublin",
    "Europe/Istanbul",
    "Europe/Lisbon",
    "Europe/London",
    "Europe/Madrid",
    "Europe/Moscow",
    "Europe/Paris",
    "Europe/Rome",
    "Europe/Stockholm",
    "Europe/Warsaw",
    "Europe/Zurich",
    "Pacific/Auckland",
    "Pacific/Honolulu",
];

/// Formats an integer with commas as thousand separators.
///
/// # Examples
///
/// ```
/// use crudkit_forms::format::intcomma;
///
/// assert_eq!(intcomma(1000), "1,000");
/// assert_eq!(intcomma(-1234567), "-1,234,567");
/// ```
pub fn intcomma(value: i64) -> String {
    let grouped = group_digits(&value.unsigned_abs().to_string());
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn group_digits(digits: &str) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut result = String::with_capacity(chars.len() + chars.len() / 3);
    for (i, ch) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*ch);
    }
    result
}

/// Formats a number with grouped thousands and at most `max_fraction_digits`
/// fraction digits, trimming trailing zeros.
///
/// Returns `None` for NaN and infinities.
///
/// # Examples
///
/// ```
/// use crudkit_forms::format::format_number;
///
/// assert_eq!(format_number(1548.0, 3).as_deref(), Some("1,548"));
/// assert_eq!(format_number(-0.125, 10).as_deref(), Some("-0.125"));
/// assert_eq!(format_number(f64::NAN, 3), None);
/// ```
pub fn format_number(value: f64, max_fraction_digits: usize) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let fixed = format!("{:.*}", max_fraction_digits, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (fixed.as_str(), ""),
    };
    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    let grouped = group_digits(int_part);
    if frac_part.is_empty() {
        Some(format!("{sign}{grouped}"))
    } else {
        Some(format!("{sign}{grouped}.{frac_part}"))
    }
}

/// Formats an amount in minor units (cents) as a currency string.
///
/// Returns `None` for NaN, infinities, and amounts too large to represent.
///
/// # Examples
///
/// ```
/// use crudkit_forms::format::format_currency_cents;
///
/// assert_eq!(format_currency_cents(25_000_000.0, "$").as_deref(), Some("$250,000.00"));
/// assert_eq!(format_currency_cents(-5.0, "$").as_deref(), Some("-$0.05"));
/// ```
pub fn format_currency_cents(cents: f64, symbol: &str) -> Option<String> {
    if !cents.is_finite() || cents.abs() >= 9.0e15 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let cents = cents.round() as i64;
    let abs = cents.unsigned_abs();
    let whole = group_digits(&(abs / 100).to_string());
    let sign = if cents < 0 { "-" } else { "" };
    Some(format!("{sign}{symbol}{whole}.{:02}", abs % 100))
}

/// Formats a fraction as a percentage string (`0.05` becomes `"5%"`).
pub fn format_percentage(fraction: f64) -> Option<String> {
    format_number(fraction * 100.0, DEFAULT_FRACTION_DIGITS).map(|n| format!("{n}%"))
}

/// Parses the longest leading decimal number in `s`, like a lenient float parser.
fn parse_float_prefix(s: &str) -> Option<f64> {
    static FLOAT_PREFIX: OnceLock<Regex> = OnceLock::new();
    let re = FLOAT_PREFIX.get_or_init(|| Regex::new(r"^-?(\d+\.?\d*|\.\d+)").unwrap());
    let m = re.find(s)?;
    m.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a formatted decimal string, ignoring anything that is not a digit,
/// a dot, or a minus sign.
///
/// # Examples
///
/// ```
/// use crudkit_forms::format::parse_decimal;
///
/// assert_eq!(parse_decimal("1,234.5"), Some(1234.5));
/// assert_eq!(parse_decimal(""), None);
/// assert_eq!(parse_decimal("NaN"), None);
/// ```
pub fn parse_decimal(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    parse_float_prefix(&cleaned)
}

/// Parses a formatted integer string, keeping only digits and a leading minus.
///
/// # Examples
///
/// ```
/// use crudkit_forms::format::parse_integer;
///
/// assert_eq!(parse_integer("1,548"), Some(1548));
/// assert_eq!(parse_integer("-42"), Some(-42));
/// assert_eq!(parse_integer("abc"), None);
/// ```
pub fn parse_integer(s: &str) -> Option<i64> {
    let trimmed = s.trim_start();
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let signed = if trimmed.starts_with('-') {
        format!("-{digits}")
    } else {
        digits
    };
    signed.parse().ok()
}

/// Parses a formatted currency string into minor units (cents).
///
/// # Examples
///
/// ```
/// use crudkit_forms::format::parse_currency_cents;
///
/// assert_eq!(parse_currency_cents("$1,234.56"), Some(123_456));
/// assert_eq!(parse_currency_cents("-$0.05"), Some(-5));
/// assert_eq!(parse_currency_cents(""), None);
/// ```
pub fn parse_currency_cents(s: &str) -> Option<i64> {
    let negative = s.trim_start().starts_with('-');
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let amount = parse_float_prefix(&cleaned)?;
    let cents = (amount * 100.0).round();
    if cents.abs() >= 9.0e15 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let cents = cents as i64;
    Some(if negative { -cents } else { cents })
}

/// Parses a percentage string into a fraction (`"5%"` becomes `0.05`).
pub fn parse_percentage(s: &str) -> Option<f64> {
    let cleaned: String = s.chars().filter(|c| *c != ',' && *c != '%').collect();
    parse_float_prefix(cleaned.trim()).map(|v| v / 100.0)
}

/// Looks up the calling code and trunk prefix for a phone region.
pub fn phone_region(region: &str) -> Option<(&'static str, &'static str)> {
    PHONE_REGIONS
        .iter()
        .find(|(r, _, _)| r.eq_ignore_ascii_case(region))
        .map(|(_, code, trunk)| (*code, *trunk))
}

/// Normalizes a phone number typed by a user to E.164.
///
/// Keeps digits and `+`; numbers without a leading `+` get the calling code
/// of `region` (falling back to `+1`), with the region's trunk prefix removed.
/// Returns `None` when no digits remain.
///
/// # Examples
///
/// ```
/// use crudkit_forms::format::normalize_phone;
///
/// assert_eq!(normalize_phone("(415) 555-2671", "US").as_deref(), Some("+14155552671"));
/// assert_eq!(normalize_phone("+44 7911 123456", "US").as_deref(), Some("+447911123456"));
/// ```
pub fn normalize_phone(s: &str, region: &str) -> Option<String> {
    let kept: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if kept.starts_with('+') {
        return Some(kept);
    }
    let (code, trunk) = phone_region(region).unwrap_or(("1", ""));
    let national = if trunk.is_empty() {
        kept.as_str()
    } else {
        kept.strip_prefix(trunk).unwrap_or(&kept)
    };
    Some(format!("+{code}{national}"))
}

/// Formats an E.164 number for display in `region`.
///
/// Numbers in the region's calling code are shown in national format (NANP
/// numbers as `(415) 555-2671`, others with their trunk prefix). Numbers
/// from other regions are shown unchanged so that they keep their `+`.
///
/// # Examples
///
/// ```
/// use crudkit_forms::format::format_phone_national;
///
/// assert_eq!(format_phone_national("+14155552671", "US"), "(415) 555-2671");
/// assert_eq!(format_phone_national("+447911123456", "GB"), "07911123456");
/// assert_eq!(format_phone_national("+447911123456", "US"), "+447911123456");
/// ```
pub fn format_phone_national(e164: &str, region: &str) -> String {
    let Some(digits) = e164.strip_prefix('+') else {
        return e164.to_string();
    };
    let (code, trunk) = phone_region(region).unwrap_or(("1", ""));
    let Some(national) = digits.strip_prefix(code) else {
        return e164.to_string();
    };
    if code == "1" {
        if national.len() == 10 && national.chars().all(|c| c.is_ascii_digit()) {
            return format!(
                "({}) {}-{}",
                &national[..3],
                &national[3..6],
                &national[6..]
            );
        }
        return e164.to_string();
    }
    format!("{trunk}{national}")
}

/// Builds a fixed offset from minutes east of UTC, falling back to UTC when
/// the offset is out of range.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

/// Parses an ISO-8601 / RFC 3339 instant; naive values are taken as UTC.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Formats an ISO-8601 instant as a local date-time at minute precision.
///
/// # Examples
///
/// ```
/// use chrono::FixedOffset;
/// use crudkit_forms::format::format_local_date_time;
///
/// let utc = FixedOffset::east_opt(0).unwrap();
/// assert_eq!(
///     format_local_date_time("2024-03-01T17:30:00Z", utc).as_deref(),
///     Some("2024-03-01T17:30"),
/// );
/// ```
pub fn format_local_date_time(iso: &str, offset: FixedOffset) -> Option<String> {
    parse_instant(iso).map(|dt| {
        dt.with_timezone(&offset)
            .format(LOCAL_DATE_TIME_FORMAT)
            .to_string()
    })
}

/// Parses a local date-time string and returns it as ISO-8601 UTC with
/// millisecond precision. Strings that already carry an offset are accepted.
pub fn parse_local_date_time(local: &str, offset: FixedOffset) -> Option<String> {
    let local = local.trim();
    let naive = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(local, fmt).ok());
    let instant = match naive {
        Some(naive) => offset
            .from_local_datetime(&naive)
            .single()?
            .with_timezone(&Utc),
        None => DateTime::parse_from_rfc3339(local).ok()?.with_timezone(&Utc),
    };
    Some(instant.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}

/// The components of an ISO-8601 duration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IsoDuration {
    pub years: u64,
    pub months: u64,
    pub weeks: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: f64,
}

/// Parses an ISO-8601 duration such as `P1DT2H30M`.
pub fn parse_iso_duration(s: &str) -> Option<IsoDuration> {
    static DURATION: OnceLock<Regex> = OnceLock::new();
    let re = DURATION.get_or_init(|| {
        Regex::new(
            r"^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
        )
        .unwrap()
    });
    if s == "P" || s.ends_with('T') {
        return None;
    }
    let caps = re.captures(s)?;
    let num = |i: usize| caps.get(i).map_or(Some(0), |m| m.as_str().parse::<u64>().ok());
    Some(IsoDuration {
        years: num(1)?,
        months: num(2)?,
        weeks: num(3)?,
        days: num(4)?,
        hours: num(5)?,
        minutes: num(6)?,
        seconds: caps
            .get(7)
            .map_or(Some(0.0), |m| m.as_str().parse::<f64>().ok())?,
    })
}

/// Describes an ISO-8601 duration in words (`P1DT2H` becomes `"1 day, 2 hours"`).
pub fn humanize_duration(iso: &str) -> Option<String> {
    let d = parse_iso_duration(iso)?;
    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("1 {unit}")
        } else {
            format!("{n} {unit}s")
        }
    };
    let mut parts = Vec::new();
    for (n, unit) in [
        (d.years, "year"),
        (d.months, "month"),
        (d.weeks, "week"),
        (d.days, "day"),
        (d.hours, "hour"),
        (d.minutes, "minute"),
    ] {
        if n > 0 {
            parts.push(plural(n, unit));
        }
    }
    if d.seconds > 0.0 {
        let secs = format_number(d.seconds, DEFAULT_FRACTION_DIGITS)?;
        parts.push(if secs == "1" {
            "1 second".to_string()
        } else {
            format!("{secs} seconds")
        });
    }
    if parts.is_empty() {
        return Some("0 seconds".to_string());
    }
    Some(parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    // ── numbers ─────────────────────────────────────────────────────

    #[test]
    fn test_intcomma() {
        assert_eq!(intcomma(0), "0");
        assert_eq!(intcomma(999), "999");
        assert_eq!(intcomma(1_000_000), "1,000,000");
        assert_eq!(intcomma(i64::MIN), "-9,223,372,036,854,775,808");
    }

    #[test]
    fn test_format_number_float_precision() {
        assert_eq!(format_number(3.141_59, FLOAT_FRACTION_DIGITS).unwrap(), "3.14159");
        assert_eq!(format_number(0.1 + 0.2, FLOAT_FRACTION_DIGITS).unwrap(), "0.3");
        assert_eq!(format_number(1_234_567.5, FLOAT_FRACTION_DIGITS).unwrap(), "1,234,567.5");
    }

    #[test]
    fn test_format_number_negative_zero() {
        assert_eq!(format_number(-0.0, 3).unwrap(), "0");
        assert_eq!(format_number(-0.000_01, 3).unwrap(), "0");
    }

    #[test]
    fn test_format_number_non_finite() {
        assert_eq!(format_number(f64::INFINITY, 3), None);
        assert_eq!(format_number(f64::NAN, 3), None);
    }

    #[test]
    fn test_currency_formatting() {
        assert_eq!(format_currency_cents(0.0, "$").unwrap(), "$0.00");
        assert_eq!(format_currency_cents(123_456.0, "$").unwrap(), "$1,234.56");
        assert_eq!(format_currency_cents(99.0, "€").unwrap(), "€0.99");
        assert_eq!(format_currency_cents(f64::NAN, "$"), None);
    }

    #[test]
    fn test_currency_parsing() {
        assert_eq!(parse_currency_cents("$250,000.00"), Some(25_000_000));
        assert_eq!(parse_currency_cents("12"), Some(1200));
        assert_eq!(parse_currency_cents("0.1"), Some(10));
        assert_eq!(parse_currency_cents("$"), None);
    }

    #[test]
    fn test_percentage_round_trip() {
        assert_eq!(format_percentage(0.05).unwrap(), "5%");
        assert_eq!(format_percentage(0.125).unwrap(), "12.5%");
        assert_eq!(parse_percentage("5%"), Some(0.05));
        assert_eq!(parse_percentage("12.5 %"), Some(0.125));
        assert_eq!(parse_percentage("%"), None);
    }

    #[test]
    fn test_parse_decimal_lenient() {
        assert_eq!(parse_decimal("1.2.3"), Some(1.2));
        assert_eq!(parse_decimal("-3.5kg"), Some(-3.5));
        assert_eq!(parse_decimal(".5"), Some(0.5));
        assert_eq!(parse_decimal("-"), None);
    }

    #[test]
    fn test_parse_integer_ignores_separators() {
        assert_eq!(parse_integer("  -1,000"), Some(-1000));
        assert_eq!(parse_integer(""), None);
        assert_eq!(parse_integer("99999999999999999999"), None);
    }

    // ── phone numbers ───────────────────────────────────────────────

    #[test]
    fn test_normalize_phone_regions() {
        assert_eq!(normalize_phone("07911 123456", "GB").unwrap(), "+447911123456");
        assert_eq!(normalize_phone("555-2671", "ZZ").unwrap(), "+15552671");
        assert_eq!(normalize_phone("call me", "US"), None);
        assert_eq!(normalize_phone("", "US"), None);
    }

    #[test]
    fn test_format_phone_national_fallbacks() {
        assert_eq!(format_phone_national("4155552671", "US"), "4155552671");
        assert_eq!(format_phone_national("+1415", "US"), "+1415");
        assert_eq!(format_phone_national("+4930123456", "DE"), "030123456");
    }

    #[test]
    fn test_phone_region_lookup_ignores_case() {
        assert_eq!(phone_region("gb"), Some(("44", "0")));
        assert_eq!(phone_region("XX"), None);
    }

    // ── date-times ──────────────────────────────────────────────────

    #[test]
    fn test_local_date_time_round_trip_with_offset() {
        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        let local = format_local_date_time("2024-01-15T15:00:00.000Z", est).unwrap();
        assert_eq!(local, "2024-01-15T10:00");
        let iso = parse_local_date_time(&local, est).unwrap();
        assert_eq!(iso, "2024-01-15T15:00:00.000Z");
    }

    #[test]
    fn test_parse_local_date_time_accepts_iso() {
        let iso = parse_local_date_time("2024-01-15T15:00:00+02:00", utc()).unwrap();
        assert_eq!(iso, "2024-01-15T13:00:00.000Z");
    }

    #[test]
    fn test_parse_local_date_time_rejects_garbage() {
        assert_eq!(parse_local_date_time("tomorrow", utc()), None);
        assert_eq!(parse_local_date_time("", utc()), None);
    }

    #[test]
    fn test_format_local_date_time_naive_is_utc() {
        assert_eq!(
            format_local_date_time("2024-06-01T08:15:00", utc()).unwrap(),
            "2024-06-01T08:15"
        );
    }

    // ── durations ───────────────────────────────────────────────────

    #[test]
    fn test_parse_iso_duration() {
        let d = parse_iso_duration("P1Y2M3DT4H5M6.5S").unwrap();
        assert_eq!(d.years, 1);
        assert_eq!(d.months, 2);
        assert_eq!(d.days, 3);
        assert_eq!(d.hours, 4);
        assert_eq!(d.minutes, 5);
        assert!((d.seconds - 6.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_iso_duration_rejects_empty_parts() {
        assert!(parse_iso_duration("P").is_none());
        assert!(parse_iso_duration("P1DT").is_none());
        assert!(parse_iso_duration("1 day").is_none());
    }

    #[test]
    fn test_humanize_duration() {
        assert_eq!(humanize_duration("P1DT2H").unwrap(), "1 day, 2 hours");
        assert_eq!(humanize_duration("PT1S").unwrap(), "1 second");
        assert_eq!(humanize_duration("P2W").unwrap(), "2 weeks");
        assert_eq!(humanize_duration("PT0S").unwrap(), "0 seconds");
    }

    #[test]
    fn test_offset_from_minutes() {
        assert_eq!(offset_from_minutes(-300).local_minus_utc(), -18_000);
        assert_eq!(offset_from_minutes(0).local_minus_utc(), 0);
        // Beyond a day is invalid and falls back to UTC.
        assert_eq!(offset_from_minutes(24 * 60).local_minus_utc(), 0);
        assert_eq!(offset_from_minutes(i32::MAX).local_minus_utc(), 0);
    }
}

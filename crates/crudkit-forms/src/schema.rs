//! Validation of server-shaped records.
//!
//! A [`ValidationSchema`] is built from the field specs of one operation and
//! checks a record after form-to-server conversion, so rules see cents,
//! numbers, and E.164 strings rather than display text. Errors accumulate
//! across fields and are keyed by field key.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::NaiveDate;
use crudkit_core::ValidationError;
use regex::Regex;
use serde_json::Value;

use crate::codec::Record;
use crate::format::{self, TIME_ZONES};
use crate::kind::FieldKind;
use crate::spec::FieldSpec;

pub const REQUIRED_MESSAGE: &str = "This field is required.";

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("valid regex")
    })
}

fn domain_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,63}$")
            .expect("valid regex")
    })
}

fn e164_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+[1-9]\d{6,14}$").expect("valid regex"))
}

fn us_phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+1[2-9]\d{9}$").expect("valid regex"))
}

fn id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_\-]{1,128}$").expect("valid regex"))
}

fn rrule_part_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]+=[A-Za-z0-9,+\-:]+$").expect("valid regex"))
}

const FREQUENCIES: &[&str] = &[
    "SECONDLY", "MINUTELY", "HOURLY", "DAILY", "WEEKLY", "MONTHLY", "YEARLY",
];

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn invalid(message: impl Into<String>) -> ValidationError {
    ValidationError::new(message, "invalid")
}

fn display_bound(bound: f64) -> String {
    format::format_number(bound, format::FLOAT_FRACTION_DIGITS)
        .map_or_else(|| bound.to_string(), |s| s.replace(',', ""))
}

fn is_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Checks an iCalendar `RRULE` value such as `FREQ=WEEKLY;BYDAY=MO,WE`.
fn is_recurrence_rule(s: &str) -> bool {
    let body = s.strip_prefix("RRULE:").unwrap_or(s);
    let mut freq_count = 0;
    for part in body.split(';') {
        if !rrule_part_re().is_match(part) {
            return false;
        }
        if let Some(freq) = part.strip_prefix("FREQ=") {
            if !FREQUENCIES.contains(&freq) {
                return false;
            }
            freq_count += 1;
        }
    }
    freq_count == 1
}

/// Checks an ISO-8601 interval: `start/end`, `start/duration`, or
/// `duration/end`, where ends are dates or instants.
fn is_interval(s: &str) -> bool {
    let Some((start, end)) = s.split_once('/') else {
        return false;
    };
    let instant = |p: &str| format::parse_instant(p).or_else(|| {
        NaiveDate::parse_from_str(p, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    });
    let duration = |p: &str| format::parse_iso_duration(p).is_some();
    match (instant(start), instant(end)) {
        (Some(a), Some(b)) => a <= b,
        (Some(_), None) => duration(end),
        (None, Some(_)) => duration(start),
        (None, None) => false,
    }
}

fn is_http_url(s: &str) -> bool {
    url::Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Validation rules for the fields of one operation.
#[derive(Debug, Clone, Default)]
pub struct ValidationSchema {
    fields: Vec<FieldSpec>,
}

impl ValidationSchema {
    /// Builds a schema from field specs.
    pub fn from_specs(specs: &[FieldSpec]) -> Self {
        Self {
            fields: specs.to_vec(),
        }
    }

    /// Returns the specs this schema checks.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Validates a server-shaped record.
    ///
    /// Missing keys count as `null`. Keys without a spec are not checked.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] whose field errors hold every failing
    /// field.
    pub fn validate(&self, record: &Record) -> Result<(), ValidationError> {
        let mut field_errors: HashMap<String, Vec<ValidationError>> = HashMap::new();
        for spec in &self.fields {
            let value = record.get(&spec.key).unwrap_or(&Value::Null);
            let errors = Self::validate_field(spec, value);
            if !errors.is_empty() {
                field_errors.insert(spec.key.clone(), errors);
            }
        }
        if field_errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::with_field_errors(field_errors))
        }
    }

    /// Validates one server-shaped value against its spec.
    pub fn validate_field(spec: &FieldSpec, value: &Value) -> Vec<ValidationError> {
        if is_empty(value) {
            return if spec.required {
                vec![ValidationError::new(REQUIRED_MESSAGE, "required")]
            } else {
                Vec::new()
            };
        }

        let mut errors = Vec::new();
        match spec.kind {
            FieldKind::ShortText
            | FieldKind::LongText
            | FieldKind::RichText
            | FieldKind::Markdown
            | FieldKind::SensitiveText => {
                if !value.is_string() {
                    errors.push(invalid("Enter a valid value."));
                }
            }
            FieldKind::Integer => match value.as_f64() {
                Some(n) if n.fract() == 0.0 => {}
                _ => errors.push(invalid("Enter a whole number.")),
            },
            FieldKind::FloatingPointNumber | FieldKind::Percentage => {
                if value.as_f64().is_none() {
                    errors.push(invalid("Enter a number."));
                }
            }
            FieldKind::Currency | FieldKind::Usd => {
                if value.as_i64().is_none() {
                    errors.push(invalid("Enter a valid amount."));
                }
            }
            FieldKind::Boolean => {
                if !value.is_boolean() {
                    errors.push(invalid("Enter true or false."));
                }
            }
            FieldKind::Date => {
                if !value.as_str().is_some_and(is_date) {
                    errors.push(invalid("Enter a valid date (YYYY-MM-DD)."));
                }
            }
            FieldKind::DateTimeLocal => {
                if value.as_str().and_then(format::parse_instant).is_none() {
                    errors.push(invalid("Enter a valid date/time."));
                }
            }
            FieldKind::Duration => {
                if value.as_str().and_then(format::parse_iso_duration).is_none() {
                    errors.push(invalid("Enter a valid duration."));
                }
            }
            FieldKind::Interval => {
                if !value.as_str().is_some_and(is_interval) {
                    errors.push(invalid("Enter a valid interval."));
                }
            }
            FieldKind::RecurrenceRule => {
                if !value.as_str().is_some_and(is_recurrence_rule) {
                    errors.push(invalid("Enter a valid recurrence rule."));
                }
            }
            FieldKind::Email => {
                if !value.as_str().is_some_and(|s| email_re().is_match(s)) {
                    errors.push(invalid("Enter a valid email address."));
                }
            }
            FieldKind::Url => {
                if !value.as_str().is_some_and(is_http_url) {
                    errors.push(invalid("Enter a valid URL."));
                }
            }
            FieldKind::Domain => {
                if !value
                    .as_str()
                    .is_some_and(|s| s.len() <= 253 && domain_re().is_match(s))
                {
                    errors.push(invalid("Enter a valid domain name."));
                }
            }
            FieldKind::PhoneNumber => {
                if !value.as_str().is_some_and(|s| e164_re().is_match(s)) {
                    errors.push(invalid("Enter a valid phone number."));
                }
            }
            FieldKind::UnitedStatesPhoneNumber => {
                if !value.as_str().is_some_and(|s| us_phone_re().is_match(s)) {
                    errors.push(invalid("Enter a valid US phone number."));
                }
            }
            FieldKind::TimeZone => {
                if !value.as_str().is_some_and(|s| TIME_ZONES.contains(&s)) {
                    errors.push(invalid("Select a valid time zone."));
                }
            }
            FieldKind::SelectOne => match value.as_str() {
                Some(s) if spec.one_of.is_empty() || spec.one_of.iter().any(|v| v == s) => {}
                Some(s) => errors.push(not_a_choice(s)),
                None => errors.push(invalid("Select a valid choice.")),
            },
            FieldKind::SelectMany => {
                Self::check_string_list(value, &mut errors);
                if errors.is_empty() && !spec.one_of.is_empty() {
                    for s in value.as_array().into_iter().flatten().filter_map(Value::as_str) {
                        if !spec.one_of.iter().any(|v| v == s) {
                            errors.push(not_a_choice(s));
                        }
                    }
                }
            }
            FieldKind::List => Self::check_string_list(value, &mut errors),
            FieldKind::Id | FieldKind::IdReference => {
                if !value.as_str().is_some_and(|s| id_re().is_match(s)) {
                    errors.push(invalid("Enter a valid id."));
                }
            }
        }

        if errors.is_empty() {
            Self::check_bounds(spec, value, &mut errors);
        }
        errors
    }

    fn check_string_list(value: &Value, errors: &mut Vec<ValidationError>) {
        let Some(items) = value.as_array() else {
            errors.push(invalid("Enter a list of values."));
            return;
        };
        if items
            .iter()
            .any(|item| item.as_str().map_or(true, |s| s.trim().is_empty()))
        {
            errors.push(invalid("List entries cannot be empty."));
        }
    }

    fn check_bounds(spec: &FieldSpec, value: &Value, errors: &mut Vec<ValidationError>) {
        if let Some(n) = value.as_f64() {
            if let Some(min) = spec.minimum.filter(|min| n < *min) {
                errors.push(
                    ValidationError::new(
                        format!(
                            "Ensure this value is greater than or equal to {}.",
                            display_bound(min)
                        ),
                        "min_value",
                    )
                    .with_param("limit_value", display_bound(min)),
                );
            }
            if let Some(max) = spec.maximum.filter(|max| n > *max) {
                errors.push(
                    ValidationError::new(
                        format!(
                            "Ensure this value is less than or equal to {}.",
                            display_bound(max)
                        ),
                        "max_value",
                    )
                    .with_param("limit_value", display_bound(max)),
                );
            }
        }
        if let (Some(max), Some(s)) = (spec.max_length, value.as_str()) {
            let len = s.chars().count();
            if len > max {
                errors.push(
                    ValidationError::new(
                        format!("Ensure this value has at most {max} characters (it has {len})."),
                        "max_length",
                    )
                    .with_param("limit_value", max.to_string()),
                );
            }
        }
    }
}

fn not_a_choice(value: &str) -> ValidationError {
    ValidationError::new(
        format!("Select a valid choice. {value} is not one of the available choices."),
        "invalid_choice",
    )
    .with_param("value", value)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn check(spec: &FieldSpec, value: Value) -> Vec<String> {
        ValidationSchema::validate_field(spec, &value)
            .into_iter()
            .map(|e| e.message)
            .collect()
    }

    fn ok(kind: FieldKind, value: Value) {
        let spec = FieldSpec::new("f", kind);
        assert!(check(&spec, value.clone()).is_empty(), "{kind} rejected {value}");
    }

    fn bad(kind: FieldKind, value: Value) {
        let spec = FieldSpec::new("f", kind);
        assert!(!check(&spec, value.clone()).is_empty(), "{kind} accepted {value}");
    }

    #[test]
    fn test_required() {
        let spec = FieldSpec::new("name", FieldKind::ShortText).required(true);
        assert_eq!(check(&spec, Value::Null), vec![REQUIRED_MESSAGE]);
        assert_eq!(check(&spec, json!("  ")), vec![REQUIRED_MESSAGE]);
        let spec = FieldSpec::new("tags", FieldKind::List).required(true);
        assert_eq!(check(&spec, json!([])), vec![REQUIRED_MESSAGE]);
    }

    #[test]
    fn test_optional_empty_is_valid() {
        for kind in FieldKind::ALL {
            ok(kind, Value::Null);
        }
    }

    #[test]
    fn test_numbers() {
        ok(FieldKind::Integer, json!(1548));
        bad(FieldKind::Integer, json!(1.5));
        bad(FieldKind::Integer, json!("1,548"));
        ok(FieldKind::FloatingPointNumber, json!(0.25));
        ok(FieldKind::Currency, json!(123_456));
        bad(FieldKind::Currency, json!(12.5));
        ok(FieldKind::Percentage, json!(0.05));
    }

    #[test]
    fn test_bounds() {
        let spec = FieldSpec::new("n", FieldKind::Integer).bounds(Some(0.0), Some(10.0));
        assert_eq!(
            check(&spec, json!(-1)),
            vec!["Ensure this value is greater than or equal to 0."]
        );
        assert_eq!(
            check(&spec, json!(11)),
            vec!["Ensure this value is less than or equal to 10."]
        );
        assert!(check(&spec, json!(10)).is_empty());
    }

    #[test]
    fn test_max_length() {
        let spec = FieldSpec::new("t", FieldKind::ShortText).max_length(3);
        assert_eq!(
            check(&spec, json!("abcd")),
            vec!["Ensure this value has at most 3 characters (it has 4)."]
        );
    }

    #[test]
    fn test_dates_and_durations() {
        ok(FieldKind::Date, json!("2024-02-29"));
        bad(FieldKind::Date, json!("2023-02-29"));
        ok(FieldKind::DateTimeLocal, json!("2024-01-02T03:04:00.000Z"));
        bad(FieldKind::DateTimeLocal, json!("yesterday"));
        ok(FieldKind::Duration, json!("P1DT2H"));
        bad(FieldKind::Duration, json!("1 day"));
        ok(FieldKind::Interval, json!("2024-01-01T00:00:00Z/2024-01-02T00:00:00Z"));
        ok(FieldKind::Interval, json!("2024-01-01/P1W"));
        bad(FieldKind::Interval, json!("2024-01-02/2024-01-01"));
        bad(FieldKind::Interval, json!("P1D/P2D"));
    }

    #[test]
    fn test_recurrence_rules() {
        ok(FieldKind::RecurrenceRule, json!("FREQ=WEEKLY;BYDAY=MO,WE"));
        ok(FieldKind::RecurrenceRule, json!("RRULE:INTERVAL=2;FREQ=MONTHLY"));
        bad(FieldKind::RecurrenceRule, json!("BYDAY=MO"));
        bad(FieldKind::RecurrenceRule, json!("FREQ=SOMETIMES"));
        bad(FieldKind::RecurrenceRule, json!("FREQ=DAILY;FREQ=WEEKLY"));
    }

    #[test]
    fn test_text_formats() {
        ok(FieldKind::Email, json!("ada@example.com"));
        bad(FieldKind::Email, json!("ada@"));
        ok(FieldKind::Url, json!("https://example.com/a?b=c"));
        bad(FieldKind::Url, json!("ftp://example.com"));
        bad(FieldKind::Url, json!("example.com"));
        ok(FieldKind::Domain, json!("sub.example.co.uk"));
        bad(FieldKind::Domain, json!("-bad-.com"));
        bad(FieldKind::Domain, json!("localhost"));
        ok(FieldKind::TimeZone, json!("America/New_York"));
        bad(FieldKind::TimeZone, json!("Mars/Olympus"));
    }

    #[test]
    fn test_phone_numbers() {
        ok(FieldKind::PhoneNumber, json!("+447911123456"));
        bad(FieldKind::PhoneNumber, json!("4155552671"));
        ok(FieldKind::UnitedStatesPhoneNumber, json!("+14155552671"));
        bad(FieldKind::UnitedStatesPhoneNumber, json!("+447911123456"));
    }

    #[test]
    fn test_choices() {
        let spec = FieldSpec::new("size", FieldKind::SelectOne).one_of(["s", "m"]);
        assert!(check(&spec, json!("s")).is_empty());
        assert_eq!(
            check(&spec, json!("xl")),
            vec!["Select a valid choice. xl is not one of the available choices."]
        );
        let spec = FieldSpec::new("sizes", FieldKind::SelectMany).one_of(["s", "m"]);
        assert!(check(&spec, json!(["s", "m"])).is_empty());
        assert_eq!(check(&spec, json!(["s", "xl"])).len(), 1);
    }

    #[test]
    fn test_lists() {
        ok(FieldKind::List, json!(["a", "b"]));
        // Rows that could not be converted to strings.
        bad(FieldKind::List, json!([{"id": "a", "value": ""}]));
        bad(FieldKind::List, json!("a"));
    }

    #[test]
    fn test_ids() {
        ok(FieldKind::Id, json!("3f2b8c1e-9d4a-4b7e-8f00-123456789abc"));
        bad(FieldKind::IdReference, json!("a b"));
    }

    #[test]
    fn test_validate_record_collects_all_fields() {
        let schema = ValidationSchema::from_specs(&[
            FieldSpec::new("name", FieldKind::ShortText).required(true),
            FieldSpec::new("email", FieldKind::Email),
            FieldSpec::new("age", FieldKind::Integer),
        ]);
        let record = json!({"email": "nope", "age": 30, "extra": 1});
        let err = schema.validate(record.as_object().unwrap()).unwrap_err();
        let messages = err.field_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages["name"], vec![REQUIRED_MESSAGE]);
        assert_eq!(messages["email"], vec!["Enter a valid email address."]);
    }

    #[test]
    fn test_validate_record_ok() {
        let schema = ValidationSchema::from_specs(&[FieldSpec::new("age", FieldKind::Integer)]);
        assert!(schema.validate(json!({"age": 3}).as_object().unwrap()).is_ok());
    }
}

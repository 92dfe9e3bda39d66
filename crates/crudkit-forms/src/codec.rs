//! Conversion between server (wire) records and form records.
//!
//! A backend stores cents, ISO-8601 UTC instants, E.164 phone numbers, and
//! plain string arrays. Editors work with formatted display strings and list
//! rows that carry a stable id. [`server_to_form`] and [`form_to_server`]
//! convert whole records between the two shapes.
//!
//! Both directions go through one table: every [`Bucket`] owns a
//! [`BucketCodec`] with a paired `decode` (server to form) and `encode`
//! (form to server), and keys are assigned to buckets by
//! [`ConverterOptions::bucket_of`]. Array values are handled before any
//! bucket lookup.

use std::collections::BTreeSet;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::format;
use crate::spec::FieldSpec;

/// A JSON object keyed by field key.
pub type Record = Map<String, Value>;

/// One row of a list field in form state.
///
/// The `id` gives the row a stable identity while editing; it has no meaning
/// on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: String,
    pub value: String,
}

impl ListItem {
    /// Creates a row with a fresh unique id.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            value: value.into(),
        }
    }

    /// Converts this row to its form-state JSON shape.
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "id": self.id, "value": self.value })
    }
}

/// A class of field keys with special conversion behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    Currency,
    DateTimeLocal,
    FloatingPoint,
    Integer,
    Percentage,
    PhoneNumber,
    /// Phone numbers always read and completed as US numbers.
    UnitedStatesPhoneNumber,
}

impl Bucket {
    /// Buckets in lookup priority order.
    pub const PRIORITY: [Self; 7] = [
        Self::Currency,
        Self::DateTimeLocal,
        Self::FloatingPoint,
        Self::Integer,
        Self::Percentage,
        Self::PhoneNumber,
        Self::UnitedStatesPhoneNumber,
    ];

    /// Returns the codec for this bucket.
    pub fn codec(self) -> &'static dyn BucketCodec {
        match self {
            Self::Currency => &CurrencyCodec,
            Self::DateTimeLocal => &DateTimeLocalCodec,
            Self::FloatingPoint => &FloatingPointCodec,
            Self::Integer => &IntegerCodec,
            Self::Percentage => &PercentageCodec,
            Self::PhoneNumber => &PHONE_NUMBER_CODEC,
            Self::UnitedStatesPhoneNumber => &UNITED_STATES_PHONE_NUMBER_CODEC,
        }
    }
}

/// A paired server-to-form and form-to-server conversion for one bucket.
///
/// `decode(encode(x))` recovers `x` up to canonical formatting, and `encode`
/// is idempotent on values that are already server-shaped. Neither direction
/// ever produces NaN: unusable input becomes `null`.
pub trait BucketCodec: Send + Sync {
    /// Converts a server value to its form representation.
    fn decode(&self, value: &Value, options: &ConverterOptions) -> Value;

    /// Converts a form value to its server representation.
    fn encode(&self, value: &Value, options: &ConverterOptions) -> Value;
}

/// Builds a JSON number from a float, mapping non-finite values to `null`.
fn number(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

fn string_or_null(value: Option<String>) -> Value {
    value.map_or(Value::Null, Value::String)
}

struct CurrencyCodec;

impl BucketCodec for CurrencyCodec {
    fn decode(&self, value: &Value, options: &ConverterOptions) -> Value {
        string_or_null(
            value
                .as_f64()
                .and_then(|cents| format::format_currency_cents(cents, &options.currency_symbol)),
        )
    }

    fn encode(&self, value: &Value, _options: &ConverterOptions) -> Value {
        match value {
            Value::Number(_) => value.clone(),
            Value::String(s) => format::parse_currency_cents(s).map_or(Value::Null, Value::from),
            _ => Value::Null,
        }
    }
}

struct DateTimeLocalCodec;

impl BucketCodec for DateTimeLocalCodec {
    fn decode(&self, value: &Value, options: &ConverterOptions) -> Value {
        string_or_null(
            value
                .as_str()
                .and_then(|iso| format::format_local_date_time(iso, options.utc_offset)),
        )
    }

    fn encode(&self, value: &Value, options: &ConverterOptions) -> Value {
        string_or_null(
            value
                .as_str()
                .and_then(|local| format::parse_local_date_time(local, options.utc_offset)),
        )
    }
}

struct FloatingPointCodec;

impl BucketCodec for FloatingPointCodec {
    fn decode(&self, value: &Value, _options: &ConverterOptions) -> Value {
        string_or_null(
            value
                .as_f64()
                .and_then(|n| format::format_number(n, format::FLOAT_FRACTION_DIGITS)),
        )
    }

    fn encode(&self, value: &Value, _options: &ConverterOptions) -> Value {
        match value {
            Value::Number(_) => value.clone(),
            Value::String(s) => format::parse_decimal(s).map_or(Value::Null, number),
            _ => Value::Null,
        }
    }
}

struct IntegerCodec;

impl BucketCodec for IntegerCodec {
    fn decode(&self, value: &Value, _options: &ConverterOptions) -> Value {
        string_or_null(
            value
                .as_f64()
                .and_then(|n| format::format_number(n, format::DEFAULT_FRACTION_DIGITS)),
        )
    }

    fn encode(&self, value: &Value, _options: &ConverterOptions) -> Value {
        match value {
            Value::Number(_) => value.clone(),
            Value::String(s) => format::parse_integer(s).map_or(Value::Null, Value::from),
            _ => Value::Null,
        }
    }
}

struct PercentageCodec;

impl BucketCodec for PercentageCodec {
    fn decode(&self, value: &Value, _options: &ConverterOptions) -> Value {
        string_or_null(value.as_f64().and_then(format::format_percentage))
    }

    fn encode(&self, value: &Value, _options: &ConverterOptions) -> Value {
        match value {
            Value::Number(_) => value.clone(),
            Value::String(s) => format::parse_percentage(s).map_or(Value::Null, number),
            _ => Value::Null,
        }
    }
}

/// Phone numbers in the configured region, or in `locked_region` when set.
struct PhoneNumberCodec {
    locked_region: Option<&'static str>,
}

impl PhoneNumberCodec {
    fn region<'a>(&self, options: &'a ConverterOptions) -> &'a str {
        match self.locked_region {
            Some(region) => region,
            None => &options.phone_region,
        }
    }
}

static PHONE_NUMBER_CODEC: PhoneNumberCodec = PhoneNumberCodec { locked_region: None };

static UNITED_STATES_PHONE_NUMBER_CODEC: PhoneNumberCodec = PhoneNumberCodec {
    locked_region: Some(format::UNITED_STATES_REGION),
};

impl BucketCodec for PhoneNumberCodec {
    fn decode(&self, value: &Value, options: &ConverterOptions) -> Value {
        string_or_null(
            value
                .as_str()
                .map(|e164| format::format_phone_national(e164, self.region(options))),
        )
    }

    fn encode(&self, value: &Value, options: &ConverterOptions) -> Value {
        string_or_null(
            value
                .as_str()
                .and_then(|s| format::normalize_phone(s, self.region(options))),
        )
    }
}

/// Assigns field keys to conversion buckets and carries locale settings.
///
/// Buckets are expected to be disjoint; if a key is listed in several, the
/// first in [`Bucket::PRIORITY`] order wins in both directions.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterOptions {
    pub currency_field_keys: BTreeSet<String>,
    pub date_time_local_field_keys: BTreeSet<String>,
    pub floating_point_number_field_keys: BTreeSet<String>,
    pub integer_field_keys: BTreeSet<String>,
    pub percentage_field_keys: BTreeSet<String>,
    pub phone_number_field_keys: BTreeSet<String>,
    /// Phone keys that ignore `phone_region` and always use the US.
    pub united_states_phone_number_field_keys: BTreeSet<String>,
    /// Offset used to display local date-times.
    pub utc_offset: FixedOffset,
    /// Symbol prefixed to formatted currency.
    pub currency_symbol: String,
    /// Region used to display and complete phone numbers.
    pub phone_region: String,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            currency_field_keys: BTreeSet::new(),
            date_time_local_field_keys: BTreeSet::new(),
            floating_point_number_field_keys: BTreeSet::new(),
            integer_field_keys: BTreeSet::new(),
            percentage_field_keys: BTreeSet::new(),
            phone_number_field_keys: BTreeSet::new(),
            united_states_phone_number_field_keys: BTreeSet::new(),
            utc_offset: Utc.fix(),
            currency_symbol: "$".to_string(),
            phone_region: "US".to_string(),
        }
    }
}

fn key_set<I, S>(keys: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    keys.into_iter().map(Into::into).collect()
}

impl ConverterOptions {
    /// Creates options with no bucketed keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the buckets from the kinds of the given field specs.
    pub fn from_field_specs(specs: &[FieldSpec]) -> Self {
        let mut options = Self::default();
        for spec in specs {
            if let Some(bucket) = spec.kind.bucket() {
                options.keys_mut(bucket).insert(spec.key.clone());
            }
        }
        options
    }

    fn keys(&self, bucket: Bucket) -> &BTreeSet<String> {
        match bucket {
            Bucket::Currency => &self.currency_field_keys,
            Bucket::DateTimeLocal => &self.date_time_local_field_keys,
            Bucket::FloatingPoint => &self.floating_point_number_field_keys,
            Bucket::Integer => &self.integer_field_keys,
            Bucket::Percentage => &self.percentage_field_keys,
            Bucket::PhoneNumber => &self.phone_number_field_keys,
            Bucket::UnitedStatesPhoneNumber => &self.united_states_phone_number_field_keys,
        }
    }

    fn keys_mut(&mut self, bucket: Bucket) -> &mut BTreeSet<String> {
        match bucket {
            Bucket::Currency => &mut self.currency_field_keys,
            Bucket::DateTimeLocal => &mut self.date_time_local_field_keys,
            Bucket::FloatingPoint => &mut self.floating_point_number_field_keys,
            Bucket::Integer => &mut self.integer_field_keys,
            Bucket::Percentage => &mut self.percentage_field_keys,
            Bucket::PhoneNumber => &mut self.phone_number_field_keys,
            Bucket::UnitedStatesPhoneNumber => &mut self.united_states_phone_number_field_keys,
        }
    }

    /// Returns the bucket a key belongs to, if any.
    pub fn bucket_of(&self, key: &str) -> Option<Bucket> {
        Bucket::PRIORITY
            .into_iter()
            .find(|bucket| self.keys(*bucket).contains(key))
    }

    /// Sets the currency keys.
    #[must_use]
    pub fn currency_field_keys<I: IntoIterator<Item = S>, S: Into<String>>(mut self, keys: I) -> Self {
        self.currency_field_keys = key_set(keys);
        self
    }

    /// Sets the local date-time keys.
    #[must_use]
    pub fn date_time_local_field_keys<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        keys: I,
    ) -> Self {
        self.date_time_local_field_keys = key_set(keys);
        self
    }

    /// Sets the floating-point keys.
    #[must_use]
    pub fn floating_point_number_field_keys<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        keys: I,
    ) -> Self {
        self.floating_point_number_field_keys = key_set(keys);
        self
    }

    /// Sets the integer keys.
    #[must_use]
    pub fn integer_field_keys<I: IntoIterator<Item = S>, S: Into<String>>(mut self, keys: I) -> Self {
        self.integer_field_keys = key_set(keys);
        self
    }

    /// Sets the percentage keys.
    #[must_use]
    pub fn percentage_field_keys<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        keys: I,
    ) -> Self {
        self.percentage_field_keys = key_set(keys);
        self
    }

    /// Sets the phone number keys.
    #[must_use]
    pub fn phone_number_field_keys<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        keys: I,
    ) -> Self {
        self.phone_number_field_keys = key_set(keys);
        self
    }

    /// Sets the phone number keys locked to the US.
    #[must_use]
    pub fn united_states_phone_number_field_keys<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        keys: I,
    ) -> Self {
        self.united_states_phone_number_field_keys = key_set(keys);
        self
    }

    /// Sets the offset used for local date-times.
    #[must_use]
    pub const fn utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Sets the currency symbol.
    #[must_use]
    pub fn currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    /// Sets the phone region.
    #[must_use]
    pub fn phone_region(mut self, region: impl Into<String>) -> Self {
        self.phone_region = region.into();
        self
    }
}

fn is_string_array(items: &[Value]) -> bool {
    items.iter().all(Value::is_string)
}

/// Extracts the plain values of list rows, or `None` if any row is not a
/// `{id, value}` object with non-empty strings for both.
fn list_row_values(items: &[Value]) -> Option<Vec<Value>> {
    items
        .iter()
        .map(|item| {
            let obj = item.as_object()?;
            let id = obj.get("id")?.as_str()?;
            let value = obj.get("value")?.as_str()?;
            (!id.is_empty() && !value.is_empty()).then(|| Value::String(value.to_string()))
        })
        .collect()
}

/// Converts one server value to its form representation.
pub fn decode_value(key: &str, value: &Value, options: &ConverterOptions) -> Value {
    if let Value::Array(items) = value {
        if is_string_array(items) {
            return Value::Array(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|s| ListItem::new(s).to_value())
                    .collect(),
            );
        }
    }
    match options.bucket_of(key) {
        Some(bucket) => bucket.codec().decode(value, options),
        None => value.clone(),
    }
}

/// Converts one form value to its server representation.
pub fn encode_value(key: &str, value: &Value, options: &ConverterOptions) -> Value {
    if let Value::Array(items) = value {
        if let Some(values) = list_row_values(items) {
            return Value::Array(values);
        }
    }
    match options.bucket_of(key) {
        Some(bucket) => bucket.codec().encode(value, options),
        None => value.clone(),
    }
}

/// Converts a server record to form shape.
///
/// # Examples
///
/// ```
/// use crudkit_forms::codec::{server_to_form, ConverterOptions};
/// use serde_json::json;
///
/// let options = ConverterOptions::new().currency_field_keys(["price"]);
/// let record = json!({"price": 25_000_000, "title": "Loft"});
/// let form = server_to_form(record.as_object().unwrap(), &options);
/// assert_eq!(form["price"], json!("$250,000.00"));
/// assert_eq!(form["title"], json!("Loft"));
/// ```
pub fn server_to_form(record: &Record, options: &ConverterOptions) -> Record {
    record
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(key, value, options)))
        .collect()
}

/// Converts a form record to server shape.
///
/// # Examples
///
/// ```
/// use crudkit_forms::codec::{form_to_server, ConverterOptions};
/// use serde_json::json;
///
/// let options = ConverterOptions::new().integer_field_keys(["count"]);
/// let record = json!({"count": "1,548"});
/// let wire = form_to_server(record.as_object().unwrap(), &options);
/// assert_eq!(wire["count"], json!(1548));
/// ```
pub fn form_to_server(record: &Record, options: &ConverterOptions) -> Record {
    record
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(key, value, options)))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::kind::FieldKind;
    use crate::schema::ValidationSchema;

    fn options() -> ConverterOptions {
        ConverterOptions::new()
            .currency_field_keys(["price"])
            .date_time_local_field_keys(["starts_at"])
            .floating_point_number_field_keys(["ratio"])
            .integer_field_keys(["count"])
            .percentage_field_keys(["rate"])
            .phone_number_field_keys(["phone"])
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    // ── server → form ───────────────────────────────────────────────

    #[test]
    fn test_decode_string_array_to_rows() {
        let form = server_to_form(&record(json!({"hobbies": ["Reading", "Swimming"]})), &options());
        let rows = form["hobbies"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["value"], json!("Reading"));
        assert_eq!(rows[1]["value"], json!("Swimming"));
        let id0 = rows[0]["id"].as_str().unwrap();
        let id1 = rows[1]["id"].as_str().unwrap();
        assert!(!id0.is_empty());
        assert_ne!(id0, id1);
    }

    #[test]
    fn test_decode_array_wins_over_bucket() {
        let form = server_to_form(&record(json!({"price": ["a"]})), &options());
        assert_eq!(form["price"][0]["value"], json!("a"));
    }

    #[test]
    fn test_decode_mixed_array_passes_through() {
        let form = server_to_form(&record(json!({"tags": ["a", 1]})), &options());
        assert_eq!(form["tags"], json!(["a", 1]));
    }

    #[test]
    fn test_decode_buckets() {
        let form = server_to_form(
            &record(json!({
                "price": 25_000_000,
                "starts_at": "2024-03-01T17:30:00.000Z",
                "ratio": 0.333,
                "count": 1548,
                "rate": 0.05,
                "phone": "+14155552671",
                "name": "Ada",
            })),
            &options(),
        );
        assert_eq!(form["price"], json!("$250,000.00"));
        assert_eq!(form["starts_at"], json!("2024-03-01T17:30"));
        assert_eq!(form["ratio"], json!("0.333"));
        assert_eq!(form["count"], json!("1,548"));
        assert_eq!(form["rate"], json!("5%"));
        assert_eq!(form["phone"], json!("(415) 555-2671"));
        assert_eq!(form["name"], json!("Ada"));
    }

    #[test]
    fn test_decode_wrong_types_become_null() {
        let form = server_to_form(
            &record(json!({
                "price": "lots",
                "starts_at": 12,
                "ratio": null,
                "count": "x",
                "rate": true,
                "phone": 4_155_552_671_u64,
            })),
            &options(),
        );
        for key in ["price", "starts_at", "ratio", "count", "rate", "phone"] {
            assert_eq!(form[key], Value::Null, "{key} should be null");
        }
    }

    // ── form → server ───────────────────────────────────────────────

    #[test]
    fn test_encode_rows_to_strings() {
        let wire = form_to_server(
            &record(json!({"hobbies": [
                {"id": "a", "value": "Reading"},
                {"id": "b", "value": "Swimming"},
            ]})),
            &options(),
        );
        assert_eq!(wire["hobbies"], json!(["Reading", "Swimming"]));
    }

    #[test]
    fn test_encode_rows_with_blank_value_pass_through() {
        let rows = json!([{"id": "a", "value": ""}]);
        let wire = form_to_server(&record(json!({"hobbies": rows.clone()})), &options());
        assert_eq!(wire["hobbies"], rows);
    }

    #[test]
    fn test_encode_rows_with_blank_id_pass_through() {
        let rows = json!([{"id": "", "value": "x"}]);
        let wire = form_to_server(&record(json!({"hobbies": rows.clone()})), &options());
        assert_eq!(wire["hobbies"], rows);
    }

    #[test]
    fn test_encode_buckets() {
        let wire = form_to_server(
            &record(json!({
                "price": "$1,234.56",
                "starts_at": "2024-03-01T17:30",
                "ratio": "3.5",
                "count": "1,548",
                "rate": "5%",
                "phone": "(415) 555-2671",
                "name": "Ada",
            })),
            &options(),
        );
        assert_eq!(wire["price"], json!(123_456));
        assert_eq!(wire["starts_at"], json!("2024-03-01T17:30:00.000Z"));
        assert_eq!(wire["ratio"], json!(3.5));
        assert_eq!(wire["count"], json!(1548));
        assert_eq!(wire["rate"], json!(0.05));
        assert_eq!(wire["phone"], json!("+14155552671"));
        assert_eq!(wire["name"], json!("Ada"));
    }

    #[test]
    fn test_encode_empty_strings_become_null() {
        let wire = form_to_server(
            &record(json!({
                "price": "",
                "starts_at": "",
                "ratio": "",
                "count": "",
                "rate": "",
                "phone": "",
            })),
            &options(),
        );
        for key in ["price", "starts_at", "ratio", "count", "rate", "phone"] {
            assert_eq!(wire[key], Value::Null, "{key} should be null");
        }
    }

    #[test]
    fn test_encode_nan_strings_become_null() {
        let wire = form_to_server(
            &record(json!({"price": "NaN", "ratio": "NaN", "count": "NaN", "rate": "NaN"})),
            &options(),
        );
        for key in ["price", "ratio", "count", "rate"] {
            assert_eq!(wire[key], Value::Null, "{key} should be null");
        }
    }

    #[test]
    fn test_encode_non_strings_become_null() {
        let wire = form_to_server(
            &record(json!({"price": true, "starts_at": 5, "count": [], "phone": 12})),
            &options(),
        );
        assert_eq!(wire["price"], Value::Null);
        assert_eq!(wire["starts_at"], Value::Null);
        assert_eq!(wire["phone"], Value::Null);
        // Empty arrays are lists, not integers.
        assert_eq!(wire["count"], json!([]));
    }

    #[test]
    fn test_bucket_priority_when_keys_overlap() {
        let options = ConverterOptions::new()
            .integer_field_keys(["n"])
            .floating_point_number_field_keys(["n"]);
        assert_eq!(options.bucket_of("n"), Some(Bucket::FloatingPoint));
        let wire = form_to_server(&record(json!({"n": "2.5"})), &options);
        assert_eq!(wire["n"], json!(2.5));
    }

    #[test]
    fn test_currency_symbol_and_region_options() {
        let options = ConverterOptions::new()
            .currency_field_keys(["price"])
            .phone_number_field_keys(["phone"])
            .currency_symbol("€")
            .phone_region("GB");
        let form = server_to_form(
            &record(json!({"price": 1999, "phone": "+447911123456"})),
            &options,
        );
        assert_eq!(form["price"], json!("€19.99"));
        assert_eq!(form["phone"], json!("07911123456"));
        let wire = form_to_server(&form, &options);
        assert_eq!(wire["price"], json!(1999));
        assert_eq!(wire["phone"], json!("+447911123456"));
    }

    #[test]
    fn test_united_states_phone_ignores_region() {
        let specs = [
            FieldSpec::new("office", FieldKind::UnitedStatesPhoneNumber),
            FieldSpec::new("mobile", FieldKind::PhoneNumber),
        ];
        let options = ConverterOptions::from_field_specs(&specs).phone_region("GB");
        let wire = form_to_server(
            &record(json!({"office": "(415) 555-2671", "mobile": "07911 123456"})),
            &options,
        );
        assert_eq!(wire["office"], json!("+14155552671"));
        assert_eq!(wire["mobile"], json!("+447911123456"));
        assert!(ValidationSchema::from_specs(&specs).validate(&wire).is_ok());

        let form = server_to_form(&wire, &options);
        assert_eq!(form["office"], json!("(415) 555-2671"));
        assert_eq!(form["mobile"], json!("07911123456"));
    }

    fn every_bucket() -> ConverterOptions {
        options()
            .united_states_phone_number_field_keys(["office"])
            .utc_offset(FixedOffset::east_opt(3600).unwrap())
    }

    fn form_record() -> Record {
        record(json!({
            "price": "$1,234.56",
            "starts_at": "2024-03-01T17:30",
            "ratio": "0.333",
            "count": "1,548",
            "rate": "5%",
            "phone": "(415) 555-2671",
            "office": "(415) 555-2671",
            "name": "Ada",
            "note": null,
        }))
    }

    fn server_record() -> Record {
        record(json!({
            "price": 123_456,
            "starts_at": "2024-03-01T16:30:00.000Z",
            "ratio": 0.333,
            "count": 1548,
            "rate": 0.05,
            "phone": "+14155552671",
            "office": "+14155552671",
            "hobbies": ["Reading", "Swimming"],
            "name": "Ada",
            "note": null,
        }))
    }

    #[test]
    fn test_encode_is_idempotent() {
        let options = every_bucket();
        let mut form = form_record();
        form.insert(
            "hobbies".into(),
            json!([{"id": "a", "value": "Reading"}, {"id": "b", "value": "Swimming"}]),
        );

        let once = form_to_server(&form, &options);
        assert_eq!(once, server_record());
        assert_eq!(form_to_server(&once, &options), once);
    }

    #[test]
    fn test_round_trip_every_bucket() {
        let options = every_bucket();

        let form = form_record();
        assert_eq!(server_to_form(&form_to_server(&form, &options), &options), form);

        // List rows get fresh ids on the way in, so compare on the wire side.
        let wire = server_record();
        assert_eq!(form_to_server(&server_to_form(&wire, &options), &options), wire);
    }

    #[test]
    fn test_list_item_new_has_unique_ids() {
        let a = ListItem::new("x");
        let b = ListItem::new("x");
        assert_ne!(a.id, b.id);
        assert_eq!(a.to_value()["value"], json!("x"));
    }
}

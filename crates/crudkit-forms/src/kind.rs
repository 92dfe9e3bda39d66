//! The closed set of semantic field kinds.
//!
//! Every field in a resource specification declares one [`FieldKind`]. The
//! editor and cell dispatchers match on it exhaustively, so a new kind cannot
//! be added without deciding how it is edited and displayed. Parsing a kind
//! from its wire name is the only place an unknown type can appear, and it
//! fails with [`FormError::UnsupportedFieldType`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::Bucket;
use crate::error::FormError;

/// A semantic field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum FieldKind {
    /// Single-line text.
    ShortText,
    /// Multi-line plain text.
    LongText,
    /// A whole number.
    Integer,
    /// A floating-point number.
    FloatingPointNumber,
    /// A money amount stored in minor units (cents).
    Currency,
    /// A US dollar amount stored in cents.
    Usd,
    /// A fraction stored as a number (`0.05` is 5%).
    Percentage,
    /// True or false.
    Boolean,
    /// A calendar date (`YYYY-MM-DD`).
    Date,
    /// An instant edited in local time and stored as ISO-8601 UTC.
    DateTimeLocal,
    /// An ISO-8601 duration (`P1DT2H`).
    Duration,
    /// An ISO-8601 interval (`start/end`).
    Interval,
    /// An iCalendar recurrence rule (`FREQ=WEEKLY;BYDAY=MO`).
    RecurrenceRule,
    /// An email address.
    Email,
    /// An absolute http(s) URL.
    Url,
    /// A DNS domain name.
    Domain,
    /// A phone number stored in E.164 form.
    PhoneNumber,
    /// A phone number restricted to the US, stored in E.164 form.
    UnitedStatesPhoneNumber,
    /// An IANA time zone name.
    TimeZone,
    /// One value out of `one_of`.
    SelectOne,
    /// Any subset of `one_of`.
    SelectMany,
    /// An ordered list of free-form strings.
    List,
    /// The document's own id.
    Id,
    /// The id of a document in another resource.
    IdReference,
    /// HTML rich text.
    RichText,
    /// Markdown text.
    Markdown,
    /// Text that must never be displayed back (API keys, secrets).
    SensitiveText,
}

impl FieldKind {
    /// Every supported kind, in declaration order.
    pub const ALL: [Self; 27] = [
        Self::ShortText,
        Self::LongText,
        Self::Integer,
        Self::FloatingPointNumber,
        Self::Currency,
        Self::Usd,
        Self::Percentage,
        Self::Boolean,
        Self::Date,
        Self::DateTimeLocal,
        Self::Duration,
        Self::Interval,
        Self::RecurrenceRule,
        Self::Email,
        Self::Url,
        Self::Domain,
        Self::PhoneNumber,
        Self::UnitedStatesPhoneNumber,
        Self::TimeZone,
        Self::SelectOne,
        Self::SelectMany,
        Self::List,
        Self::Id,
        Self::IdReference,
        Self::RichText,
        Self::Markdown,
        Self::SensitiveText,
    ];

    /// Returns the wire name of this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ShortText => "short_text",
            Self::LongText => "long_text",
            Self::Integer => "integer",
            Self::FloatingPointNumber => "floating_point_number",
            Self::Currency => "currency",
            Self::Usd => "usd",
            Self::Percentage => "percentage",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTimeLocal => "date_time_local",
            Self::Duration => "duration",
            Self::Interval => "interval",
            Self::RecurrenceRule => "recurrence_rule",
            Self::Email => "email",
            Self::Url => "url",
            Self::Domain => "domain",
            Self::PhoneNumber => "phone_number",
            Self::UnitedStatesPhoneNumber => "united_states_phone_number",
            Self::TimeZone => "time_zone",
            Self::SelectOne => "select_one",
            Self::SelectMany => "select_many",
            Self::List => "list",
            Self::Id => "id",
            Self::IdReference => "id_reference",
            Self::RichText => "rich_text",
            Self::Markdown => "markdown",
            Self::SensitiveText => "sensitive_text",
        }
    }

    /// Returns the conversion bucket for values of this kind, if any.
    pub const fn bucket(self) -> Option<Bucket> {
        match self {
            Self::Currency | Self::Usd => Some(Bucket::Currency),
            Self::DateTimeLocal => Some(Bucket::DateTimeLocal),
            Self::FloatingPointNumber => Some(Bucket::FloatingPoint),
            Self::Integer => Some(Bucket::Integer),
            Self::Percentage => Some(Bucket::Percentage),
            Self::PhoneNumber => Some(Bucket::PhoneNumber),
            Self::UnitedStatesPhoneNumber => Some(Bucket::UnitedStatesPhoneNumber),
            _ => None,
        }
    }

    /// Returns `true` if values of this kind are arrays of strings on the wire.
    pub const fn is_multi_valued(self) -> bool {
        matches!(self, Self::List | Self::SelectMany)
    }

    /// Returns `true` if values of this kind are numbers on the wire.
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Integer
                | Self::FloatingPointNumber
                | Self::Currency
                | Self::Usd
                | Self::Percentage
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| FormError::UnsupportedFieldType(s.to_string()))
    }
}

impl TryFrom<String> for FieldKind {
    type Error = FormError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldKind> for &'static str {
    fn from(kind: FieldKind) -> Self {
        kind.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_parses_from_its_name() {
        for kind in FieldKind::ALL {
            assert_eq!(kind.as_str().parse::<FieldKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = FieldKind::ALL.iter().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FieldKind::ALL.len());
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = "hologram".parse::<FieldKind>().unwrap_err();
        assert!(matches!(err, FormError::UnsupportedFieldType(ref t) if t == "hologram"));
        assert!(err.to_string().contains("hologram"));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        assert!("Integer".parse::<FieldKind>().is_err());
    }

    #[test]
    fn test_buckets() {
        assert_eq!(FieldKind::Usd.bucket(), Some(Bucket::Currency));
        assert_eq!(
            FieldKind::UnitedStatesPhoneNumber.bucket(),
            Some(Bucket::UnitedStatesPhoneNumber)
        );
        assert_eq!(FieldKind::FloatingPointNumber.bucket(), Some(Bucket::FloatingPoint));
        assert_eq!(FieldKind::Date.bucket(), None);
        assert_eq!(FieldKind::List.bucket(), None);
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&FieldKind::DateTimeLocal).unwrap();
        assert_eq!(json, "\"date_time_local\"");
        let kind: FieldKind = serde_json::from_str("\"select_many\"").unwrap();
        assert_eq!(kind, FieldKind::SelectMany);
    }

    #[test]
    fn test_serde_rejects_unknown_kind() {
        let err = serde_json::from_str::<FieldKind>("\"blob\"").unwrap_err();
        assert!(err.to_string().contains("unsupported field type: blob"));
    }
}

//! Editor and cell selection.
//!
//! [`editor_for`] and [`cell_for`] map a [`FieldSpec`] to its component with
//! an exhaustive `match` on [`FieldKind`], so every kind has exactly one
//! editor and one cell. The string-keyed entry points are the only place an
//! unknown type can reach dispatch; they fail with
//! [`FormError::UnsupportedFieldType`].

use crate::cells::{
    BadgesCell, BooleanCell, Cell, CellKind, CellProps, CurrencyCell, DateTimeCell, DurationCell,
    IdCell, IntervalCell, LinkCell, NumberCell, OptionCell, PercentageCell, PhoneNumberCell,
    RichTextCell, SensitiveCell, TextCell,
};
use crate::editors::{
    CheckboxEditor, Editor, EditorKind, EditorProps, InputEditor, IntervalEditor, ListEditor,
    MultiSelectEditor, PhoneNumberEditor, SelectEditor, TextareaEditor,
};
use crate::error::FormResult;
use crate::format::{self, TIME_ZONES, UNITED_STATES_REGION};
use crate::kind::FieldKind;
use crate::spec::FieldSpec;

fn choices(spec: &FieldSpec) -> Vec<(String, String)> {
    spec.one_of
        .iter()
        .map(|v| (v.clone(), spec.option_label(v).to_string()))
        .collect()
}

/// Selects the editor for a field.
pub fn editor_for(spec: &FieldSpec, props: &EditorProps) -> Box<dyn Editor> {
    let props = props.clone();
    match spec.kind {
        FieldKind::ShortText => Box::new(InputEditor::new(EditorKind::TextInput, "text", props)),
        FieldKind::LongText => Box::new(TextareaEditor::new(EditorKind::Textarea, None, props)),
        FieldKind::Integer => Box::new(
            InputEditor::new(EditorKind::NumberInput, "text", props)
                .with_attr("inputmode", "numeric"),
        ),
        FieldKind::FloatingPointNumber => Box::new(
            InputEditor::new(EditorKind::NumberInput, "text", props)
                .with_attr("inputmode", "decimal"),
        ),
        FieldKind::Currency | FieldKind::Usd => Box::new(
            InputEditor::new(EditorKind::CurrencyInput, "text", props)
                .with_attr("inputmode", "decimal"),
        ),
        FieldKind::Percentage => Box::new(
            InputEditor::new(EditorKind::PercentageInput, "text", props)
                .with_attr("inputmode", "decimal"),
        ),
        FieldKind::Boolean => Box::new(CheckboxEditor::new(props)),
        FieldKind::Date => Box::new(InputEditor::new(EditorKind::DateInput, "date", props)),
        FieldKind::DateTimeLocal => Box::new(InputEditor::new(
            EditorKind::DateTimeLocalInput,
            "datetime-local",
            props,
        )),
        FieldKind::Duration => Box::new(
            InputEditor::new(EditorKind::DurationInput, "text", props)
                .with_attr("pattern", "P.*"),
        ),
        FieldKind::Interval => Box::new(IntervalEditor::new(props)),
        FieldKind::RecurrenceRule => Box::new(InputEditor::new(
            EditorKind::RecurrenceRuleInput,
            "text",
            props,
        )),
        FieldKind::Email => Box::new(InputEditor::new(EditorKind::EmailInput, "email", props)),
        FieldKind::Url => Box::new(InputEditor::new(EditorKind::UrlInput, "url", props)),
        FieldKind::Domain => Box::new(InputEditor::new(EditorKind::DomainInput, "text", props)),
        FieldKind::PhoneNumber => Box::new(PhoneNumberEditor::new(props)),
        FieldKind::UnitedStatesPhoneNumber => {
            Box::new(PhoneNumberEditor::locked(UNITED_STATES_REGION, props))
        }
        FieldKind::TimeZone => {
            let zones = TIME_ZONES
                .iter()
                .map(|z| ((*z).to_string(), (*z).to_string()))
                .collect();
            Box::new(SelectEditor::new(EditorKind::TimeZoneSelect, zones, props))
        }
        FieldKind::SelectOne => Box::new(SelectEditor::new(EditorKind::Select, choices(spec), props)),
        FieldKind::SelectMany => Box::new(MultiSelectEditor::new(choices(spec), props)),
        FieldKind::List => Box::new(ListEditor::new(props)),
        FieldKind::Id => Box::new(
            InputEditor::new(EditorKind::IdInput, "text", props).with_attr("readonly", "readonly"),
        ),
        FieldKind::IdReference => Box::new(SelectEditor::reference(props)),
        FieldKind::RichText => Box::new(TextareaEditor::new(
            EditorKind::RichTextEditor,
            Some("html"),
            props,
        )),
        FieldKind::Markdown => Box::new(TextareaEditor::new(
            EditorKind::MarkdownEditor,
            Some("markdown"),
            props,
        )),
        FieldKind::SensitiveText => Box::new(
            InputEditor::new(EditorKind::PasswordInput, "password", props)
                .with_attr("autocomplete", "off")
                .hide_value(),
        ),
    }
}

/// Selects the display cell for a field.
pub fn cell_for(spec: &FieldSpec, props: &CellProps) -> Box<dyn Cell> {
    match spec.kind {
        FieldKind::ShortText => Box::new(TextCell::new(CellKind::Text)),
        FieldKind::LongText => Box::new(TextCell::preview(CellKind::TextPreview)),
        FieldKind::Integer => Box::new(NumberCell::new(format::DEFAULT_FRACTION_DIGITS)),
        FieldKind::FloatingPointNumber => Box::new(NumberCell::new(format::FLOAT_FRACTION_DIGITS)),
        FieldKind::Currency => Box::new(CurrencyCell::new(props.currency_symbol.clone())),
        FieldKind::Usd => Box::new(CurrencyCell::new("$")),
        FieldKind::Percentage => Box::new(PercentageCell),
        FieldKind::Boolean => Box::new(BooleanCell),
        FieldKind::Date => Box::new(TextCell::new(CellKind::Date)),
        FieldKind::DateTimeLocal => Box::new(DateTimeCell::new(props.utc_offset)),
        FieldKind::Duration => Box::new(DurationCell),
        FieldKind::Interval => Box::new(IntervalCell),
        FieldKind::RecurrenceRule => Box::new(TextCell::new(CellKind::RecurrenceRule)),
        FieldKind::Email => Box::new(LinkCell::email()),
        FieldKind::Url => Box::new(LinkCell::url()),
        FieldKind::Domain => Box::new(LinkCell::domain()),
        FieldKind::PhoneNumber => Box::new(PhoneNumberCell::new(props.phone_region.clone())),
        FieldKind::UnitedStatesPhoneNumber => Box::new(PhoneNumberCell::new(UNITED_STATES_REGION)),
        FieldKind::TimeZone => Box::new(TextCell::new(CellKind::TimeZone)),
        FieldKind::SelectOne => Box::new(OptionCell::new(spec.label_by_enum_option.clone())),
        FieldKind::SelectMany | FieldKind::List => {
            Box::new(BadgesCell::new(spec.label_by_enum_option.clone()))
        }
        FieldKind::Id => Box::new(IdCell::own()),
        FieldKind::IdReference => Box::new(IdCell::reference(spec.meta.reference_resources.clone())),
        FieldKind::RichText => Box::new(RichTextCell),
        FieldKind::Markdown => Box::new(TextCell::preview(CellKind::Markdown)),
        FieldKind::SensitiveText => Box::new(SensitiveCell),
    }
}

/// Selects the editor for a field given its type name.
///
/// # Errors
///
/// Returns [`crate::FormError::UnsupportedFieldType`] naming `type_name` when
/// it is not a supported kind.
pub fn editor_for_type_name(
    type_name: &str,
    key: &str,
    props: &EditorProps,
) -> FormResult<Box<dyn Editor>> {
    let kind: FieldKind = type_name.parse()?;
    Ok(editor_for(&FieldSpec::new(key, kind), props))
}

/// Selects the display cell for a field given its type name.
///
/// # Errors
///
/// Returns [`crate::FormError::UnsupportedFieldType`] naming `type_name` when
/// it is not a supported kind.
pub fn cell_for_type_name(type_name: &str, key: &str, props: &CellProps) -> FormResult<Box<dyn Cell>> {
    let kind: FieldKind = type_name.parse()?;
    Ok(cell_for(&FieldSpec::new(key, kind), props))
}

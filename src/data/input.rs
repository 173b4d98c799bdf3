//! Incoming student data and the rules it has to satisfy before it is allowed
//! anywhere near the store.
//!
//! Every field is checked independently, so a caller always gets back the
//! complete set of failures rather than just the first one.

use crate::data::student::{NewStudent, StudentChanges};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{Error as DeError, IgnoredAny, MapAccess, SeqAccess, Visitor},
    ser::Error as _,
};
use std::{collections::BTreeMap, fmt};

pub const MAX_FIELD_CHARS: usize = 255;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    StudentId,
    FirstName,
    LastName,
    MiddleName,
}

impl Field {
    pub const ALL: [Self; 4] = [
        Self::StudentId,
        Self::FirstName,
        Self::LastName,
        Self::MiddleName,
    ];

    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::StudentId => "student_id",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::MiddleName => "middle_name",
        }
    }

    ///how the field is referred to inside error messages
    pub const fn spoken_name(self) -> &'static str {
        match self {
            Self::StudentId => "student id",
            Self::FirstName => "first name",
            Self::LastName => "last name",
            Self::MiddleName => "middle name",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Rule {
    Required,
    String,
    Max,
    Unique,
}

impl Rule {
    pub fn message(self, field: Field) -> String {
        let name = field.spoken_name();
        match self {
            Self::Required => format!("The {name} field is required."),
            Self::String => format!("The {name} field must be a string."),
            Self::Max => {
                format!("The {name} field must not be greater than {MAX_FIELD_CHARS} characters.")
            }
            Self::Unique => format!("The {name} has already been taken."),
        }
    }
}

/// Field name to every message that applies to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, Vec<String>>);

impl FieldErrors {
    pub fn single(field: Field, rule: Rule) -> Self {
        let mut errors = Self::default();
        errors.add(field, rule);
        errors
    }

    pub fn add(&mut self, field: Field, rule: Rule) {
        self.0.entry(field).or_default().push(rule.message(field));
    }

    pub fn merge(&mut self, other: Self) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn get(&self, field: Field) -> Option<&[String]> {
        self.0.get(&field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &[String])> {
        self.0.iter().map(|(field, messages)| (*field, messages.as_slice()))
    }
}

/// One field of an incoming request, before any checks have run.
///
/// `Absent` and `Null` are kept apart so that updates can tell "leave this
/// alone" from "clear this".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldInput {
    #[default]
    Absent,
    Null,
    Text(String),
    NotText,
}

impl FieldInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    ///trims, and treats an empty string exactly like `null`
    fn check(&self) -> Result<Option<String>, Rule> {
        match self {
            Self::Absent | Self::Null => Ok(None),
            Self::NotText => Err(Rule::String),
            Self::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    Ok(None)
                } else if text.chars().count() > MAX_FIELD_CHARS {
                    Err(Rule::Max)
                } else {
                    Ok(Some(text.to_string()))
                }
            }
        }
    }

    /// The normalised text, if this value would pass every per-field check.
    pub fn valid_text(&self) -> Option<String> {
        self.check().ok().flatten()
    }
}

impl<'de> Deserialize<'de> for FieldInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FieldInputVisitor)
    }
}

struct FieldInputVisitor;

impl<'de> Visitor<'de> for FieldInputVisitor {
    type Value = FieldInput;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any value")
    }

    fn visit_str<E: DeError>(self, v: &str) -> Result<Self::Value, E> {
        Ok(FieldInput::Text(v.to_string()))
    }

    fn visit_string<E: DeError>(self, v: String) -> Result<Self::Value, E> {
        Ok(FieldInput::Text(v))
    }

    fn visit_none<E: DeError>(self) -> Result<Self::Value, E> {
        Ok(FieldInput::Null)
    }

    fn visit_unit<E: DeError>(self) -> Result<Self::Value, E> {
        Ok(FieldInput::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        FieldInput::deserialize(deserializer)
    }

    fn visit_bool<E: DeError>(self, _v: bool) -> Result<Self::Value, E> {
        Ok(FieldInput::NotText)
    }

    fn visit_i64<E: DeError>(self, _v: i64) -> Result<Self::Value, E> {
        Ok(FieldInput::NotText)
    }

    fn visit_u64<E: DeError>(self, _v: u64) -> Result<Self::Value, E> {
        Ok(FieldInput::NotText)
    }

    fn visit_f64<E: DeError>(self, _v: f64) -> Result<Self::Value, E> {
        Ok(FieldInput::NotText)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(FieldInput::NotText)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(FieldInput::NotText)
    }
}

impl Serialize for FieldInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absent | Self::Null => serializer.serialize_none(),
            Self::Text(text) => serializer.serialize_str(text),
            Self::NotText => Err(S::Error::custom("cannot send a non-text student field")),
        }
    }
}

/// The only four fields a caller is allowed to set. Anything else in the
/// request body is ignored, and a body that is not an object is refused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StudentInput {
    #[serde(default, skip_serializing_if = "FieldInput::is_absent")]
    pub student_id: FieldInput,
    #[serde(default, skip_serializing_if = "FieldInput::is_absent")]
    pub first_name: FieldInput,
    #[serde(default, skip_serializing_if = "FieldInput::is_absent")]
    pub last_name: FieldInput,
    #[serde(default, skip_serializing_if = "FieldInput::is_absent")]
    pub middle_name: FieldInput,
}

impl StudentInput {
    fn slot(&mut self, field: Field) -> &mut FieldInput {
        match field {
            Field::StudentId => &mut self.student_id,
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::MiddleName => &mut self.middle_name,
        }
    }
}

impl<'de> Deserialize<'de> for StudentInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(StudentInputVisitor)
    }
}

struct StudentInputVisitor;

impl<'de> Visitor<'de> for StudentInputVisitor {
    type Value = StudentInput;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an object of student fields")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut input = StudentInput::default();

        while let Some(key) = map.next_key::<String>()? {
            match Field::ALL.into_iter().find(|field| field.wire_name() == key) {
                Some(field) => *input.slot(field) = map.next_value()?,
                None => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        Ok(input)
    }
}

fn required(field: Field, input: &FieldInput, errors: &mut FieldErrors) -> Option<String> {
    match input.check() {
        Ok(Some(text)) => Some(text),
        Ok(None) => {
            errors.add(field, Rule::Required);
            None
        }
        Err(rule) => {
            errors.add(field, rule);
            None
        }
    }
}

fn optional(field: Field, input: &FieldInput, errors: &mut FieldErrors) -> Option<Option<String>> {
    match input.check() {
        Ok(text) => Some(text),
        Err(rule) => {
            errors.add(field, rule);
            None
        }
    }
}

///outer `None` means nothing was sent for this field
fn required_if_present(
    field: Field,
    input: &FieldInput,
    errors: &mut FieldErrors,
) -> Option<Option<String>> {
    if input.is_absent() {
        Some(None)
    } else {
        required(field, input, errors).map(Some)
    }
}

impl StudentInput {
    pub fn validate_new(&self) -> Result<NewStudent, FieldErrors> {
        let mut errors = FieldErrors::default();

        let student_id = required(Field::StudentId, &self.student_id, &mut errors);
        let first_name = required(Field::FirstName, &self.first_name, &mut errors);
        let last_name = required(Field::LastName, &self.last_name, &mut errors);
        let middle_name = optional(Field::MiddleName, &self.middle_name, &mut errors);

        let (Some(student_id), Some(first_name), Some(last_name), Some(middle_name)) =
            (student_id, first_name, last_name, middle_name)
        else {
            return Err(errors);
        };

        Ok(NewStudent {
            student_id,
            first_name,
            last_name,
            middle_name,
        })
    }

    pub fn validate_changes(&self) -> Result<StudentChanges, FieldErrors> {
        let mut errors = FieldErrors::default();

        let student_id = required_if_present(Field::StudentId, &self.student_id, &mut errors);
        let first_name = required_if_present(Field::FirstName, &self.first_name, &mut errors);
        let last_name = required_if_present(Field::LastName, &self.last_name, &mut errors);
        let middle_name = if self.middle_name.is_absent() {
            Some(None)
        } else {
            optional(Field::MiddleName, &self.middle_name, &mut errors).map(Some)
        };

        let (Some(student_id), Some(first_name), Some(last_name), Some(middle_name)) =
            (student_id, first_name, last_name, middle_name)
        else {
            return Err(errors);
        };

        Ok(StudentChanges {
            student_id,
            first_name,
            last_name,
            middle_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> StudentInput {
        serde_json::from_value(value).expect("student input always deserialises from an object")
    }

    #[test]
    fn complete_input_becomes_a_new_student() {
        let input = parse(json!({
            "student_id": " 2021-0001 ",
            "first_name": "Ana",
            "last_name": "Cruz",
            "middle_name": "",
            "is_admin": true,
        }));

        let new = input.validate_new().unwrap();
        assert_eq!(new.student_id, "2021-0001");
        assert_eq!(new.first_name, "Ana");
        assert_eq!(new.last_name, "Cruz");
        assert_eq!(new.middle_name, None);
    }

    #[test]
    fn only_objects_are_accepted() {
        assert!(serde_json::from_value::<StudentInput>(json!(["2021-0001", "Ana", "Cruz"])).is_err());
        assert!(serde_json::from_value::<StudentInput>(json!("Ana")).is_err());
        assert!(serde_json::from_value::<StudentInput>(json!(null)).is_err());
        assert_eq!(parse(json!({})), StudentInput::default());
    }

    #[test]
    fn every_failure_is_reported_at_once() {
        let input = parse(json!({
            "last_name": "Cruz",
            "middle_name": 12,
        }));

        let errors = input.validate_new().unwrap_err();
        assert!(errors.contains(Field::StudentId));
        assert!(errors.contains(Field::FirstName));
        assert!(!errors.contains(Field::LastName));
        assert_eq!(
            errors.get(Field::MiddleName).unwrap(),
            ["The middle name field must be a string."]
        );
        assert_eq!(
            errors.get(Field::FirstName).unwrap(),
            ["The first name field is required."]
        );
    }

    #[test]
    fn length_is_counted_in_characters() {
        let at_limit = "é".repeat(MAX_FIELD_CHARS);
        let over_limit = "a".repeat(MAX_FIELD_CHARS + 1);

        let input = StudentInput {
            student_id: FieldInput::text(at_limit),
            first_name: FieldInput::text(over_limit),
            last_name: FieldInput::text("Cruz"),
            middle_name: FieldInput::Absent,
        };

        let errors = input.validate_new().unwrap_err();
        assert!(!errors.contains(Field::StudentId));
        assert_eq!(
            errors.get(Field::FirstName).unwrap(),
            ["The first name field must not be greater than 255 characters."]
        );
    }

    #[test]
    fn whitespace_only_is_missing() {
        let input = parse(json!({
            "student_id": "   ",
            "first_name": "Ana",
            "last_name": null,
        }));

        let errors = input.validate_new().unwrap_err();
        assert!(errors.contains(Field::StudentId));
        assert!(errors.contains(Field::LastName));
    }

    #[test]
    fn changes_only_touch_what_was_sent() {
        let changes = parse(json!({"middle_name": "Reyes"}))
            .validate_changes()
            .unwrap();

        assert_eq!(changes.student_id, None);
        assert_eq!(changes.first_name, None);
        assert_eq!(changes.last_name, None);
        assert_eq!(changes.middle_name, Some(Some("Reyes".to_string())));

        let cleared = parse(json!({"middle_name": null}))
            .validate_changes()
            .unwrap();
        assert_eq!(cleared.middle_name, Some(None));
    }

    #[test]
    fn sent_but_empty_required_fields_fail_on_update() {
        let errors = parse(json!({"first_name": "", "last_name": ["Cruz"]}))
            .validate_changes()
            .unwrap_err();

        assert_eq!(
            errors.get(Field::FirstName).unwrap(),
            ["The first name field is required."]
        );
        assert_eq!(
            errors.get(Field::LastName).unwrap(),
            ["The last name field must be a string."]
        );
    }

    #[test]
    fn errors_serialise_with_wire_names() {
        let mut errors = FieldErrors::single(Field::StudentId, Rule::Unique);
        errors.add(Field::FirstName, Rule::Required);

        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({
                "student_id": ["The student id has already been taken."],
                "first_name": ["The first name field is required."],
            })
        );
    }

    #[test]
    fn absent_fields_are_left_out_when_sending() {
        let input = StudentInput {
            middle_name: FieldInput::text("Reyes"),
            ..StudentInput::default()
        };

        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({"middle_name": "Reyes"})
        );
    }
}

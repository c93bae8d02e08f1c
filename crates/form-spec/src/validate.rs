use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::{AnswerMap, AnswerValue};
use crate::path::resolve_path;
use crate::spec::{FieldDefinition, FieldType, FormSchema};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern"));

/// Outcome of checking one answer against its field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(String),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(reason) => Some(reason),
        }
    }
}

/// Which rule rejected an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Required,
    InvalidEmail,
    InvalidPhone,
}

impl Failure {
    pub fn message(&self) -> &'static str {
        match self {
            Failure::Required => "This field is required",
            Failure::InvalidEmail => "Please enter a valid email address",
            Failure::InvalidPhone => "Please enter a valid 10-digit phone number",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Failure::Required => "required",
            Failure::InvalidEmail => "invalid_email",
            Failure::InvalidPhone => "invalid_phone",
        }
    }
}

/// Checks `value` against `field`; the first failing rule wins.
pub fn validate(field: &FieldDefinition, value: Option<&AnswerValue>) -> ValidationResult {
    match check(field, value) {
        None => ValidationResult::Valid,
        Some(failure) => ValidationResult::Invalid(failure.message().to_string()),
    }
}

pub fn check(field: &FieldDefinition, value: Option<&AnswerValue>) -> Option<Failure> {
    if field.required && !satisfies_required(field, value) {
        return Some(Failure::Required);
    }

    let value = value.filter(|value| !value.is_blank())?;

    match field.kind {
        FieldType::Email if !EMAIL.is_match(&value.as_text()) => Some(Failure::InvalidEmail),
        FieldType::Tel if !PHONE.is_match(&value.as_text()) => Some(Failure::InvalidPhone),
        _ => None,
    }
}

fn satisfies_required(field: &FieldDefinition, value: Option<&AnswerValue>) -> bool {
    let Some(value) = value else {
        return false;
    };
    if field.kind == FieldType::Checkbox {
        return value.as_bool() == Some(true);
    }
    match value {
        AnswerValue::Text(text) => !text.trim().is_empty(),
        AnswerValue::Set(values) => !values.is_empty(),
        AnswerValue::Bool(_) => true,
    }
}

/// A single rejected answer inside a [`FormValidation`] report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationError {
    pub field_id: String,
    pub path: String,
    pub message: String,
    pub code: String,
}

/// Whole-response report used before accepting a stored or uploaded answer set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormValidation {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub missing_required: Vec<String>,
    pub unknown_fields: Vec<String>,
}

/// Validates every field on the path the answers actually take through the form.
///
/// Fields skipped by branching are never reported as missing.
pub fn validate_answers(schema: &FormSchema, answers: &AnswerMap) -> FormValidation {
    let path = resolve_path(schema, answers);

    let mut errors = Vec::new();
    let mut missing_required = Vec::new();

    for field in path.fields.iter().map(|&index| &schema.fields[index]) {
        match check(field, answers.get(&field.id)) {
            None => {}
            Some(Failure::Required) => missing_required.push(field.id.clone()),
            Some(failure) => errors.push(ValidationError {
                field_id: field.id.clone(),
                path: format!("/{}", field.id),
                message: failure.message().into(),
                code: failure.code().into(),
            }),
        }
    }

    let known: BTreeSet<_> = schema.fields.iter().map(|field| field.id.as_str()).collect();
    let unknown_fields: Vec<String> = answers
        .keys()
        .filter(|key| !known.contains(key.as_str()))
        .cloned()
        .collect();

    FormValidation {
        valid: errors.is_empty() && missing_required.is_empty() && unknown_fields.is_empty(),
        errors,
        missing_required,
        unknown_fields,
    }
}

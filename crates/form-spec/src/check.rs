use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::AnswerValue;
use crate::spec::{AnswerShape, FieldDefinition, FormSchema, RuleTarget};

/// Configuration problem found in a schema. Navigation tolerates all of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SchemaIssue {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    pub message: String,
}

impl SchemaIssue {
    fn new(code: &str, field: &FieldDefinition, message: String) -> Self {
        Self {
            code: code.into(),
            field_id: Some(field.id.clone()),
            message,
        }
    }
}

/// Lists every configuration problem in `schema`; an empty list means clean.
pub fn check_schema(schema: &FormSchema) -> Vec<SchemaIssue> {
    let mut issues = Vec::new();
    let mut seen = BTreeSet::new();

    for field in &schema.fields {
        if field.id.trim().is_empty() {
            issues.push(SchemaIssue {
                code: "empty_id".into(),
                field_id: None,
                message: format!("field '{}' has an empty id", field.title),
            });
        } else if !seen.insert(field.id.as_str()) {
            issues.push(SchemaIssue::new(
                "duplicate_id",
                field,
                format!("field id '{}' is used more than once", field.id),
            ));
        }

        check_options(field, &mut issues);
        check_default(field, &mut issues);
        check_dates(field, &mut issues);
        check_rules(schema, field, &mut issues);
    }

    issues
}

fn check_options(field: &FieldDefinition, issues: &mut Vec<SchemaIssue>) {
    if field.kind.has_options() && field.options.is_empty() {
        issues.push(SchemaIssue::new(
            "missing_options",
            field,
            format!("{} field '{}' has no options", field.kind, field.id),
        ));
    }

    let mut values = BTreeSet::new();
    for option in &field.options {
        if !values.insert(option.value.as_str()) {
            issues.push(SchemaIssue::new(
                "duplicate_option",
                field,
                format!("option value '{}' repeats in '{}'", option.value, field.id),
            ));
        }
    }

    if field.multi_select && field.kind != crate::spec::FieldType::Radio {
        issues.push(SchemaIssue::new(
            "multi_select_ignored",
            field,
            format!(
                "multiSelect only applies to radio fields; '{}' is {}",
                field.id, field.kind
            ),
        ));
    }
}

fn check_default(field: &FieldDefinition, issues: &mut Vec<SchemaIssue>) {
    let Some(default) = &field.default_value else {
        return;
    };
    let fits = matches!(
        (field.answer_shape(), default),
        (AnswerShape::Text, AnswerValue::Text(_))
            | (AnswerShape::Bool, AnswerValue::Bool(_))
            | (AnswerShape::Set, AnswerValue::Set(_))
    );
    if !fits {
        issues.push(SchemaIssue::new(
            "default_shape",
            field,
            format!(
                "default value of '{}' is a {} but the field answers with {:?}",
                field.id,
                default.type_name(),
                field.answer_shape()
            ),
        ));
    }
}

fn check_dates(field: &FieldDefinition, issues: &mut Vec<SchemaIssue>) {
    // ISO dates compare correctly as strings.
    if let (Some(min), Some(max)) = (&field.min_date, &field.max_date)
        && min > max
    {
        issues.push(SchemaIssue::new(
            "date_range",
            field,
            format!("minDate {} is after maxDate {} on '{}'", min, max, field.id),
        ));
    }
}

fn check_rules(schema: &FormSchema, field: &FieldDefinition, issues: &mut Vec<SchemaIssue>) {
    let Some(logic) = &field.logic else {
        return;
    };
    for rule in &logic.rules {
        match rule.target() {
            RuleTarget::Submit => {}
            RuleTarget::Unset => issues.push(SchemaIssue::new(
                "missing_target",
                field,
                format!("rule '{}' on '{}' has no target", rule.id, field.id),
            )),
            RuleTarget::Field(target) if target == field.id => issues.push(SchemaIssue::new(
                "self_target",
                field,
                format!("rule '{}' on '{}' jumps to its own field", rule.id, field.id),
            )),
            RuleTarget::Field(target) if schema.field(target).is_none() => {
                issues.push(SchemaIssue::new(
                    "dangling_target",
                    field,
                    format!(
                        "rule '{}' on '{}' targets unknown field '{}'",
                        rule.id, field.id, target
                    ),
                ))
            }
            RuleTarget::Field(_) => {}
        }
    }
}

use serde_json::{Map, Value, json};

use crate::spec::{AnswerShape, FieldDefinition, FieldType, FormSchema};

pub const BRANCHING_NOTE: &str = "Conditional rules can skip fields; a required field \
     only needs an answer when the respondent's path visits it.";

/// JSON Schema describing the answer map a flow for `schema` produces.
///
/// `required` lists every required field. When the form branches, answers
/// validated with [`crate::validate_answers`] may omit skipped fields, and the
/// schema says so in its `description`.
pub fn generate(schema: &FormSchema) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in &schema.fields {
        properties.insert(field.id.clone(), field_schema(field));
        if field.required {
            required.push(Value::String(field.id.clone()));
        }
    }

    let mut root = Map::new();
    root.insert(
        "$schema".into(),
        Value::String("https://json-schema.org/draft/2020-12/schema".into()),
    );
    if let Some(title) = &schema.title {
        root.insert("title".into(), Value::String(title.clone()));
    }
    if has_branching(schema) {
        root.insert("description".into(), Value::String(BRANCHING_NOTE.into()));
    }
    root.insert("type".into(), Value::String("object".into()));
    root.insert("properties".into(), Value::Object(properties));
    root.insert("required".into(), Value::Array(required));
    root.insert("additionalProperties".into(), Value::Bool(false));
    Value::Object(root)
}

pub fn has_branching(schema: &FormSchema) -> bool {
    schema
        .fields
        .iter()
        .any(|field| field.logic.as_ref().is_some_and(|logic| !logic.rules.is_empty()))
}

fn field_schema(field: &FieldDefinition) -> Value {
    let mut map = Map::new();
    map.insert("title".into(), Value::String(field.title.clone()));
    if let Some(subtitle) = &field.subtitle {
        map.insert("description".into(), Value::String(subtitle.clone()));
    }

    let option_values = field
        .options
        .iter()
        .map(|option| Value::String(option.value.clone()))
        .collect::<Vec<_>>();

    match field.answer_shape() {
        AnswerShape::Bool => {
            map.insert("type".into(), Value::String("boolean".into()));
            if field.required {
                map.insert("const".into(), Value::Bool(true));
            }
        }
        AnswerShape::Set => {
            map.insert("type".into(), Value::String("array".into()));
            map.insert("uniqueItems".into(), Value::Bool(true));
            let mut items = json!({ "type": "string" });
            if !option_values.is_empty() {
                items["enum"] = Value::Array(option_values);
            }
            map.insert("items".into(), items);
        }
        AnswerShape::Text => {
            map.insert("type".into(), Value::String("string".into()));
            if field.kind.has_options() && !option_values.is_empty() {
                map.insert("enum".into(), Value::Array(option_values));
            }
            if let Some(max_length) = field.max_length {
                map.insert("maxLength".into(), Value::from(max_length));
            }
            match field.kind {
                FieldType::Email => {
                    map.insert("format".into(), Value::String("email".into()));
                }
                FieldType::Tel => {
                    map.insert("pattern".into(), Value::String("^[0-9]{10}$".into()));
                }
                FieldType::Date => {
                    map.insert("format".into(), Value::String("date".into()));
                }
                FieldType::Number => {
                    map.insert("pattern".into(), Value::String(r"^-?\d+(\.\d+)?$".into()));
                }
                _ => {}
            }
        }
    }

    Value::Object(map)
}

/// A plausible valid answer map, used to seed docs and fixtures.
pub fn example_answers(schema: &FormSchema) -> Value {
    let mut map = Map::new();
    for field in &schema.fields {
        map.insert(field.id.clone(), example_value(field));
    }
    Value::Object(map)
}

fn example_value(field: &FieldDefinition) -> Value {
    let first_option = field.options.first().map(|option| option.value.clone());
    match field.answer_shape() {
        AnswerShape::Bool => Value::Bool(true),
        AnswerShape::Set => Value::Array(first_option.map(Value::String).into_iter().collect()),
        AnswerShape::Text => Value::String(match field.kind {
            FieldType::Email => "name@example.com".into(),
            FieldType::Tel => "5551234567".into(),
            FieldType::Number => "42".into(),
            FieldType::Date => field
                .min_date
                .clone()
                .unwrap_or_else(|| "2024-01-01".into()),
            FieldType::File => "upload.pdf".into(),
            FieldType::Radio | FieldType::Select => {
                first_option.unwrap_or_else(|| format!("example-{}", field.id))
            }
            _ => format!("example-{}", field.id),
        }),
    }
}

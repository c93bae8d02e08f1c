use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::{FieldDefinition, FormSchema};

/// A respondent-supplied value, shaped by the field it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Text(String),
    Set(Vec<String>),
}

impl AnswerValue {
    pub fn text(value: impl Into<String>) -> Self {
        AnswerValue::Text(value.into())
    }

    pub fn set<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AnswerValue::Set(values.into_iter().map(Into::into).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnswerValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&[String]> {
        match self {
            AnswerValue::Set(values) => Some(values),
            _ => None,
        }
    }

    /// Loose stringification used when comparing against rule values.
    pub fn as_text(&self) -> String {
        match self {
            AnswerValue::Text(text) => text.clone(),
            AnswerValue::Bool(flag) => flag.to_string(),
            AnswerValue::Set(values) => values.join(","),
        }
    }

    /// True for `""`, `false`, and the empty set.
    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Text(text) => text.is_empty(),
            AnswerValue::Bool(flag) => !flag,
            AnswerValue::Set(values) => values.is_empty(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AnswerValue::Text(_) => "text",
            AnswerValue::Bool(_) => "boolean",
            AnswerValue::Set(_) => "set",
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Text(value)
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        AnswerValue::Bool(value)
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(values: Vec<String>) -> Self {
        AnswerValue::Set(values)
    }
}

/// Field id to answer for one flow session.
pub type AnswerMap = BTreeMap<String, AnswerValue>;

/// Builds the initial answer map from each field's `defaultValue`.
pub fn seed_answers(fields: &[FieldDefinition]) -> AnswerMap {
    fields
        .iter()
        .filter_map(|field| {
            field
                .default_value
                .clone()
                .map(|value| (field.id.clone(), value))
        })
        .collect()
}

/// Completed response handed to the submission collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
    pub answers: AnswerMap,
    pub submitted_at: u64,
}

impl Submission {
    pub fn new(form_id: Option<String>, answers: AnswerMap) -> Self {
        let submitted_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default();
        Self {
            form_id,
            answers,
            submitted_at,
        }
    }

    /// Re-keys answers by field title, the way stored responses are labelled.
    ///
    /// Answers for unknown ids and fields without a title keep their id.
    pub fn keyed_by_title(&self, schema: &FormSchema) -> BTreeMap<String, AnswerValue> {
        self.answers
            .iter()
            .map(|(id, value)| {
                let label = schema
                    .field(id)
                    .map(|field| field.title.trim())
                    .filter(|title| !title.is_empty())
                    .unwrap_or(id.as_str());
                (label.to_string(), value.clone())
            })
            .collect()
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::AnswerValue;
use crate::spec::logic::FieldLogic;

/// Closed set of input kinds a field can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Email,
    Tel,
    Textarea,
    Radio,
    Checkbox,
    Select,
    Date,
    File,
}

impl FieldType {
    pub const ALL: [FieldType; 10] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Email,
        FieldType::Tel,
        FieldType::Textarea,
        FieldType::Radio,
        FieldType::Checkbox,
        FieldType::Select,
        FieldType::Date,
        FieldType::File,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Email => "email",
            FieldType::Tel => "tel",
            FieldType::Textarea => "textarea",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Select => "select",
            FieldType::Date => "date",
            FieldType::File => "file",
        }
    }

    /// Whether the field picks from a list of options.
    pub fn has_options(&self) -> bool {
        matches!(self, FieldType::Radio | FieldType::Select)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        FieldType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unknown field type '{}'", value))
    }
}

/// One selectable option of a radio or select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

impl FieldOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Shape of the answer a field produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerShape {
    Text,
    Bool,
    Set,
}

/// One question/input in a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub multi_select: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<AnswerValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic: Option<FieldLogic>,
}

impl FieldDefinition {
    pub fn new(id: impl Into<String>, kind: FieldType, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            subtitle: None,
            placeholder: None,
            required: false,
            max_length: None,
            options: Vec::new(),
            multi_select: false,
            min_date: None,
            max_date: None,
            default_value: None,
            logic: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options<I, L, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (L, V)>,
        L: Into<String>,
        V: Into<String>,
    {
        self.options = options
            .into_iter()
            .map(|(label, value)| FieldOption::new(label, value))
            .collect();
        self
    }

    pub fn with_logic(mut self, logic: FieldLogic) -> Self {
        self.logic = Some(logic);
        self
    }

    /// The answer shape is derived from the type; only radio honours `multiSelect`.
    pub fn answer_shape(&self) -> AnswerShape {
        match self.kind {
            FieldType::Checkbox => AnswerShape::Bool,
            FieldType::Radio if self.multi_select => AnswerShape::Set,
            _ => AnswerShape::Text,
        }
    }

    pub fn has_rules(&self) -> bool {
        self.logic
            .as_ref()
            .map(|logic| !logic.rules.is_empty())
            .unwrap_or(false)
    }

    pub fn option(&self, value: &str) -> Option<&FieldOption> {
        self.options.iter().find(|option| option.value == value)
    }
}

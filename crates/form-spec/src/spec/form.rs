use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::field::FieldDefinition;

/// Intro screen shown before the first field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeScreenConfig {
    #[serde(default = "default_welcome_title")]
    pub title: String,
    #[serde(default = "default_welcome_description")]
    pub description: String,
    #[serde(default = "default_button_text")]
    pub button_text: String,
}

impl Default for WelcomeScreenConfig {
    fn default() -> Self {
        Self {
            title: default_welcome_title(),
            description: default_welcome_description(),
            button_text: default_button_text(),
        }
    }
}

fn default_welcome_title() -> String {
    "Welcome!".into()
}

fn default_welcome_description() -> String {
    "Let's get to know you better. This will only take a few minutes.".into()
}

fn default_button_text() -> String {
    "Start".into()
}

/// Closing screen shown once the response was submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ThankYouScreenConfig {
    #[serde(default = "default_thank_you_title")]
    pub title: String,
    #[serde(default = "default_thank_you_description")]
    pub description: String,
    #[serde(default = "default_emoji")]
    pub emoji: String,
}

impl Default for ThankYouScreenConfig {
    fn default() -> Self {
        Self {
            title: default_thank_you_title(),
            description: default_thank_you_description(),
            emoji: default_emoji(),
        }
    }
}

fn default_thank_you_title() -> String {
    "Thank you!".into()
}

fn default_thank_you_description() -> String {
    "Your response has been submitted successfully. We'll be in touch soon.".into()
}

fn default_emoji() -> String {
    "🎉".into()
}

/// Runtime knobs carried with the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlowSettings {
    #[serde(default = "default_true")]
    pub seed_defaults: bool,
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            seed_defaults: true,
            show_progress: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Top-level form document produced by the builder.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub welcome_screen: WelcomeScreenConfig,
    #[serde(default)]
    pub thank_you_screen: ThankYouScreenConfig,
    #[serde(default)]
    pub settings: FlowSettings,
}

impl FormSchema {
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.id == id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

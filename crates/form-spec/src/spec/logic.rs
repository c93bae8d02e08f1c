use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Sentinel rule target that ends the flow and submits.
pub const SUBMIT_TARGET: &str = "SUBMIT";

/// Comparison applied between the field's answer and a rule value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RuleOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
}

impl RuleOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleOperator::Equals => "equals",
            RuleOperator::NotEquals => "not_equals",
            RuleOperator::Contains => "contains",
            RuleOperator::NotContains => "not_contains",
        }
    }

    pub fn is_negated(&self) -> bool {
        matches!(self, RuleOperator::NotEquals | RuleOperator::NotContains)
    }
}

impl fmt::Display for RuleOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RuleOperator {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "equals" | "eq" => Ok(RuleOperator::Equals),
            "not_equals" | "ne" => Ok(RuleOperator::NotEquals),
            "contains" => Ok(RuleOperator::Contains),
            "not_contains" => Ok(RuleOperator::NotContains),
            _ => Err(format!("unknown rule operator '{}'", value)),
        }
    }
}

/// Where a matching rule sends the respondent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTarget<'a> {
    Submit,
    Field(&'a str),
    Unset,
}

/// A single branching condition attached to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalRule {
    pub id: String,
    pub operator: RuleOperator,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub target_field_id: String,
}

impl ConditionalRule {
    pub fn new(
        id: impl Into<String>,
        operator: RuleOperator,
        value: impl Into<String>,
        target_field_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            operator,
            value: value.into(),
            target_field_id: target_field_id.into(),
        }
    }

    pub fn target(&self) -> RuleTarget<'_> {
        match self.target_field_id.trim() {
            "" => RuleTarget::Unset,
            SUBMIT_TARGET => RuleTarget::Submit,
            _ => RuleTarget::Field(self.target_field_id.as_str()),
        }
    }
}

/// Ordered rules; the first match wins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FieldLogic {
    #[serde(default)]
    pub rules: Vec<ConditionalRule>,
}

impl FieldLogic {
    pub fn new(rules: Vec<ConditionalRule>) -> Self {
        Self { rules }
    }
}

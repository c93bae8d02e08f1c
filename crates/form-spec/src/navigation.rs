use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::answers::{AnswerMap, AnswerValue};
use crate::spec::{AnswerShape, ConditionalRule, FieldDefinition, RuleOperator, RuleTarget};

/// A step the respondent can stand on: the welcome screen or a field.
///
/// Serialized as its step index, `-1` for welcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "isize", try_from = "isize")]
pub enum Position {
    Welcome,
    Field(usize),
}

impl Position {
    pub fn index(&self) -> isize {
        match self {
            Position::Welcome => -1,
            Position::Field(index) => *index as isize,
        }
    }
}

impl From<Position> for isize {
    fn from(position: Position) -> Self {
        position.index()
    }
}

impl TryFrom<isize> for Position {
    type Error = String;

    fn try_from(index: isize) -> Result<Self, Self::Error> {
        match index {
            -1 => Ok(Position::Welcome),
            index if index >= 0 => Ok(Position::Field(index as usize)),
            other => Err(format!("step index {} is before the welcome screen", other)),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Welcome => f.write_str("welcome"),
            Position::Field(index) => write!(f, "field #{}", index),
        }
    }
}

/// Where a forward move lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Field(usize),
    Submit,
}

/// Computes the step after `current`, honouring the current field's rules.
///
/// Rules are evaluated in order and the first match wins. A match whose
/// target cannot be resolved degrades to linear advancement.
pub fn next_step(current: Position, fields: &[FieldDefinition], answers: &AnswerMap) -> NextStep {
    let index = match current {
        Position::Welcome => return linear(0, fields.len()),
        Position::Field(index) => index,
    };
    let Some(field) = fields.get(index) else {
        return NextStep::Submit;
    };

    if let Some(rule) = matching_rule(field, answers.get(&field.id)) {
        match rule.target() {
            RuleTarget::Submit => {
                debug!(field = %field.id, rule = %rule.id, "rule matched, jumping to submit");
                return NextStep::Submit;
            }
            RuleTarget::Field(target) => {
                if let Some(position) = fields.iter().position(|candidate| candidate.id == target) {
                    debug!(field = %field.id, rule = %rule.id, target_id = target, "rule matched");
                    return NextStep::Field(position);
                }
                warn!(
                    field = %field.id,
                    rule = %rule.id,
                    target_id = target,
                    "rule targets an unknown field; advancing linearly"
                );
            }
            RuleTarget::Unset => {
                warn!(field = %field.id, rule = %rule.id, "rule has no target; advancing linearly");
            }
        }
    }

    linear(index + 1, fields.len())
}

fn linear(candidate: usize, len: usize) -> NextStep {
    if candidate < len {
        NextStep::Field(candidate)
    } else {
        NextStep::Submit
    }
}

/// Back navigation pops the visited history; it never re-runs branching.
pub fn previous_step(history: &[Position]) -> Option<Position> {
    history.last().copied()
}

/// First rule of `field` whose test passes against `answer`.
pub fn matching_rule<'a>(
    field: &'a FieldDefinition,
    answer: Option<&AnswerValue>,
) -> Option<&'a ConditionalRule> {
    field
        .logic
        .as_ref()?
        .rules
        .iter()
        .find(|rule| rule_matches(rule, field, answer))
}

/// Tests one rule. Comparison dispatches on the field's declared answer shape.
///
/// An unanswered field only satisfies the negated operators.
pub fn rule_matches(
    rule: &ConditionalRule,
    field: &FieldDefinition,
    answer: Option<&AnswerValue>,
) -> bool {
    let Some(answer) = answer else {
        return rule.operator.is_negated();
    };
    let shaped = Shaped::from_answer(field.answer_shape(), answer);
    match rule.operator {
        RuleOperator::Equals => shaped.equals(&rule.value),
        RuleOperator::NotEquals => !shaped.equals(&rule.value),
        RuleOperator::Contains => shaped.contains(&rule.value),
        RuleOperator::NotContains => !shaped.contains(&rule.value),
    }
}

enum Shaped<'a> {
    Text(&'a str),
    Bool(bool),
    Set(Vec<&'a str>),
}

impl<'a> Shaped<'a> {
    fn from_answer(shape: AnswerShape, answer: &'a AnswerValue) -> Self {
        match (shape, answer) {
            (AnswerShape::Set, AnswerValue::Set(values)) => {
                Shaped::Set(values.iter().map(String::as_str).collect())
            }
            (AnswerShape::Set, AnswerValue::Text(text)) if text.is_empty() => Shaped::Set(vec![]),
            (AnswerShape::Set, AnswerValue::Text(text)) => Shaped::Set(vec![text.as_str()]),
            (_, AnswerValue::Bool(flag)) => Shaped::Bool(*flag),
            (AnswerShape::Bool, AnswerValue::Text(text)) => Shaped::Bool(text == "true"),
            (_, AnswerValue::Text(text)) => Shaped::Text(text),
            // A set stored for a scalar field compares by its comma-joined form.
            (_, AnswerValue::Set(values)) => {
                Shaped::Set(values.iter().map(String::as_str).collect())
            }
        }
    }

    fn equals(&self, expected: &str) -> bool {
        match self {
            Shaped::Text(text) => *text == expected,
            Shaped::Bool(flag) => bool_text(*flag) == expected,
            // Loose coercion: a multi-select equals the comma-joined selection.
            Shaped::Set(values) => values.join(",") == expected,
        }
    }

    fn contains(&self, needle: &str) -> bool {
        match self {
            Shaped::Text(text) => text.contains(needle),
            Shaped::Bool(flag) => bool_text(*flag).contains(needle),
            Shaped::Set(values) => values.contains(&needle),
        }
    }
}

fn bool_text(flag: bool) -> &'static str {
    if flag { "true" } else { "false" }
}

use std::collections::BTreeSet;

use crate::answers::AnswerMap;
use crate::navigation::{NextStep, Position, next_step};
use crate::spec::FormSchema;

/// Fields a respondent with the given answers walks through, in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedPath {
    pub fields: Vec<usize>,
    /// Set when a rule jumped back onto an already visited field.
    pub terminated_by_cycle: bool,
}

impl ResolvedPath {
    pub fn contains(&self, index: usize) -> bool {
        self.fields.contains(&index)
    }

    pub fn field_ids<'a>(&self, schema: &'a FormSchema) -> Vec<&'a str> {
        self.fields
            .iter()
            .map(|&index| schema.fields[index].id.as_str())
            .collect()
    }
}

/// Replays navigation from the welcome screen until submit or a revisit.
pub fn resolve_path(schema: &FormSchema, answers: &AnswerMap) -> ResolvedPath {
    let mut path = ResolvedPath::default();
    let mut seen = BTreeSet::new();
    let mut position = Position::Welcome;

    loop {
        match next_step(position, &schema.fields, answers) {
            NextStep::Submit => break,
            NextStep::Field(index) => {
                if !seen.insert(index) {
                    path.terminated_by_cycle = true;
                    break;
                }
                path.fields.push(index);
                position = Position::Field(index);
            }
        }
    }

    path
}

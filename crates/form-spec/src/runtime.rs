use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::answers::{AnswerMap, AnswerValue, Submission, seed_answers};
use crate::navigation::{NextStep, Position, next_step, previous_step};
use crate::spec::{FieldDefinition, FormSchema};
use crate::validate::{ValidationResult, validate};

/// Failure reported by the submission collaborator; the flow stays retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("submission failed: {message}")]
pub struct SubmissionError {
    pub message: String,
}

impl SubmissionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Receives the completed response exactly once per successful flow.
pub trait Submitter {
    fn submit(&mut self, submission: &Submission) -> Result<(), SubmissionError>;
}

impl<F> Submitter for F
where
    F: FnMut(&Submission) -> Result<(), SubmissionError>,
{
    fn submit(&mut self, submission: &Submission) -> Result<(), SubmissionError> {
        self(submission)
    }
}

/// Rejected snapshot passed to [`FlowRuntime::from_state`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("step index {index} is outside -1..={len}")]
    IndexOutOfRange { index: isize, len: usize },
    #[error("submitted flag does not match step index {index}")]
    SubmittedMismatch { index: isize },
    #[error("history entry {0} does not name a step of this form")]
    HistoryOutOfRange(isize),
    #[error("pending transition targets step {0} which does not exist")]
    PendingOutOfRange(isize),
    #[error("a submitted flow cannot carry a pending transition")]
    PendingAfterSubmit,
    #[error("pending retreat to step {0} is not the last history entry")]
    RetreatNotInHistory(isize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// State-machine view of the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Intro,
    Question(usize),
    Submitted,
}

/// A transition that was accepted but not yet committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingTransition {
    Advance { to: Position },
    Submit,
    Retreat { to: Position },
}

/// Everything the runtime mutates. Serializable so a host can park a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeState {
    pub current_step_index: isize,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub answers: AnswerMap,
    #[serde(default)]
    pub submitted: bool,
    #[serde(default)]
    pub history: Vec<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingTransition>,
}

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Committed move onto a new step.
    Moved(Step),
    /// Validation failed; the step is unchanged and the reason is displayed.
    Blocked(String),
    /// Accepted and locked until [`FlowRuntime::complete`] runs.
    Pending,
    /// The flow reached its terminal state and the collaborator accepted the response.
    Submitted(Submission),
    /// Nothing to do: a transition is in flight, history is empty, or the flow is over.
    Ignored,
}

/// Single-writer controller for one conversational flow session.
#[derive(Debug, Clone)]
pub struct FlowRuntime {
    schema: FormSchema,
    state: RuntimeState,
}

impl FlowRuntime {
    /// Starts at the welcome screen with answers seeded from field defaults.
    pub fn new(schema: FormSchema) -> Self {
        let answers = if schema.settings.seed_defaults {
            seed_answers(&schema.fields)
        } else {
            AnswerMap::new()
        };
        Self {
            schema,
            state: RuntimeState {
                current_step_index: -1,
                direction: Direction::Forward,
                answers,
                submitted: false,
                history: Vec::new(),
                current_error: None,
                pending: None,
            },
        }
    }

    /// Starts a session with `answers` layered over the seeded defaults.
    pub fn with_answers(schema: FormSchema, answers: AnswerMap) -> Self {
        let mut runtime = Self::new(schema);
        runtime.state.answers.extend(answers);
        runtime
    }

    /// Resumes a parked session after checking it fits the schema.
    pub fn from_state(schema: FormSchema, state: RuntimeState) -> Result<Self, StateError> {
        let len = schema.fields.len();
        let index = state.current_step_index;
        if index < -1 || index > len as isize {
            return Err(StateError::IndexOutOfRange { index, len });
        }
        if state.submitted != (index == len as isize) {
            return Err(StateError::SubmittedMismatch { index });
        }
        if let Some(entry) = state
            .history
            .iter()
            .find(|position| !Self::position_in_range(**position, len))
        {
            return Err(StateError::HistoryOutOfRange(entry.index()));
        }
        match state.pending {
            Some(PendingTransition::Advance { to }) | Some(PendingTransition::Retreat { to })
                if !Self::position_in_range(to, len) =>
            {
                return Err(StateError::PendingOutOfRange(to.index()));
            }
            Some(PendingTransition::Retreat { to }) if state.history.last() != Some(&to) => {
                return Err(StateError::RetreatNotInHistory(to.index()));
            }
            Some(_) if state.submitted => return Err(StateError::PendingAfterSubmit),
            _ => {}
        }
        Ok(Self { schema, state })
    }

    fn position_in_range(position: Position, len: usize) -> bool {
        match position {
            Position::Welcome => true,
            Position::Field(index) => index < len,
        }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn state(&self) -> &RuntimeState {
        &self.state
    }

    pub fn into_state(self) -> RuntimeState {
        self.state
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.state.answers
    }

    pub fn current_error(&self) -> Option<&str> {
        self.state.current_error.as_deref()
    }

    /// Step index as presented: `-1` welcome, `fields.len()` once submitted.
    pub fn current_step_index(&self) -> isize {
        self.state.current_step_index
    }

    pub fn direction(&self) -> Direction {
        self.state.direction
    }

    pub fn step(&self) -> Step {
        if self.state.submitted {
            return Step::Submitted;
        }
        match self.position() {
            Position::Welcome => Step::Intro,
            Position::Field(index) => Step::Question(index),
        }
    }

    fn position(&self) -> Position {
        Position::try_from(self.state.current_step_index).unwrap_or(Position::Welcome)
    }

    pub fn current_field(&self) -> Option<&FieldDefinition> {
        match self.step() {
            Step::Question(index) => self.schema.fields.get(index),
            _ => None,
        }
    }

    pub fn current_answer(&self) -> Option<&AnswerValue> {
        self.current_field()
            .and_then(|field| self.state.answers.get(&field.id))
    }

    /// True while an accepted transition awaits [`FlowRuntime::complete`].
    pub fn is_transitioning(&self) -> bool {
        self.state.pending.is_some()
    }

    pub fn is_submitted(&self) -> bool {
        self.state.submitted
    }

    pub fn can_go_back(&self) -> bool {
        !self.state.submitted && self.state.pending.is_none() && !self.state.history.is_empty()
    }

    /// One-based position among the fields and the field count.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.schema.fields.len();
        match self.step() {
            Step::Intro => (0, total),
            Step::Question(index) => (index + 1, total),
            Step::Submitted => (total, total),
        }
    }

    /// Records an answer for the displayed field.
    ///
    /// Returns `false` and leaves the answers untouched when `field_id` is not
    /// the displayed field or a transition is in flight.
    pub fn set_answer(&mut self, field_id: &str, value: impl Into<AnswerValue>) -> bool {
        if self.state.pending.is_some() {
            debug!(field_id, "answer ignored while a transition is in flight");
            return false;
        }
        let displayed = match self.current_field() {
            Some(field) if field.id == field_id => true,
            _ => false,
        };
        if !displayed {
            debug!(field_id, "answer ignored for a field that is not displayed");
            return false;
        }
        self.state.answers.insert(field_id.to_string(), value.into());
        self.state.current_error = None;
        true
    }

    /// Validates the displayed field and locks the forward move.
    pub fn begin_advance(&mut self) -> Transition {
        if self.state.submitted || self.state.pending.is_some() {
            return Transition::Ignored;
        }

        let position = self.position();
        if let Position::Field(index) = position {
            let field = &self.schema.fields[index];
            if let ValidationResult::Invalid(reason) =
                validate(field, self.state.answers.get(&field.id))
            {
                debug!(field = %field.id, %reason, "advance blocked");
                self.state.current_error = Some(reason.clone());
                return Transition::Blocked(reason);
            }
        }

        self.state.current_error = None;
        self.state.direction = Direction::Forward;
        self.state.pending = Some(
            match next_step(position, &self.schema.fields, &self.state.answers) {
                NextStep::Field(index) => PendingTransition::Advance {
                    to: Position::Field(index),
                },
                NextStep::Submit => PendingTransition::Submit,
            },
        );
        Transition::Pending
    }

    /// Locks a move back to the last visited step. Never blocked by validation.
    pub fn begin_retreat(&mut self) -> Transition {
        if self.state.submitted || self.state.pending.is_some() {
            return Transition::Ignored;
        }
        let Some(to) = previous_step(&self.state.history) else {
            return Transition::Ignored;
        };
        self.state.direction = Direction::Backward;
        self.state.pending = Some(PendingTransition::Retreat { to });
        Transition::Pending
    }

    /// Commits the in-flight transition, submitting when it targets the end.
    ///
    /// A failed submission unlocks the runtime on the same step so the
    /// respondent can retry.
    pub fn complete<S>(&mut self, submitter: &mut S) -> Result<Transition, SubmissionError>
    where
        S: Submitter + ?Sized,
    {
        let Some(pending) = self.state.pending.take() else {
            return Ok(Transition::Ignored);
        };
        let from = self.position();

        match pending {
            PendingTransition::Advance { to } => {
                self.state.history.push(from);
                Ok(self.enter(to))
            }
            PendingTransition::Retreat { to } => {
                self.state.history.pop();
                Ok(self.enter(to))
            }
            PendingTransition::Submit => {
                let submission =
                    Submission::new(self.schema.id.clone(), self.state.answers.clone());
                if let Err(err) = submitter.submit(&submission) {
                    warn!(error = %err, step = %from, "submission rejected; staying on step");
                    return Err(err);
                }
                self.state.history.push(from);
                self.state.submitted = true;
                self.state.current_step_index = self.schema.fields.len() as isize;
                self.state.current_error = None;
                info!(answers = submission.answers.len(), "flow submitted");
                Ok(Transition::Submitted(submission))
            }
        }
    }

    fn enter(&mut self, to: Position) -> Transition {
        debug!(from = self.state.current_step_index, to = to.index(), "step transition");
        self.state.current_step_index = to.index();
        self.state.current_error = None;
        Transition::Moved(self.step())
    }

    /// Validates, navigates, and commits in one call.
    pub fn advance<S>(&mut self, submitter: &mut S) -> Result<Transition, SubmissionError>
    where
        S: Submitter + ?Sized,
    {
        match self.begin_advance() {
            Transition::Pending => self.complete(submitter),
            other => Ok(other),
        }
    }

    /// Moves back to the previously visited step in one call.
    pub fn retreat(&mut self) -> Transition {
        match self.begin_retreat() {
            Transition::Pending => self.commit_retreat(),
            other => other,
        }
    }

    fn commit_retreat(&mut self) -> Transition {
        match self.state.pending.take() {
            Some(PendingTransition::Retreat { to }) => {
                self.state.history.pop();
                self.enter(to)
            }
            other => {
                self.state.pending = other;
                Transition::Ignored
            }
        }
    }
}

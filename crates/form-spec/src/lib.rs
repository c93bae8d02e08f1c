#![allow(missing_docs)]

pub mod answers;
pub mod answers_schema;
pub mod builder;
pub mod check;
pub mod ids;
pub mod navigation;
pub mod path;
pub mod render;
pub mod runtime;
pub mod spec;
pub mod validate;

pub use answers::{AnswerMap, AnswerValue, Submission, seed_answers};
pub use answers_schema::{
    BRANCHING_NOTE, example_answers, generate as answers_schema, has_branching,
};
pub use builder::{BuildError, FormBuilder, template};
pub use check::{SchemaIssue, check_schema};
pub use ids::{new_field_id, new_rule_id};
pub use navigation::{NextStep, Position, matching_rule, next_step, previous_step, rule_matches};
pub use path::{ResolvedPath, resolve_path};
pub use render::{
    RenderField, RenderProgress, ScreenKind, StepPayload, build_step_payload, render_json_ui,
    render_text,
};
pub use runtime::{
    Direction, FlowRuntime, PendingTransition, RuntimeState, StateError, Step, SubmissionError,
    Submitter, Transition,
};
pub use spec::{
    AnswerShape, ConditionalRule, FieldDefinition, FieldLogic, FieldOption, FieldType,
    FlowSettings, FormSchema, RuleOperator, RuleTarget, SUBMIT_TARGET, ThankYouScreenConfig,
    WelcomeScreenConfig,
};
pub use validate::{FormValidation, ValidationError, ValidationResult, validate, validate_answers};

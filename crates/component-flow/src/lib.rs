use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

use form_spec::{
    AnswerMap, AnswerValue, FlowRuntime, FormSchema, RuntimeState, StateError, Step, Submission,
    SubmissionError, Transition, answers_schema, build_step_payload, check_schema,
    example_answers, render_json_ui as flow_render_json_ui, render_text as flow_render_text,
    validate_answers as flow_validate_answers,
};

const DEFAULT_SCHEMA: &str = include_str!("../../form-spec/tests/fixtures/contact_flow.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config/{0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("failed to parse state: {0}")]
    StateParse(#[source] serde_json::Error),
    #[error("failed to parse answers: {0}")]
    AnswersParse(#[source] serde_json::Error),
    #[error("form '{0}' is not available")]
    FormUnavailable(String),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error("state does not fit the form: {0}")]
    State(#[from] StateError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    form_schema_json: Option<String>,
}

fn load_form_schema(config_json: &str) -> Result<FormSchema, ComponentError> {
    let config = if config_json.trim().is_empty() {
        ComponentConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)?
    };

    let schema_json = config
        .form_schema_json
        .as_deref()
        .unwrap_or(DEFAULT_SCHEMA);

    serde_json::from_str(schema_json).map_err(ComponentError::ConfigParse)
}

/// Loads the configured schema; a schema without an id answers to any form id.
fn ensure_form(form_id: &str, config_json: &str) -> Result<FormSchema, ComponentError> {
    let schema = load_form_schema(config_json)?;
    match schema.id.as_deref() {
        Some(id) if id != form_id => Err(ComponentError::FormUnavailable(form_id.to_string())),
        _ => Ok(schema),
    }
}

fn parse_answers(answers_json: &str) -> Result<AnswerMap, ComponentError> {
    if answers_json.trim().is_empty() {
        return Ok(AnswerMap::new());
    }
    serde_json::from_str(answers_json).map_err(ComponentError::AnswersParse)
}

/// Restores a parked session, or starts a fresh one when no state is given.
fn resume(schema: FormSchema, state_json: &str) -> Result<FlowRuntime, ComponentError> {
    if state_json.trim().is_empty() {
        return Ok(FlowRuntime::new(schema));
    }
    let state: RuntimeState =
        serde_json::from_str(state_json).map_err(ComponentError::StateParse)?;
    Ok(FlowRuntime::from_state(schema, state)?)
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn session_response(runtime: &FlowRuntime, status: &str) -> Result<Value, ComponentError> {
    let state = serde_json::to_value(runtime.state()).map_err(ComponentError::JsonEncode)?;
    let mut response = Map::new();
    response.insert("status".into(), Value::String(status.into()));
    response.insert("state".into(), state);
    response.insert(
        "view".into(),
        flow_render_json_ui(&build_step_payload(runtime)),
    );
    Ok(Value::Object(response))
}

fn transition_status(transition: &Transition) -> &'static str {
    match transition {
        Transition::Moved(_) => "moved",
        Transition::Blocked(_) => "blocked",
        Transition::Pending => "pending",
        Transition::Submitted(_) => "submitted",
        Transition::Ignored => "ignored",
    }
}

pub fn describe(form_id: &str, config_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|schema| {
        serde_json::to_value(schema).map_err(ComponentError::JsonEncode)
    }))
}

pub fn check(form_id: &str, config_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|schema| {
        let issues = check_schema(&schema);
        let issues_value = serde_json::to_value(&issues).map_err(ComponentError::JsonEncode)?;
        Ok(json!({
            "valid": issues.is_empty(),
            "issues": issues_value,
        }))
    }))
}

pub fn get_answer_schema(form_id: &str, config_json: &str) -> String {
    respond(ensure_form(form_id, config_json).map(|schema| answers_schema(&schema)))
}

pub fn get_example_answers(form_id: &str, config_json: &str) -> String {
    respond(ensure_form(form_id, config_json).map(|schema| example_answers(&schema)))
}

pub fn validate_answers(form_id: &str, config_json: &str, answers_json: &str) -> String {
    let validation = ensure_form(form_id, config_json).and_then(|schema| {
        let answers = parse_answers(answers_json)?;
        serde_json::to_value(flow_validate_answers(&schema, &answers))
            .map_err(ComponentError::JsonEncode)
    });
    respond(validation)
}

/// Opens a session on the welcome screen, optionally prefilled with answers.
pub fn start(form_id: &str, config_json: &str, answers_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|schema| {
        let answers = parse_answers(answers_json)?;
        let runtime = FlowRuntime::with_answers(schema, answers);
        session_response(&runtime, "started")
    }))
}

/// Records an answer for the displayed field. `accepted` is false when the
/// field is not on screen.
pub fn patch_answer(
    form_id: &str,
    config_json: &str,
    state_json: &str,
    field_id: &str,
    value_json: &str,
) -> String {
    respond(ensure_form(form_id, config_json).and_then(|schema| {
        let mut runtime = resume(schema, state_json)?;
        let value: AnswerValue =
            serde_json::from_str(value_json).map_err(ComponentError::AnswersParse)?;
        let accepted = runtime.set_answer(field_id, value);
        let status = if accepted { "patched" } else { "ignored" };
        let mut response = session_response(&runtime, status)?;
        response["accepted"] = Value::Bool(accepted);
        Ok(response)
    }))
}

/// Builds the session response for a transition, attaching the `submission`
/// the host must deliver when the flow completed.
fn transition_response(
    runtime: &FlowRuntime,
    transition: &Transition,
    handed_over: Option<Submission>,
) -> Result<Value, ComponentError> {
    let mut response = session_response(runtime, transition_status(transition))?;
    if let Transition::Blocked(reason) = transition {
        response["reason"] = Value::String(reason.clone());
    }
    if let Some(submission) = handed_over {
        response["submission"] =
            serde_json::to_value(&submission).map_err(ComponentError::JsonEncode)?;
        response["submission_by_title"] =
            serde_json::to_value(submission.keyed_by_title(runtime.schema()))
                .map_err(ComponentError::JsonEncode)?;
    }
    Ok(response)
}

/// Moves forward one step. When the flow completes, the response carries the
/// `submission` the host must deliver.
pub fn advance(form_id: &str, config_json: &str, state_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|schema| {
        let mut runtime = resume(schema, state_json)?;
        let mut handed_over: Option<Submission> = None;
        let mut capture = |submission: &Submission| -> Result<(), SubmissionError> {
            handed_over = Some(submission.clone());
            Ok(())
        };
        let transition = runtime.advance(&mut capture)?;
        debug!(status = transition_status(&transition), "advance handled");
        transition_response(&runtime, &transition, handed_over)
    }))
}

/// Commits a transition parked in `state.pending`. Status is `ignored` when
/// nothing is in flight.
pub fn complete(form_id: &str, config_json: &str, state_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|schema| {
        let mut runtime = resume(schema, state_json)?;
        let mut handed_over: Option<Submission> = None;
        let mut capture = |submission: &Submission| -> Result<(), SubmissionError> {
            handed_over = Some(submission.clone());
            Ok(())
        };
        let transition = runtime.complete(&mut capture)?;
        debug!(status = transition_status(&transition), "pending transition committed");
        transition_response(&runtime, &transition, handed_over)
    }))
}

pub fn retreat(form_id: &str, config_json: &str, state_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|schema| {
        let mut runtime = resume(schema, state_json)?;
        let transition = runtime.retreat();
        session_response(&runtime, transition_status(&transition))
    }))
}

fn resumed(
    form_id: &str,
    config_json: &str,
    state_json: &str,
) -> Result<FlowRuntime, ComponentError> {
    let schema = ensure_form(form_id, config_json)?;
    resume(schema, state_json)
}

pub fn render_text(form_id: &str, config_json: &str, state_json: &str) -> String {
    respond_string(
        resumed(form_id, config_json, state_json)
            .map(|runtime| flow_render_text(&build_step_payload(&runtime))),
    )
}

pub fn render_json_ui(form_id: &str, config_json: &str, state_json: &str) -> String {
    respond(
        resumed(form_id, config_json, state_json)
            .map(|runtime| flow_render_json_ui(&build_step_payload(&runtime))),
    )
}

/// True once the parked session reached the thank-you screen.
pub fn is_complete(form_id: &str, config_json: &str, state_json: &str) -> bool {
    resumed(form_id, config_json, state_json)
        .map(|runtime| runtime.step() == Step::Submitted)
        .unwrap_or(false)
}

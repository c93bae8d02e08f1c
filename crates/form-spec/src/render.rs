use serde_json::{Map, Value, json};

use crate::answers::AnswerValue;
use crate::runtime::{FlowRuntime, Step};
use crate::spec::{FieldOption, FieldType};

/// Which screen the payload describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    Welcome,
    Question,
    ThankYou,
}

impl ScreenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenKind::Welcome => "welcome",
            ScreenKind::Question => "question",
            ScreenKind::ThankYou => "thank_you",
        }
    }
}

/// Progress counters exposed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderProgress {
    pub current: usize,
    pub total: usize,
}

/// The displayed field.
#[derive(Debug, Clone)]
pub struct RenderField {
    pub id: String,
    pub kind: FieldType,
    pub title: String,
    pub subtitle: Option<String>,
    pub placeholder: Option<String>,
    pub required: bool,
    pub multi_select: bool,
    pub max_length: Option<usize>,
    pub options: Vec<FieldOption>,
    pub current_value: Option<AnswerValue>,
    pub is_last: bool,
}

/// Everything a presentation layer needs after a transition.
#[derive(Debug, Clone)]
pub struct StepPayload {
    pub form_title: Option<String>,
    pub screen: ScreenKind,
    pub step_index: isize,
    pub heading: String,
    pub body: Option<String>,
    pub button_text: Option<String>,
    pub field: Option<RenderField>,
    pub progress: Option<RenderProgress>,
    pub error: Option<String>,
    pub can_go_back: bool,
}

pub fn build_step_payload(runtime: &FlowRuntime) -> StepPayload {
    let schema = runtime.schema();
    let progress = schema.settings.show_progress.then(|| {
        let (current, total) = runtime.progress();
        RenderProgress { current, total }
    });

    let mut payload = StepPayload {
        form_title: schema.title.clone(),
        screen: ScreenKind::Welcome,
        step_index: runtime.current_step_index(),
        heading: String::new(),
        body: None,
        button_text: None,
        field: None,
        progress,
        error: runtime.current_error().map(String::from),
        can_go_back: runtime.can_go_back(),
    };

    match runtime.step() {
        Step::Intro => {
            let welcome = &schema.welcome_screen;
            payload.heading = welcome.title.clone();
            payload.body = Some(welcome.description.clone());
            payload.button_text = Some(welcome.button_text.clone());
        }
        Step::Submitted => {
            let thank_you = &schema.thank_you_screen;
            payload.screen = ScreenKind::ThankYou;
            payload.heading = format!("{} {}", thank_you.title, thank_you.emoji)
                .trim()
                .to_string();
            payload.body = Some(thank_you.description.clone());
        }
        Step::Question(index) => {
            let field = &schema.fields[index];
            let is_last = index + 1 == schema.fields.len();
            payload.screen = ScreenKind::Question;
            payload.heading = field.title.clone();
            payload.body = field.subtitle.clone();
            payload.button_text = Some(if is_last { "Submit" } else { "OK" }.to_string());
            payload.field = Some(RenderField {
                id: field.id.clone(),
                kind: field.kind,
                title: field.title.clone(),
                subtitle: field.subtitle.clone(),
                placeholder: field.placeholder.clone(),
                required: field.required,
                multi_select: field.multi_select,
                max_length: field.max_length,
                options: field.options.clone(),
                current_value: runtime.answers().get(&field.id).cloned(),
                is_last,
            });
        }
    }

    payload
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &StepPayload) -> Value {
    let field = payload.field.as_ref().map(|field| {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(field.id.clone()));
        map.insert("type".into(), Value::String(field.kind.as_str().into()));
        map.insert("title".into(), Value::String(field.title.clone()));
        if let Some(subtitle) = &field.subtitle {
            map.insert("subtitle".into(), Value::String(subtitle.clone()));
        }
        if let Some(placeholder) = &field.placeholder {
            map.insert("placeholder".into(), Value::String(placeholder.clone()));
        }
        map.insert("required".into(), Value::Bool(field.required));
        if field.multi_select {
            map.insert("multiSelect".into(), Value::Bool(true));
        }
        if let Some(max_length) = field.max_length {
            map.insert("maxLength".into(), Value::from(max_length));
        }
        if !field.options.is_empty() {
            map.insert(
                "options".into(),
                Value::Array(
                    field
                        .options
                        .iter()
                        .map(|option| json!({ "label": option.label, "value": option.value }))
                        .collect(),
                ),
            );
        }
        if let Some(value) = &field.current_value {
            map.insert(
                "value".into(),
                serde_json::to_value(value).unwrap_or(Value::Null),
            );
        }
        map.insert("isLast".into(), Value::Bool(field.is_last));
        Value::Object(map)
    });

    json!({
        "form_title": payload.form_title,
        "screen": payload.screen.as_str(),
        "step_index": payload.step_index,
        "heading": payload.heading,
        "body": payload.body,
        "button_text": payload.button_text,
        "field": field,
        "progress": payload.progress.map(|progress| json!({
            "current": progress.current,
            "total": progress.total,
        })),
        "error": payload.error,
        "can_go_back": payload.can_go_back,
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &StepPayload) -> String {
    let mut lines = Vec::new();

    match payload.screen {
        ScreenKind::Question => {
            let mut heading = String::new();
            if let Some(progress) = payload.progress {
                heading.push_str(&format!("{}/{} ", progress.current, progress.total));
            }
            heading.push_str(&payload.heading);
            if payload.field.as_ref().is_some_and(|field| field.required) {
                heading.push_str(" *");
            }
            lines.push(heading);
        }
        _ => lines.push(payload.heading.clone()),
    }

    if let Some(body) = &payload.body {
        lines.push(body.clone());
    }

    if let Some(field) = &payload.field {
        for (position, option) in field.options.iter().enumerate() {
            let marker = if option_selected(field, &option.value) {
                "x"
            } else {
                " "
            };
            lines.push(format!("  [{}] {}. {}", marker, position + 1, option.label));
        }
        if let Some(value) = &field.current_value
            && field.options.is_empty()
            && !value.is_blank()
        {
            lines.push(format!("Current value: {}", value.as_text()));
        }
    }

    if let Some(error) = &payload.error {
        lines.push(format!("! {}", error));
    }

    if let Some(button) = &payload.button_text {
        lines.push(format!("Press Enter: {}", button));
    }

    lines.join("\n")
}

fn option_selected(field: &RenderField, value: &str) -> bool {
    match &field.current_value {
        Some(AnswerValue::Text(text)) => text == value,
        Some(AnswerValue::Set(values)) => values.iter().any(|selected| selected == value),
        _ => false,
    }
}

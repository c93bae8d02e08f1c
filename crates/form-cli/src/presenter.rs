use std::fmt::Write;

use form_spec::{AnswerValue, FieldType, Submission};
use serde_json::Value;

/// Controls which bits of state the runner prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: screens and prompts only.
    Clean,
    /// Verbose output: step index, navigation hints, parse expectations.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints each screen the component hands back.
pub struct FlowPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_answers_json: bool,
}

impl FlowPresenter {
    pub fn new(verbosity: Verbosity, show_answers_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_answers_json,
        }
    }

    pub fn show_header(&mut self, view: &StepView) {
        if self.header_printed {
            return;
        }
        if let Some(title) = &view.form_title {
            println!("Form: {}", title);
        }
        self.header_printed = true;
    }

    pub fn show_screen(&self, view: &StepView) {
        if self.verbosity.is_verbose() {
            println!("Step: {} ({})", view.step_index, view.screen.as_str());
        }
        match &view.field {
            Some(field) => self.show_question(view, field),
            None => {
                println!("{}", view.heading);
                if let Some(body) = &view.body {
                    println!("{}", body);
                }
            }
        }
        if let Some(error) = &view.error {
            eprintln!("! {}", error);
        }
        if let Some(button) = &view.button_text {
            let mut line = format!("Press Enter: {}", button);
            if self.verbosity.is_verbose() && view.can_go_back {
                line.push_str(" (type 'back' to go back, 'exit' to quit)");
            }
            println!("{}", line);
        }
    }

    fn show_question(&self, view: &StepView, field: &StepField) {
        let mut line = match view.progress {
            Some((current, total)) => format!("{}/{} {}", current, total, field.title),
            None => field.title.clone(),
        };
        if field.required {
            line.push_str(" *");
        }
        if let Some(hint) = field.hint() {
            line.push(' ');
            line.push_str(&hint);
        }
        println!("{}", line);
        if let Some(subtitle) = &field.subtitle {
            println!("{}", subtitle);
        }
        for (position, option) in field.options.iter().enumerate() {
            let marker = if field.is_selected(&option.1) { "x" } else { " " };
            println!("  [{}] {}. {}", marker, position + 1, option.0);
        }
        if let Some(current) = field.current_text()
            && field.options.is_empty()
        {
            println!("Current value: {}", current);
        }
        if self.verbosity.is_verbose()
            && let Some(placeholder) = &field.placeholder
        {
            println!("Placeholder: {}", placeholder);
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if self.verbosity.is_verbose()
            && let Some(debug) = &error.debug_message
        {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_completion(&self, submission: &Submission) {
        println!("Done ✅");
        match submission.to_cbor() {
            Ok(bytes) => {
                println!("Submission (CBOR hex): {}", encode_hex(&bytes));
            }
            Err(err) => {
                eprintln!("Failed to serialize submission to CBOR: {}", err);
            }
        }
        if self.show_answers_json {
            match submission.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => {
                    eprintln!("Failed to serialize submission to JSON: {}", err);
                }
            }
        }
    }
}

/// Screen kind reported by the component.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScreenLabel {
    Welcome,
    Question,
    ThankYou,
}

impl ScreenLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenLabel::Welcome => "welcome",
            ScreenLabel::Question => "question",
            ScreenLabel::ThankYou => "thank_you",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "question" => ScreenLabel::Question,
            "thank_you" => ScreenLabel::ThankYou,
            _ => ScreenLabel::Welcome,
        }
    }
}

/// View extracted from the component's JSON UI.
pub struct StepView {
    pub form_title: Option<String>,
    pub screen: ScreenLabel,
    pub step_index: i64,
    pub heading: String,
    pub body: Option<String>,
    pub button_text: Option<String>,
    pub field: Option<StepField>,
    pub progress: Option<(u64, u64)>,
    pub error: Option<String>,
    pub can_go_back: bool,
}

impl StepView {
    pub fn from_json(json: &Value) -> Result<Self, String> {
        let screen = json
            .get("screen")
            .and_then(Value::as_str)
            .map(ScreenLabel::from_label)
            .ok_or_else(|| "step view missing screen".to_string())?;
        let heading = json
            .get("heading")
            .and_then(Value::as_str)
            .ok_or_else(|| "step view missing heading".to_string())?
            .to_string();
        let progress = json.get("progress").and_then(Value::as_object).map(|progress| {
            (
                progress.get("current").and_then(Value::as_u64).unwrap_or(0),
                progress.get("total").and_then(Value::as_u64).unwrap_or(0),
            )
        });
        let field = match json.get("field") {
            Some(field) if field.is_object() => Some(StepField::from_json(field)?),
            _ => None,
        };
        Ok(Self {
            form_title: optional_str(json, "form_title"),
            screen,
            step_index: json.get("step_index").and_then(Value::as_i64).unwrap_or(-1),
            heading,
            body: optional_str(json, "body"),
            button_text: optional_str(json, "button_text"),
            field,
            progress,
            error: optional_str(json, "error"),
            can_go_back: json
                .get("can_go_back")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }
}

/// The displayed field, enough to parse typed input.
pub struct StepField {
    pub id: String,
    pub kind: FieldType,
    pub title: String,
    pub subtitle: Option<String>,
    pub placeholder: Option<String>,
    pub required: bool,
    pub multi_select: bool,
    /// `(label, value)` pairs.
    pub options: Vec<(String, String)>,
    pub value: Option<AnswerValue>,
}

impl StepField {
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| "field missing id".to_string())?
            .to_string();
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("field '{}' missing type", id))?
            .parse::<FieldType>()
            .map_err(|err| format!("field '{}': {}", id, err))?;
        let title = value
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("field '{}' missing title", id))?
            .to_string();
        let options = value
            .get("options")
            .and_then(Value::as_array)
            .map(|options| {
                options
                    .iter()
                    .filter_map(|option| {
                        let label = option.get("label").and_then(Value::as_str)?;
                        let value = option.get("value").and_then(Value::as_str)?;
                        Some((label.to_string(), value.to_string()))
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        let current = value
            .get("value")
            .cloned()
            .and_then(|raw| serde_json::from_value(raw).ok());
        Ok(Self {
            subtitle: optional_str(value, "subtitle"),
            placeholder: optional_str(value, "placeholder"),
            required: value
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            multi_select: value
                .get("multiSelect")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            id,
            kind,
            title,
            options,
            value: current,
        })
    }

    fn hint(&self) -> Option<String> {
        match self.kind {
            FieldType::Checkbox => Some("(yes/no)".to_string()),
            FieldType::Date => Some("(YYYY-MM-DD)".to_string()),
            FieldType::Number => Some("(number)".to_string()),
            FieldType::Tel => Some("(10 digits)".to_string()),
            FieldType::Radio if self.multi_select => {
                Some("(comma-separated numbers or values)".to_string())
            }
            FieldType::Radio | FieldType::Select if !self.options.is_empty() => {
                Some("(number or value)".to_string())
            }
            _ => None,
        }
    }

    fn is_selected(&self, option_value: &str) -> bool {
        match &self.value {
            Some(AnswerValue::Text(text)) => text == option_value,
            Some(AnswerValue::Set(values)) => values.iter().any(|value| value == option_value),
            _ => false,
        }
    }

    fn current_text(&self) -> Option<String> {
        self.value
            .as_ref()
            .filter(|value| !value.is_blank())
            .map(AnswerValue::as_text)
    }
}

fn optional_str(json: &Value, key: &str) -> Option<String> {
    json.get(key).and_then(Value::as_str).map(String::from)
}

/// Error produced when parsing answers typed by the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(&mut encoded, "{:02x}", byte).expect("writing to string cannot fail");
    }
    encoded
}

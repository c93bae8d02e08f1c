pub mod generate;

mod presenter;

use clap::{Parser, Subcommand, ValueEnum};
use component_flow::{advance, patch_answer, retreat, start};
use form_spec::{
    AnswerMap, AnswerValue, FieldType, FormSchema, FormValidation, SchemaIssue, Submission,
    check_schema, validate_answers,
};
use generate::{GeneratedBundle, GenerationInput, build_bundle, write_bundle};
use presenter::{AnswerParseError, FlowPresenter, ScreenLabel, StepField, StepView, Verbosity};
use serde_json::{Value, json};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Conversational form runner",
    long_about = "Runs one-question-per-screen forms in the terminal, validates answer files, checks schemas, and generates form bundles"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run a form one question at a time.
    Run {
        /// Path to the form schema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Optional JSON file with answers to prefill.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Show verbose output (step index, navigation hints, parse expectations).
        #[arg(long, alias = "debug")]
        verbose: bool,
        /// Also print the submission as JSON.
        #[arg(long)]
        answers_json: bool,
        /// Render output mode for each screen.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Validate an answer file against a form schema.
    Validate {
        /// Path to the form schema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Path to the answers JSON file.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
    /// Report configuration problems in a form schema.
    Check {
        /// Path to the form schema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
    },
    /// Build a form bundle from a JSON description.
    Generate {
        /// JSON file describing the form metadata and fields.
        #[arg(long, value_name = "INPUT")]
        input: PathBuf,
        /// Root directory where the bundle is written (defaults to FORMFLOW_OUTPUT_DIR or the current directory).
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
        /// Overwrite existing bundle if present.
        #[arg(long)]
        force: bool,
        /// Print the generated documents.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the JSON Schema of the form schema document.
    Schema,
}

fn main() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            schema,
            answers,
            verbose,
            answers_json,
            format,
        } => run_flow(schema, answers, verbose, answers_json, format),
        Command::Validate { schema, answers } => run_validate(schema, answers),
        Command::Check { schema } => run_check(schema),
        Command::Generate {
            input,
            out,
            force,
            verbose,
        } => run_generate(input, out, force, verbose),
        Command::Schema => print_document_schema(),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn read_schema(path: &Path) -> CliResult<(String, FormSchema)> {
    let contents = fs::read_to_string(path)?;
    let schema = serde_json::from_str(&contents)?;
    Ok((contents, schema))
}

fn run_validate(schema_path: PathBuf, answers_path: PathBuf) -> CliResult<()> {
    let (_, schema) = read_schema(&schema_path)?;
    let answers_json = fs::read_to_string(answers_path)?;
    let answers: AnswerMap = serde_json::from_str(&answers_json)?;

    let result = validate_answers(&schema, &answers);
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    describe_validation(&result);

    if result.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(result: &FormValidation) {
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!("  {} - {}", error.path, error.message);
        }
    }
    if !result.missing_required.is_empty() {
        println!(
            "Missing required answers: {}",
            result.missing_required.join(", ")
        );
    }
    if !result.unknown_fields.is_empty() {
        println!(
            "Unknown answer fields: {}",
            result.unknown_fields.join(", ")
        );
    }
}

fn run_check(schema_path: PathBuf) -> CliResult<()> {
    let (_, schema) = read_schema(&schema_path)?;
    let issues = check_schema(&schema);
    if issues.is_empty() {
        println!("Schema OK: {} field(s)", schema.fields.len());
        return Ok(());
    }
    println!("Issues:");
    for issue in &issues {
        println!("  {}", describe_issue(issue));
    }
    Err(format!("{} schema issue(s) found", issues.len()).into())
}

fn describe_issue(issue: &SchemaIssue) -> String {
    match &issue.field_id {
        Some(field_id) => format!("[{}] {}: {}", issue.code, field_id, issue.message),
        None => format!("[{}] {}", issue.code, issue.message),
    }
}

fn print_document_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(FormSchema);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn run_generate(
    input_path: PathBuf,
    out_dir: Option<PathBuf>,
    force: bool,
    verbose: bool,
) -> CliResult<()> {
    let contents = fs::read_to_string(&input_path)?;
    let input: GenerationInput = serde_json::from_str(&contents)?;
    let bundle = build_bundle(&input)?;
    let out_root = resolve_output_root(out_dir)?;
    let bundle_dir = out_root.join(&input.dir_name);
    ensure_allowed_root(&bundle_dir)?;
    if bundle_dir.exists() {
        if force {
            fs::remove_dir_all(&bundle_dir)?;
        } else {
            return Err(format!(
                "bundle {} already exists; rerun with --force to overwrite",
                bundle_dir.display()
            )
            .into());
        }
    }

    let bundle_dir = write_bundle(&bundle, &input, &out_root)?;
    println!("Generated form bundle at {}", bundle_dir.display());
    if verbose {
        println!("Detailed bundle state:");
        dump_bundle_debug(&bundle)?;
    }
    Ok(())
}

fn dump_bundle_debug(bundle: &GeneratedBundle) -> CliResult<()> {
    println!("Form schema:");
    println!("{}", serde_json::to_string_pretty(&bundle.schema)?);
    println!("Answer schema:");
    println!("{}", serde_json::to_string_pretty(&bundle.answers_schema)?);
    println!("Example answers:");
    println!("{}", serde_json::to_string_pretty(&bundle.examples)?);
    Ok(())
}

fn resolve_output_root(out: Option<PathBuf>) -> CliResult<PathBuf> {
    let candidate = match out {
        Some(path) => path,
        None => env::var_os("FORMFLOW_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    if candidate.as_os_str().is_empty() {
        return Err("output directory cannot be empty".into());
    }
    ensure_allowed_root(&candidate)?;
    Ok(candidate)
}

fn ensure_allowed_root(target: &Path) -> CliResult<()> {
    let target = canonicalize_target(target)?;
    let roots = allowed_roots()?;
    if roots.iter().any(|root| target.starts_with(root)) || path_is_writable(&target) {
        Ok(())
    } else {
        Err(format!(
            "path '{}' is outside allowed roots {:?}",
            target.display(),
            roots
        )
        .into())
    }
}

fn allowed_roots() -> CliResult<Vec<PathBuf>> {
    let roots = env::var("FORMFLOW_ALLOWED_ROOTS")
        .ok()
        .map(|value| {
            value
                .split(':')
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .map(PathBuf::from)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let mut canonical_roots = roots
        .into_iter()
        .map(|root| root.canonicalize().unwrap_or(root))
        .collect::<Vec<_>>();

    if canonical_roots.is_empty() {
        let cwd = env::current_dir()?;
        canonical_roots.push(cwd.canonicalize().unwrap_or(cwd));
    }

    Ok(canonical_roots)
}

fn path_is_writable(target: &Path) -> bool {
    let mut candidate = Some(target);
    while let Some(path) = candidate {
        if path.exists() {
            return fs::metadata(path)
                .map(|metadata| !metadata.permissions().readonly())
                .unwrap_or(false);
        }
        candidate = path.parent();
    }
    false
}

fn canonicalize_target(path: &Path) -> CliResult<PathBuf> {
    if path.exists() {
        return Ok(path.canonicalize()?);
    }

    if let Some(parent) = path.parent()
        && let Ok(parent_canon) = parent.canonicalize()
    {
        return Ok(match path.file_name() {
            Some(file_name) => parent_canon.join(file_name),
            None => parent_canon,
        });
    }

    let cwd = env::current_dir()?;
    Ok(cwd.join(path))
}

/// What the respondent typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum FlowInput {
    /// Empty line: continue, keeping the current value.
    Continue,
    Back,
    Exit,
    Answer(String),
}

fn classify_input(raw: &str) -> FlowInput {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        FlowInput::Continue
    } else if trimmed.eq_ignore_ascii_case("exit") {
        FlowInput::Exit
    } else if trimmed.eq_ignore_ascii_case("back") {
        FlowInput::Back
    } else {
        FlowInput::Answer(trimmed.to_string())
    }
}

fn read_input() -> CliResult<FlowInput> {
    print!("> ");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(FlowInput::Exit);
    }
    Ok(classify_input(&line))
}

fn run_flow(
    schema_path: PathBuf,
    answers_path: Option<PathBuf>,
    verbose: bool,
    answers_json: bool,
    format: RenderMode,
) -> CliResult<()> {
    let (schema_str, schema) = read_schema(&schema_path)?;
    let form_id = schema.id.clone().unwrap_or_default();
    let config_json = json!({ "form_schema_json": schema_str }).to_string();
    let initial_answers = match answers_path {
        Some(path) => fs::read_to_string(path)?,
        None => String::new(),
    };

    let mut presenter = FlowPresenter::new(Verbosity::from_verbose(verbose), answers_json);
    let mut session = parse_component_result(&start(&form_id, &config_json, &initial_answers))?;
    debug!(form_id, fields = schema.fields.len(), "flow started");

    loop {
        let view = StepView::from_json(&session["view"])
            .map_err(|err| format!("flow UI error: {}", err))?;
        print_render_output(format, &session["view"]);
        presenter.show_header(&view);
        presenter.show_screen(&view);

        if view.screen == ScreenLabel::ThankYou {
            let submission: Submission = serde_json::from_value(session["submission"].clone())?;
            presenter.show_completion(&submission);
            break;
        }

        let state_json = session["state"].to_string();
        session = match read_input()? {
            FlowInput::Exit => return Err("flow aborted by user".into()),
            FlowInput::Back => {
                let response =
                    parse_component_result(&retreat(&form_id, &config_json, &state_json))?;
                if response["status"] == "ignored" {
                    println!("Nothing to go back to.");
                }
                response
            }
            FlowInput::Continue => {
                parse_component_result(&advance(&form_id, &config_json, &state_json))?
            }
            FlowInput::Answer(raw) => match &view.field {
                None => parse_component_result(&advance(&form_id, &config_json, &state_json))?,
                Some(field) => match parse_answer(field, &raw) {
                    Ok(value) => answer_and_advance(
                        &form_id,
                        &config_json,
                        &state_json,
                        &field.id,
                        &value,
                    )?,
                    Err(err) => {
                        presenter.show_parse_error(&err);
                        continue;
                    }
                },
            },
        };
    }

    Ok(())
}

fn answer_and_advance(
    form_id: &str,
    config_json: &str,
    state_json: &str,
    field_id: &str,
    value: &AnswerValue,
) -> CliResult<Value> {
    let value_json = serde_json::to_string(value)?;
    let patched = parse_component_result(&patch_answer(
        form_id,
        config_json,
        state_json,
        field_id,
        &value_json,
    ))?;
    parse_component_result(&advance(
        form_id,
        config_json,
        &patched["state"].to_string(),
    ))
}

fn parse_component_result(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}

fn print_render_output(mode: RenderMode, view: &Value) {
    match mode {
        RenderMode::Text => {}
        RenderMode::Json => println!("JSON UI:\n{}", view),
    }
}

fn parse_answer(field: &StepField, raw: &str) -> Result<AnswerValue, AnswerParseError> {
    let raw = raw.trim();
    match field.kind {
        FieldType::Checkbox => parse_boolean(raw),
        FieldType::Radio if field.multi_select => parse_choices(field, raw),
        FieldType::Radio | FieldType::Select if !field.options.is_empty() => {
            parse_choice(field, raw).map(AnswerValue::Text)
        }
        FieldType::Number => parse_number(raw),
        _ => Ok(AnswerValue::text(raw)),
    }
}

fn parse_boolean(raw: &str) -> Result<AnswerValue, AnswerParseError> {
    match raw.to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(AnswerValue::Bool(true)),
        "false" | "f" | "no" | "n" | "0" => Ok(AnswerValue::Bool(false)),
        _ => Err(AnswerParseError::new(
            "Please enter yes or no.",
            Some("expected boolean (y/n/true/false)".to_string()),
        )),
    }
}

fn parse_number(raw: &str) -> Result<AnswerValue, AnswerParseError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(AnswerValue::text(raw)),
        _ => Err(AnswerParseError::new(
            "Please enter a number.",
            Some("expected number".to_string()),
        )),
    }
}

/// Accepts a 1-based option number, an option value, or an option label.
fn parse_choice(field: &StepField, raw: &str) -> Result<String, AnswerParseError> {
    if let Ok(number) = raw.parse::<usize>()
        && let Some((_, value)) = number.checked_sub(1).and_then(|index| field.options.get(index))
    {
        return Ok(value.clone());
    }

    field
        .options
        .iter()
        .find(|(label, value)| value.eq_ignore_ascii_case(raw) || label.eq_ignore_ascii_case(raw))
        .map(|(_, value)| value.clone())
        .ok_or_else(|| {
            let labels = field
                .options
                .iter()
                .map(|(label, _)| label.as_str())
                .collect::<Vec<_>>();
            AnswerParseError::new(
                format!("Choose one of: {}.", labels.join(", ")),
                Some(format!("option number 1-{} or value", field.options.len())),
            )
        })
}

fn parse_choices(field: &StepField, raw: &str) -> Result<AnswerValue, AnswerParseError> {
    let mut selected: Vec<String> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let value = parse_choice(field, part)?;
        if !selected.contains(&value) {
            selected.push(value);
        }
    }
    Ok(AnswerValue::Set(selected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use serde_json::{Value, json};
    use std::{env, ffi::OsString, fs, path::Path};
    use tempfile::TempDir;

    struct EnvVarGuard {
        key: &'static str,
        original: Option<OsString>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: &Path) -> Self {
            let original = env::var_os(key);
            unsafe { env::set_var(key, value) };
            EnvVarGuard { key, original }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match &self.original {
                Some(value) => unsafe { env::set_var(self.key, value) },
                None => unsafe { env::remove_var(self.key) },
            }
        }
    }

    const FIXTURE: &str = include_str!("../../../ci/fixtures/event_form_generation.json");

    fn field(kind: FieldType, multi_select: bool) -> StepField {
        let view = json!({
            "id": "choice",
            "type": kind.as_str(),
            "title": "Pick",
            "multiSelect": multi_select,
            "options": [
                { "label": "Red", "value": "red" },
                { "label": "Dark blue", "value": "blue" }
            ]
        });
        StepField::from_json(&view).expect("field view")
    }

    fn write_name_form(dir: &Path) -> PathBuf {
        let schema = json!({
            "id": "name-form",
            "title": "Names",
            "fields": [
                { "id": "name", "type": "text", "title": "Your name", "required": true }
            ]
        });
        let path = dir.join("name.form.json");
        fs::write(&path, schema.to_string()).expect("write schema");
        path
    }

    #[test]
    fn classify_input_recognises_navigation_words() {
        assert_eq!(classify_input("\n"), FlowInput::Continue);
        assert_eq!(classify_input(" BACK "), FlowInput::Back);
        assert_eq!(classify_input("exit\n"), FlowInput::Exit);
        assert_eq!(
            classify_input("backpack"),
            FlowInput::Answer("backpack".into())
        );
    }

    #[test]
    fn parse_answer_checkbox_accepts_yes() {
        let checkbox = field(FieldType::Checkbox, false);
        assert_eq!(
            parse_answer(&checkbox, "yes").unwrap(),
            AnswerValue::Bool(true)
        );
        assert!(parse_answer(&checkbox, "maybe").is_err());
    }

    #[test]
    fn parse_answer_choice_accepts_number_value_or_label() {
        let select = field(FieldType::Select, false);
        assert_eq!(parse_answer(&select, "2").unwrap(), AnswerValue::text("blue"));
        assert_eq!(parse_answer(&select, "RED").unwrap(), AnswerValue::text("red"));
        assert_eq!(
            parse_answer(&select, "dark blue").unwrap(),
            AnswerValue::text("blue")
        );
        assert!(parse_answer(&select, "3").is_err());
        assert!(parse_answer(&select, "green").is_err());
    }

    #[test]
    fn parse_answer_multi_select_builds_set() {
        let radio = field(FieldType::Radio, true);
        assert_eq!(
            parse_answer(&radio, "2, red, 2").unwrap(),
            AnswerValue::set(["blue", "red"])
        );
        assert!(parse_answer(&radio, "1, purple").is_err());
    }

    #[test]
    fn parse_answer_number_requires_numeric_text() {
        let number = StepField::from_json(&json!({
            "id": "age", "type": "number", "title": "Age"
        }))
        .expect("field view");
        assert_eq!(parse_answer(&number, "42").unwrap(), AnswerValue::text("42"));
        assert!(parse_answer(&number, "forty").is_err());
    }

    #[test]
    fn fixture_generates_bundle() {
        let input: GenerationInput =
            serde_json::from_str(FIXTURE).expect("fixture should deserialize into GenerationInput");
        let bundle = build_bundle(&input).expect("bundle build should succeed");
        let temp_dir = TempDir::new().expect("temp dir");

        let bundle_dir =
            write_bundle(&bundle, &input, temp_dir.path()).expect("bundle write should succeed");

        let forms_dir = bundle_dir.join("forms");
        assert!(forms_dir.join("event-signup.form.json").exists());
        assert!(
            bundle_dir
                .join("examples")
                .join("event-signup.answers.example.json")
                .exists()
        );
        assert!(
            bundle_dir
                .join("schemas")
                .join("event-signup.answers.schema.json")
                .exists()
        );
        let readme = fs::read_to_string(bundle_dir.join("README.md")).expect("read README");
        assert!(readme.contains(form_spec::BRANCHING_NOTE));

        let schema_contents =
            fs::read_to_string(forms_dir.join("event-signup.form.json")).expect("read schema");
        let schema: FormSchema = serde_json::from_str(&schema_contents).expect("schema JSON");
        assert_eq!(schema.id.as_deref(), Some("event-signup"));
        assert_eq!(schema.welcome_screen.button_text, "Let's go");
        assert_eq!(schema.fields.len(), 4);
        assert!(schema.fields[3].id.starts_with("field_"));
        assert_eq!(schema.fields[0].options[1].label, "no");
        assert_eq!(
            schema.fields[0].logic.as_ref().map(|logic| logic.rules.len()),
            Some(1)
        );
        assert!(check_schema(&schema).is_empty());
    }

    #[test]
    fn build_bundle_rejects_unknown_rule_target() {
        let mut input: GenerationInput = serde_json::from_str(FIXTURE).expect("fixture");
        input.fields[0].rules[0].target = "nowhere".into();
        let err = build_bundle(&input).err().expect("unknown target");
        assert!(err.contains("nowhere"));
    }

    #[test]
    fn build_bundle_rejects_dir_name_outside_output_root() {
        let mut input: GenerationInput = serde_json::from_str(FIXTURE).expect("fixture");
        for dir_name in ["/tmp/elsewhere", "../escape", "nested/bundle", "."] {
            input.dir_name = dir_name.into();
            let err = build_bundle(&input).err().expect("dir_name rejected");
            assert!(err.contains("single directory name"), "{dir_name}: {err}");
        }
    }

    #[test]
    fn generate_force_keeps_existing_bundle_when_input_is_invalid()
    -> Result<(), Box<dyn std::error::Error>> {
        let workspace = assert_fs::TempDir::new()?;
        let output_root = workspace.path().join("out");
        let bundle_dir = output_root.join("event-signup");
        fs::create_dir_all(&bundle_dir)?;
        fs::write(bundle_dir.join("keep.txt"), "keep")?;

        let mut input: Value = serde_json::from_str(FIXTURE)?;
        input["form"]["id"] = json!("");
        let input_path = workspace.path().join("input.json");
        fs::write(&input_path, serde_json::to_string(&input)?)?;

        Command::cargo_bin("formflow")?
            .arg("generate")
            .arg("--input")
            .arg(&input_path)
            .arg("--out")
            .arg(&output_root)
            .arg("--force")
            .assert()
            .failure();
        assert!(bundle_dir.join("keep.txt").exists());

        let victim = workspace.path().join("victim");
        fs::create_dir_all(&victim)?;
        fs::write(victim.join("keep.txt"), "keep")?;
        let mut input: Value = serde_json::from_str(FIXTURE)?;
        input["dir_name"] = json!(victim.to_string_lossy());
        fs::write(&input_path, serde_json::to_string(&input)?)?;

        Command::cargo_bin("formflow")?
            .arg("generate")
            .arg("--input")
            .arg(&input_path)
            .arg("--out")
            .arg(&output_root)
            .arg("--force")
            .assert()
            .failure();
        assert!(victim.join("keep.txt").exists());
        Ok(())
    }

    #[test]
    fn ensure_allowed_root_accepts_writable_paths_outside_allowed_roots() {
        let allowed_root = TempDir::new().expect("temp dir");
        let other_root = TempDir::new().expect("temp dir");
        let _guard = EnvVarGuard::set("FORMFLOW_ALLOWED_ROOTS", allowed_root.path());
        assert!(ensure_allowed_root(other_root.path()).is_ok());
    }

    #[test]
    fn run_command_walks_form_and_prints_submission() -> Result<(), Box<dyn std::error::Error>>
    {
        let workspace = assert_fs::TempDir::new()?;
        let schema_path = write_name_form(workspace.path());

        let output = Command::cargo_bin("formflow")?
            .arg("run")
            .arg("--schema")
            .arg(&schema_path)
            .arg("--answers-json")
            .write_stdin("\n\nAnn\n")
            .output()?;
        assert!(output.status.success());

        let stdout = String::from_utf8(output.stdout)?;
        let stderr = String::from_utf8(output.stderr)?;
        assert!(stdout.contains("Welcome!"));
        assert!(stdout.contains("1/1 Your name *"));
        assert!(stderr.contains("! This field is required"));
        assert!(stdout.contains("Done ✅"));
        assert!(stdout.contains("Submission (CBOR hex): "));
        assert!(stdout.contains("\"name\": \"Ann\""));
        Ok(())
    }

    #[test]
    fn run_command_exit_aborts() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = assert_fs::TempDir::new()?;
        let schema_path = write_name_form(workspace.path());

        Command::cargo_bin("formflow")?
            .arg("run")
            .arg("--schema")
            .arg(&schema_path)
            .write_stdin("\nexit\n")
            .assert()
            .failure();
        Ok(())
    }

    #[test]
    fn validate_command_reports_missing_answers() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = assert_fs::TempDir::new()?;
        let schema_path = write_name_form(workspace.path());
        let answers_path = workspace.path().join("answers.json");
        fs::write(&answers_path, "{}")?;

        let output = Command::cargo_bin("formflow")?
            .arg("validate")
            .arg("--schema")
            .arg(&schema_path)
            .arg("--answers")
            .arg(&answers_path)
            .output()?;
        assert!(!output.status.success());
        let stdout = String::from_utf8(output.stdout)?;
        assert!(stdout.contains("Validation result: invalid"));
        assert!(stdout.contains("Missing required answers: name"));

        fs::write(&answers_path, json!({ "name": "Ann" }).to_string())?;
        Command::cargo_bin("formflow")?
            .arg("validate")
            .arg("--schema")
            .arg(&schema_path)
            .arg("--answers")
            .arg(&answers_path)
            .assert()
            .success();
        Ok(())
    }

    #[test]
    fn check_command_flags_dangling_rule() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = assert_fs::TempDir::new()?;
        let schema_path = workspace.path().join("broken.form.json");
        let schema = json!({
            "fields": [
                {
                    "id": "a", "type": "text", "title": "A",
                    "logic": { "rules": [
                        { "id": "r", "operator": "equals", "value": "x", "targetFieldId": "gone" }
                    ] }
                }
            ]
        });
        fs::write(&schema_path, schema.to_string())?;

        let output = Command::cargo_bin("formflow")?
            .arg("check")
            .arg("--schema")
            .arg(&schema_path)
            .output()?;
        assert!(!output.status.success());
        let stdout = String::from_utf8(output.stdout)?;
        assert!(stdout.contains("[dangling_target] a:"));
        Ok(())
    }

    #[test]
    fn generate_command_writes_bundle_that_validates() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = assert_fs::TempDir::new()?;
        let input_path = workspace.path().join("input.json");
        fs::write(&input_path, FIXTURE)?;
        let output_root = workspace.path().join("out");

        Command::cargo_bin("formflow")?
            .arg("generate")
            .arg("--input")
            .arg(&input_path)
            .arg("--out")
            .arg(&output_root)
            .assert()
            .success();

        let bundle_dir = output_root.join("event-signup");
        Command::cargo_bin("formflow")?
            .arg("validate")
            .arg("--schema")
            .arg(bundle_dir.join("forms").join("event-signup.form.json"))
            .arg("--answers")
            .arg(
                bundle_dir
                    .join("examples")
                    .join("event-signup.answers.example.json"),
            )
            .assert()
            .success();

        Command::cargo_bin("formflow")?
            .arg("generate")
            .arg("--input")
            .arg(&input_path)
            .arg("--out")
            .arg(&output_root)
            .assert()
            .failure();
        Ok(())
    }

    #[test]
    fn schema_command_prints_document_schema() -> Result<(), Box<dyn std::error::Error>> {
        let output = Command::cargo_bin("formflow")?.arg("schema").output()?;
        assert!(output.status.success());
        let schema: Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(schema["title"], "FormSchema");
        assert!(schema["properties"]["fields"].is_object());
        Ok(())
    }
}

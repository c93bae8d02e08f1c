use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::{BTreeMap, HashSet},
    fs, io,
    path::{Component, Path, PathBuf},
};

use form_spec::{
    AnswerValue, BRANCHING_NOTE, FieldOption, FieldType, FormBuilder, FormSchema, RuleOperator,
    SUBMIT_TARGET, ThankYouScreenConfig, WelcomeScreenConfig, answers_schema, check_schema,
    example_answers, has_branching, template,
};

/// Input shape describing the form to generate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationInput {
    pub dir_name: String,
    pub summary_md: Option<String>,
    pub form: FormInput,
    #[serde(default)]
    pub fields: Vec<FieldInput>,
}

/// Form metadata plus optional screen copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormInput {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub welcome: Option<WelcomeScreenConfig>,
    #[serde(default)]
    pub thank_you: Option<ThankYouScreenConfig>,
}

/// One field; anything left out keeps the palette template's value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldInput {
    /// Stable id; a generated `field_...` id is used when absent.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub options: Option<Vec<OptionInput>>,
    #[serde(default)]
    pub multi_select: bool,
    #[serde(default)]
    pub min_date: Option<String>,
    #[serde(default)]
    pub max_date: Option<String>,
    #[serde(default)]
    pub default_value: Option<AnswerValue>,
    #[serde(default)]
    pub rules: Vec<RuleInput>,
}

/// Either a bare value used as its own label or an explicit pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionInput {
    Plain(String),
    Labeled(FieldOption),
}

impl OptionInput {
    fn into_option(self) -> FieldOption {
        match self {
            OptionInput::Plain(value) => FieldOption::new(value.clone(), value),
            OptionInput::Labeled(option) => option,
        }
    }
}

/// Branching rule; `target` names a field id from this input or `SUBMIT`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleInput {
    pub operator: RuleOperator,
    #[serde(default)]
    pub value: String,
    pub target: String,
}

/// Generated bundle returned by the builder.
pub struct GeneratedBundle {
    pub schema: FormSchema,
    pub answers_schema: Value,
    pub examples: Value,
}

/// Build the full bundle from a JSON description.
pub fn build_bundle(input: &GenerationInput) -> Result<GeneratedBundle, String> {
    validate_input(input)?;

    let mut builder = FormBuilder::new();
    builder.set_metadata(
        Some(input.form.id.clone()),
        Some(input.form.title.clone()),
        input.form.description.clone(),
    );
    if let Some(welcome) = &input.form.welcome {
        builder.set_welcome(welcome.clone());
    }
    if let Some(thank_you) = &input.form.thank_you {
        builder.set_thank_you(thank_you.clone());
    }

    let mut ids = Vec::with_capacity(input.fields.len());
    for field_input in &input.fields {
        let id = match &field_input.id {
            Some(id) => {
                let mut field = template(field_input.kind);
                field.id = id.clone();
                builder.push_field(field).map_err(|err| err.to_string())?;
                id.clone()
            }
            None => builder.add_field(field_input.kind),
        };
        builder
            .update_field(&id, |field| apply_overrides(field_input, field))
            .map_err(|err| err.to_string())?;
        ids.push(id);
    }

    for (field_input, id) in input.fields.iter().zip(&ids) {
        for rule in &field_input.rules {
            builder
                .add_rule(id, rule.operator, rule.value.clone(), rule.target.clone())
                .map_err(|err| err.to_string())?;
        }
    }

    let schema = builder.finish();
    if let Some(issue) = check_schema(&schema).into_iter().next() {
        return Err(issue.message);
    }

    Ok(GeneratedBundle {
        answers_schema: answers_schema(&schema),
        examples: example_answers(&schema),
        schema,
    })
}

fn apply_overrides(input: &FieldInput, field: &mut form_spec::FieldDefinition) {
    if let Some(title) = &input.title {
        field.title = title.clone();
    }
    if input.subtitle.is_some() {
        field.subtitle = input.subtitle.clone();
    }
    if input.placeholder.is_some() {
        field.placeholder = input.placeholder.clone();
    }
    field.required = input.required;
    if input.max_length.is_some() {
        field.max_length = input.max_length;
    }
    if let Some(options) = &input.options {
        field.options = options.iter().cloned().map(OptionInput::into_option).collect();
    }
    field.multi_select = input.multi_select;
    field.min_date = input.min_date.clone();
    field.max_date = input.max_date.clone();
    if input.default_value.is_some() {
        field.default_value = input.default_value.clone();
    }
}

fn validate_input(input: &GenerationInput) -> Result<(), String> {
    if input.dir_name.trim().is_empty() {
        return Err("dir_name must be provided".into());
    }
    let mut components = Path::new(&input.dir_name).components();
    if !matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) {
        return Err(format!(
            "dir_name '{}' must be a single directory name",
            input.dir_name
        ));
    }
    if input.form.id.trim().is_empty() {
        return Err("form.id is required".into());
    }
    if input.fields.is_empty() {
        return Err("at least one field must be defined".into());
    }

    let mut seen = HashSet::new();
    for field in &input.fields {
        if let Some(id) = &field.id {
            if id.trim().is_empty() {
                return Err("field id cannot be empty".into());
            }
            if !seen.insert(id.as_str()) {
                return Err(format!("duplicate field id '{}'", id));
            }
        }
    }

    for field in &input.fields {
        for rule in &field.rules {
            if rule.target != SUBMIT_TARGET && !seen.contains(rule.target.as_str()) {
                return Err(format!(
                    "rule on '{}' targets unknown field '{}'",
                    field.id.as_deref().unwrap_or("<generated>"),
                    rule.target
                ));
            }
        }
    }

    Ok(())
}

/// Serialize the bundle to disk.
pub fn write_bundle(
    bundle: &GeneratedBundle,
    input: &GenerationInput,
    out_root: &Path,
) -> io::Result<PathBuf> {
    let bundle_dir = out_root.join(&input.dir_name);
    let forms_dir = bundle_dir.join("forms");
    let examples_dir = bundle_dir.join("examples");
    let schemas_dir = bundle_dir.join("schemas");

    fs::create_dir_all(&forms_dir)?;
    fs::create_dir_all(&examples_dir)?;
    fs::create_dir_all(&schemas_dir)?;

    let base_name = sanitize_file_name(&input.form.id);

    write_json(
        &forms_dir.join(format!("{}.form.json", base_name)),
        &bundle.schema,
    )?;
    write_json(
        &examples_dir.join(format!("{}.answers.example.json", base_name)),
        &bundle.examples,
    )?;
    write_json(
        &schemas_dir.join(format!("{}.answers.schema.json", base_name)),
        &bundle.answers_schema,
    )?;

    let readme_path = bundle_dir.join("README.md");
    fs::write(readme_path, build_readme(bundle, input, &base_name))?;

    Ok(bundle_dir)
}

fn sanitize_file_name(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "bundle".into()
    } else {
        cleaned
    }
}

fn write_json(path: &Path, value: &impl Serialize) -> io::Result<()> {
    let contents = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    fs::write(path, contents)
}

fn build_readme(bundle: &GeneratedBundle, input: &GenerationInput, base: &str) -> String {
    let summary = input
        .summary_md
        .as_deref()
        .unwrap_or("Generated by `formflow`.");
    let description = input
        .form
        .description
        .as_deref()
        .unwrap_or("No description provided.");
    let branching: BTreeMap<&str, usize> = bundle
        .schema
        .fields
        .iter()
        .filter_map(|field| {
            field
                .logic
                .as_ref()
                .map(|logic| (field.id.as_str(), logic.rules.len()))
        })
        .collect();
    let branching = if branching.is_empty() {
        "Fields are asked in order.".to_string()
    } else {
        branching
            .iter()
            .map(|(id, count)| format!("- `{}`: {} rule(s)", id, count))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let branching = if has_branching(&bundle.schema) {
        format!("{}\n\n{}", branching, BRANCHING_NOTE)
    } else {
        branching
    };

    format!(
        "# {title}\n\n{description}\n\nFields: {count}\n\n## Summary\n\n{summary}\n\n## Branching\n\n{branching}\n\n## Files\n\n- `forms/{base}.form.json`\n- `examples/{base}.answers.example.json`\n- `schemas/{base}.answers.schema.json`\n\nValidate the generated answers with:\n\n```\nformflow validate --schema forms/{base}.form.json --answers examples/{base}.answers.example.json\n```\n",
        title = input.form.title,
        description = description,
        count = bundle.schema.fields.len(),
        summary = summary,
        branching = branching,
        base = base,
    )
}

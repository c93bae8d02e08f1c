use thiserror::Error;
use tracing::debug;

use crate::answers::AnswerValue;
use crate::ids::{new_field_id, new_rule_id};
use crate::spec::{
    ConditionalRule, FieldDefinition, FieldLogic, FieldOption, FieldType, FormSchema,
    RuleOperator, ThankYouScreenConfig, WelcomeScreenConfig,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("field '{0}' does not exist")]
    UnknownField(String),
    #[error("rule '{rule}' does not exist on field '{field}'")]
    UnknownRule { field: String, rule: String },
    #[error("position {index} is out of range for {len} fields")]
    OutOfRange { index: usize, len: usize },
    #[error("field id '{0}' is already in use")]
    DuplicateId(String),
}

/// Palette entry: the configuration a freshly dropped field starts with.
pub fn template(kind: FieldType) -> FieldDefinition {
    let mut field = FieldDefinition::new(String::new(), kind, "");
    let (title, placeholder) = match kind {
        FieldType::Text => ("Text Field", Some("Enter text...")),
        FieldType::Email => ("Email Address", Some("Enter email...")),
        FieldType::Tel => ("Phone Number", Some("Enter phone number...")),
        FieldType::Number => ("Number Field", Some("Enter number...")),
        FieldType::Textarea => ("Long Text", Some("Enter your response...")),
        FieldType::Radio | FieldType::Select => ("Select an option", None),
        FieldType::Checkbox => ("Checkbox Field", None),
        FieldType::Date => ("Date", None),
        FieldType::File => ("File Upload", None),
    };
    field.title = title.into();
    field.placeholder = placeholder.map(String::from);

    match kind {
        FieldType::Tel => field.max_length = Some(15),
        FieldType::Radio | FieldType::Select => {
            field.options = (1..=3)
                .map(|n| FieldOption::new(format!("Option {}", n), format!("option{}", n)))
                .collect();
        }
        FieldType::Checkbox => field.default_value = Some(AnswerValue::Bool(false)),
        _ => {}
    }

    field
}

/// Editing surface the builder UI drives; reordering is plain sequence surgery.
#[derive(Debug, Clone, Default)]
pub struct FormBuilder {
    schema: FormSchema,
}

impl FormBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_schema(schema: FormSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn finish(self) -> FormSchema {
        self.schema
    }

    pub fn set_metadata(
        &mut self,
        id: Option<String>,
        title: Option<String>,
        description: Option<String>,
    ) {
        self.schema.id = id;
        self.schema.title = title;
        self.schema.description = description;
    }

    /// Appends a templated field and returns its generated id.
    pub fn add_field(&mut self, kind: FieldType) -> String {
        let index = self.schema.fields.len();
        self.insert_template(kind, index)
    }

    /// Inserts a templated field at the drop position; positions past the end append.
    pub fn insert_field(&mut self, kind: FieldType, position: usize) -> String {
        let index = position.min(self.schema.fields.len());
        self.insert_template(kind, index)
    }

    fn insert_template(&mut self, kind: FieldType, index: usize) -> String {
        let mut field = template(kind);
        field.id = new_field_id();
        let id = field.id.clone();
        self.schema.fields.insert(index, field);
        id
    }

    /// Inserts a fully specified field, keeping ids unique.
    pub fn push_field(&mut self, field: FieldDefinition) -> Result<(), BuildError> {
        if self.schema.field(&field.id).is_some() {
            return Err(BuildError::DuplicateId(field.id));
        }
        self.schema.fields.push(field);
        Ok(())
    }

    /// Moves the field at `from` so it ends up at index `to`.
    pub fn move_field(&mut self, from: usize, to: usize) -> Result<(), BuildError> {
        let len = self.schema.fields.len();
        for index in [from, to] {
            if index >= len {
                return Err(BuildError::OutOfRange { index, len });
            }
        }
        let field = self.schema.fields.remove(from);
        self.schema.fields.insert(to, field);
        Ok(())
    }

    /// Removes a field and every rule that pointed at it.
    pub fn remove_field(&mut self, id: &str) -> Result<FieldDefinition, BuildError> {
        let index = self
            .schema
            .position_of(id)
            .ok_or_else(|| BuildError::UnknownField(id.to_string()))?;
        let removed = self.schema.fields.remove(index);

        for field in &mut self.schema.fields {
            if let Some(logic) = &mut field.logic {
                logic.rules.retain(|rule| rule.target_field_id != id);
                if logic.rules.is_empty() {
                    field.logic = None;
                }
            }
        }
        Ok(removed)
    }

    /// Edits a field in place. The id is fixed at creation and restored if
    /// `update` changes it.
    pub fn update_field<F>(&mut self, id: &str, update: F) -> Result<(), BuildError>
    where
        F: FnOnce(&mut FieldDefinition),
    {
        let field = self
            .schema
            .fields
            .iter_mut()
            .find(|field| field.id == id)
            .ok_or_else(|| BuildError::UnknownField(id.to_string()))?;
        update(field);
        if field.id != id {
            debug!(field_id = id, attempted = %field.id, "field id is immutable; restored");
            field.id = id.to_string();
        }
        Ok(())
    }

    /// Appends a branching rule to `field_id` and returns the rule id.
    pub fn add_rule(
        &mut self,
        field_id: &str,
        operator: RuleOperator,
        value: impl Into<String>,
        target_field_id: impl Into<String>,
    ) -> Result<String, BuildError> {
        let rule = ConditionalRule::new(new_rule_id(), operator, value, target_field_id);
        let rule_id = rule.id.clone();
        self.update_field(field_id, |field| {
            field
                .logic
                .get_or_insert_with(FieldLogic::default)
                .rules
                .push(rule);
        })?;
        Ok(rule_id)
    }

    /// Drops one rule; logic is cleared once no rules remain.
    pub fn remove_rule(&mut self, field_id: &str, rule_id: &str) -> Result<(), BuildError> {
        let mut found = false;
        self.update_field(field_id, |field| {
            if let Some(logic) = &mut field.logic {
                let before = logic.rules.len();
                logic.rules.retain(|rule| rule.id != rule_id);
                found = logic.rules.len() != before;
                if logic.rules.is_empty() {
                    field.logic = None;
                }
            }
        })?;
        if found {
            Ok(())
        } else {
            Err(BuildError::UnknownRule {
                field: field_id.to_string(),
                rule: rule_id.to_string(),
            })
        }
    }

    pub fn set_welcome(&mut self, welcome: WelcomeScreenConfig) {
        self.schema.welcome_screen = welcome;
    }

    pub fn set_thank_you(&mut self, thank_you: ThankYouScreenConfig) {
        self.schema.thank_you_screen = thank_you;
    }
}

pub mod field;
pub mod form;
pub mod logic;

pub use field::{AnswerShape, FieldDefinition, FieldOption, FieldType};
pub use form::{FlowSettings, FormSchema, ThankYouScreenConfig, WelcomeScreenConfig};
pub use logic::{ConditionalRule, FieldLogic, RuleOperator, RuleTarget, SUBMIT_TARGET};

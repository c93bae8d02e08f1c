use std::cell::RefCell;

use form_spec::{
    AnswerValue, ConditionalRule, Direction, FieldDefinition, FieldLogic, FieldType, FlowRuntime,
    FormSchema, PendingTransition, Position, RuleOperator, StateError, Step, Submission,
    SubmissionError, Transition,
};

fn fixture(name: &str) -> &'static str {
    match name {
        "contact_flow" => include_str!("fixtures/contact_flow.json"),
        "branching_flow" => include_str!("fixtures/branching_flow.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn load(name: &str) -> FormSchema {
    serde_json::from_str(fixture(name)).expect("fixture schema")
}

/// Collects every submission it receives.
#[derive(Default)]
struct Recorder {
    received: RefCell<Vec<Submission>>,
}

impl Recorder {
    fn accept(&self) -> impl FnMut(&Submission) -> Result<(), SubmissionError> + '_ {
        |submission: &Submission| {
            self.received.borrow_mut().push(submission.clone());
            Ok(())
        }
    }

    fn count(&self) -> usize {
        self.received.borrow().len()
    }
}

fn accept_all(_: &Submission) -> Result<(), SubmissionError> {
    Ok(())
}

fn reject(_: &Submission) -> Result<(), SubmissionError> {
    Err(SubmissionError::new("network unreachable"))
}

fn name_only_schema() -> FormSchema {
    FormSchema::new(vec![
        FieldDefinition::new("name", FieldType::Text, "Name").required(),
    ])
}

#[test]
fn end_to_end_single_required_field() {
    let recorder = Recorder::default();
    let mut submit = recorder.accept();
    let mut runtime = FlowRuntime::new(name_only_schema());
    assert_eq!(runtime.step(), Step::Intro);
    assert_eq!(runtime.current_step_index(), -1);

    let moved = runtime.advance(&mut submit).expect("advance");
    assert_eq!(moved, Transition::Moved(Step::Question(0)));

    assert!(runtime.set_answer("name", ""));
    let blocked = runtime.advance(&mut submit).expect("advance");
    assert_eq!(blocked, Transition::Blocked("This field is required".into()));
    assert_eq!(runtime.step(), Step::Question(0));
    assert_eq!(runtime.current_error(), Some("This field is required"));

    assert!(runtime.set_answer("name", "Ann"));
    let done = runtime.advance(&mut submit).expect("advance");
    assert!(matches!(done, Transition::Submitted(_)));
    assert_eq!(runtime.step(), Step::Submitted);
    assert_eq!(runtime.current_step_index(), 1);
    drop(submit);

    let received = recorder.received.borrow();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].answers.len(), 1);
    assert_eq!(received[0].answers["name"], AnswerValue::text("Ann"));
}

#[test]
fn error_is_recomputed_on_every_attempt() {
    let mut runtime = FlowRuntime::new(FormSchema::new(vec![FieldDefinition::new(
        "email",
        FieldType::Email,
        "Email",
    )
    .required()]));
    let mut submit = accept_all;
    runtime.advance(&mut submit).expect("intro");

    runtime.advance(&mut submit).expect("blocked");
    assert_eq!(runtime.current_error(), Some("This field is required"));

    runtime.set_answer("email", "not-an-email");
    runtime.advance(&mut submit).expect("blocked");
    assert_eq!(
        runtime.current_error(),
        Some("Please enter a valid email address")
    );
}

#[test]
fn submitted_is_terminal_and_submits_once() {
    let recorder = Recorder::default();
    let mut submit = recorder.accept();
    let mut runtime = FlowRuntime::new(FormSchema::default());

    let outcome = runtime.advance(&mut submit).expect("advance");
    assert!(matches!(outcome, Transition::Submitted(_)));
    assert_eq!(runtime.advance(&mut submit), Ok(Transition::Ignored));
    assert_eq!(runtime.retreat(), Transition::Ignored);
    drop(submit);
    assert_eq!(recorder.count(), 1);
}

#[test]
fn reentrant_advance_during_transition_is_ignored() {
    let recorder = Recorder::default();
    let mut submit = recorder.accept();
    let mut runtime = FlowRuntime::new(FormSchema::new(vec![
        FieldDefinition::new("a", FieldType::Text, "A"),
        FieldDefinition::new("b", FieldType::Text, "B"),
    ]));

    assert_eq!(runtime.begin_advance(), Transition::Pending);
    assert!(runtime.is_transitioning());
    assert_eq!(runtime.begin_advance(), Transition::Ignored);
    assert_eq!(runtime.advance(&mut submit), Ok(Transition::Ignored));
    assert_eq!(runtime.begin_retreat(), Transition::Ignored);
    assert_eq!(runtime.step(), Step::Intro);

    assert_eq!(
        runtime.complete(&mut submit),
        Ok(Transition::Moved(Step::Question(0)))
    );
    assert_eq!(runtime.complete(&mut submit), Ok(Transition::Ignored));
    assert_eq!(runtime.step(), Step::Question(0));
}

#[test]
fn answers_are_rejected_for_steps_not_displayed() {
    let mut runtime = FlowRuntime::new(FormSchema::new(vec![
        FieldDefinition::new("a", FieldType::Text, "A"),
        FieldDefinition::new("b", FieldType::Text, "B"),
    ]));
    let mut submit = accept_all;

    assert!(!runtime.set_answer("a", "too early"));
    runtime.advance(&mut submit).expect("intro");
    assert!(!runtime.set_answer("b", "wrong step"));
    assert!(runtime.set_answer("a", "first"));

    assert_eq!(runtime.begin_advance(), Transition::Pending);
    assert!(!runtime.set_answer("a", "during exit animation"));
    runtime.complete(&mut submit).expect("commit");

    assert_eq!(runtime.answers()["a"], AnswerValue::text("first"));
    assert!(!runtime.answers().contains_key("b"));
}

#[test]
fn back_navigation_after_branch_returns_to_branch_origin() {
    let mut runtime = FlowRuntime::new(FormSchema::new(vec![
        FieldDefinition::new("a", FieldType::Text, "A").with_logic(FieldLogic::new(vec![
            ConditionalRule::new("r1", RuleOperator::Equals, "yes", "c"),
        ])),
        FieldDefinition::new("b", FieldType::Text, "B"),
        FieldDefinition::new("c", FieldType::Text, "C"),
    ]));
    let mut submit = accept_all;

    runtime.advance(&mut submit).expect("intro");
    runtime.set_answer("a", "yes");
    assert_eq!(
        runtime.advance(&mut submit),
        Ok(Transition::Moved(Step::Question(2)))
    );

    assert_eq!(runtime.retreat(), Transition::Moved(Step::Question(0)));
    assert_eq!(runtime.direction(), Direction::Backward);
    assert_eq!(runtime.retreat(), Transition::Moved(Step::Intro));
    assert_eq!(runtime.retreat(), Transition::Ignored);
    assert_eq!(runtime.step(), Step::Intro);
}

#[test]
fn retreat_is_never_blocked_by_invalid_answer() {
    let mut runtime = FlowRuntime::new(FormSchema::new(vec![
        FieldDefinition::new("a", FieldType::Text, "A"),
        FieldDefinition::new("phone", FieldType::Tel, "Phone"),
    ]));
    let mut submit = accept_all;
    runtime.advance(&mut submit).expect("intro");
    runtime.advance(&mut submit).expect("a");

    runtime.set_answer("phone", "12345");
    assert_eq!(
        runtime.advance(&mut submit),
        Ok(Transition::Blocked(
            "Please enter a valid 10-digit phone number".into()
        ))
    );
    assert_eq!(runtime.retreat(), Transition::Moved(Step::Question(0)));
    assert_eq!(runtime.current_error(), None);
}

#[test]
fn failed_submission_keeps_flow_retryable() {
    let mut runtime = FlowRuntime::new(name_only_schema());
    let mut ok = accept_all;
    runtime.advance(&mut ok).expect("intro");
    runtime.set_answer("name", "Ann");

    let mut failing = reject;
    let err = runtime.advance(&mut failing).expect_err("rejected");
    assert_eq!(err.message, "network unreachable");
    assert_eq!(runtime.step(), Step::Question(0));
    assert!(!runtime.is_submitted());
    assert!(!runtime.is_transitioning());

    let recorder = Recorder::default();
    let mut submit = recorder.accept();
    let outcome = runtime.advance(&mut submit).expect("retry");
    assert!(matches!(outcome, Transition::Submitted(_)));
    drop(submit);
    assert_eq!(recorder.count(), 1);
}

#[test]
fn defaults_seed_answers_and_checkbox_default_blocks_required() {
    let mut runtime = FlowRuntime::new(load("contact_flow"));
    assert_eq!(runtime.answers()["terms"], AnswerValue::Bool(false));
    assert_eq!(runtime.answers()["fullName"], AnswerValue::text(""));
    assert!(!runtime.answers().contains_key("gender"));

    let mut submit = accept_all;
    runtime.advance(&mut submit).expect("intro");
    runtime.set_answer("fullName", "Ann Lee");
    runtime.advance(&mut submit).expect("name");
    runtime.set_answer("email", "ann@example.com");
    runtime.advance(&mut submit).expect("email");
    runtime.advance(&mut submit).expect("optional phone");
    runtime.set_answer("gender", "Female");
    runtime.advance(&mut submit).expect("gender");

    assert_eq!(runtime.step(), Step::Question(4));
    assert_eq!(
        runtime.advance(&mut submit),
        Ok(Transition::Blocked("This field is required".into()))
    );
    runtime.set_answer("terms", true);
    assert_eq!(
        runtime.advance(&mut submit),
        Ok(Transition::Moved(Step::Question(5)))
    );
    assert_eq!(runtime.progress(), (6, 6));
}

#[test]
fn branching_fixture_submits_through_rule() {
    let recorder = Recorder::default();
    let mut submit = recorder.accept();
    let mut runtime = FlowRuntime::new(load("branching_flow"));

    runtime.advance(&mut submit).expect("intro");
    runtime.set_answer("attending", "yes");
    runtime.advance(&mut submit).expect("attending");
    assert_eq!(runtime.step(), Step::Question(1));

    runtime.set_answer("sessions", AnswerValue::set(["keynote"]));
    let outcome = runtime.advance(&mut submit).expect("sessions");
    assert!(matches!(outcome, Transition::Submitted(_)));
    drop(submit);

    let received = recorder.received.borrow();
    assert_eq!(received[0].form_id.as_deref(), Some("event-signup"));
    assert!(!received[0].answers.contains_key("diet"));
}

#[test]
fn state_round_trips_through_json() {
    let mut runtime = FlowRuntime::new(load("branching_flow"));
    let mut submit = accept_all;
    runtime.advance(&mut submit).expect("intro");
    runtime.set_answer("attending", "no");
    runtime.advance(&mut submit).expect("attending");

    let json = serde_json::to_value(runtime.state()).expect("state json");
    assert_eq!(json["currentStepIndex"], 2);
    assert_eq!(json["history"], serde_json::json!([-1, 0]));

    let state = serde_json::from_value(json).expect("state");
    let mut resumed = FlowRuntime::from_state(load("branching_flow"), state).expect("resume");
    assert_eq!(resumed.step(), Step::Question(2));
    assert_eq!(resumed.retreat(), Transition::Moved(Step::Question(0)));
}

#[test]
fn from_state_rejects_inconsistent_snapshots() {
    let runtime = FlowRuntime::new(load("branching_flow"));
    let mut state = runtime.into_state();
    state.current_step_index = 9;
    assert!(FlowRuntime::from_state(load("branching_flow"), state.clone()).is_err());

    state.current_step_index = 4;
    assert!(FlowRuntime::from_state(load("branching_flow"), state.clone()).is_err());

    state.submitted = true;
    assert!(FlowRuntime::from_state(load("branching_flow"), state).is_ok());
}

#[test]
fn from_state_rejects_pending_transition_on_submitted_flow() {
    let mut state = FlowRuntime::new(load("branching_flow")).into_state();
    state.current_step_index = 4;
    state.submitted = true;
    state.history = vec![Position::Welcome, Position::Field(0)];

    for pending in [
        PendingTransition::Submit,
        PendingTransition::Advance {
            to: Position::Field(0),
        },
        PendingTransition::Retreat {
            to: Position::Field(0),
        },
    ] {
        state.pending = Some(pending);
        assert_eq!(
            FlowRuntime::from_state(load("branching_flow"), state.clone()).err(),
            Some(StateError::PendingAfterSubmit)
        );
    }
}

#[test]
fn resumed_submit_on_submitted_flow_never_reaches_submitter() {
    let json = serde_json::json!({
        "currentStepIndex": 1,
        "submitted": true,
        "pending": { "kind": "submit" }
    });
    let state = serde_json::from_value(json).expect("state");
    assert_eq!(
        FlowRuntime::from_state(name_only_schema(), state).err(),
        Some(StateError::PendingAfterSubmit)
    );
}

#[test]
fn from_state_requires_retreat_target_to_be_last_history_entry() {
    let mut state = FlowRuntime::new(load("branching_flow")).into_state();
    state.current_step_index = 2;
    state.history = vec![Position::Welcome, Position::Field(0)];

    state.pending = Some(PendingTransition::Retreat {
        to: Position::Field(1),
    });
    assert_eq!(
        FlowRuntime::from_state(load("branching_flow"), state.clone()).err(),
        Some(StateError::RetreatNotInHistory(1))
    );

    state.pending = Some(PendingTransition::Retreat {
        to: Position::Field(0),
    });
    let mut resumed = FlowRuntime::from_state(load("branching_flow"), state).expect("resume");
    let mut submit = accept_all;
    assert!(resumed.is_transitioning());
    assert_eq!(
        resumed.complete(&mut submit),
        Ok(Transition::Moved(Step::Question(0)))
    );
    assert_eq!(resumed.state().history, vec![Position::Welcome]);
}

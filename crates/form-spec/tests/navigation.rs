use form_spec::{
    AnswerMap, AnswerValue, ConditionalRule, FieldDefinition, FieldLogic, FieldType, FormSchema,
    NextStep, Position, RuleOperator, next_step, previous_step, resolve_path,
};

fn fixture(name: &str) -> &'static str {
    match name {
        "branching_flow" => include_str!("fixtures/branching_flow.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn text(id: &str) -> FieldDefinition {
    FieldDefinition::new(id, FieldType::Text, id.to_uppercase())
}

fn answers(pairs: &[(&str, AnswerValue)]) -> AnswerMap {
    pairs
        .iter()
        .map(|(id, value)| (id.to_string(), value.clone()))
        .collect()
}

#[test]
fn linear_navigation_walks_every_field() {
    let fields = vec![text("a"), text("b"), text("c")];
    let empty = AnswerMap::new();

    assert_eq!(next_step(Position::Welcome, &fields, &empty), NextStep::Field(0));
    assert_eq!(next_step(Position::Field(0), &fields, &empty), NextStep::Field(1));
    assert_eq!(next_step(Position::Field(1), &fields, &empty), NextStep::Field(2));
    assert_eq!(next_step(Position::Field(2), &fields, &empty), NextStep::Submit);
}

#[test]
fn welcome_of_empty_form_goes_straight_to_submit() {
    assert_eq!(
        next_step(Position::Welcome, &[], &AnswerMap::new()),
        NextStep::Submit
    );
}

#[test]
fn equals_rule_skips_to_target() {
    let fields = vec![
        text("a").with_logic(FieldLogic::new(vec![ConditionalRule::new(
            "r1",
            RuleOperator::Equals,
            "yes",
            "c",
        )])),
        text("b"),
        text("c"),
    ];

    let yes = answers(&[("a", "yes".into())]);
    assert_eq!(next_step(Position::Field(0), &fields, &yes), NextStep::Field(2));

    let no = answers(&[("a", "no".into())]);
    assert_eq!(next_step(Position::Field(0), &fields, &no), NextStep::Field(1));
}

#[test]
fn dangling_target_falls_back_to_linear() {
    let fields = vec![
        text("a").with_logic(FieldLogic::new(vec![ConditionalRule::new(
            "r1",
            RuleOperator::Equals,
            "yes",
            "does-not-exist",
        )])),
        text("b"),
    ];
    let yes = answers(&[("a", "yes".into())]);
    assert_eq!(next_step(Position::Field(0), &fields, &yes), NextStep::Field(1));
}

#[test]
fn dangling_target_on_last_field_submits() {
    let fields = vec![text("a").with_logic(FieldLogic::new(vec![ConditionalRule::new(
        "r1",
        RuleOperator::NotEquals,
        "x",
        "ghost",
    )]))];
    assert_eq!(
        next_step(Position::Field(0), &fields, &AnswerMap::new()),
        NextStep::Submit
    );
}

#[test]
fn submit_target_ends_flow_early() {
    let schema: FormSchema = serde_json::from_str(fixture("branching_flow")).expect("schema");
    let picked = answers(&[
        ("attending", "yes".into()),
        ("sessions", AnswerValue::set(["keynote", "workshop"])),
    ]);
    assert_eq!(
        next_step(Position::Field(1), &schema.fields, &picked),
        NextStep::Submit
    );

    let dinner = answers(&[
        ("attending", "yes".into()),
        ("sessions", AnswerValue::set(["keynote", "dinner"])),
    ]);
    assert_eq!(
        next_step(Position::Field(1), &schema.fields, &dinner),
        NextStep::Field(3)
    );
}

#[test]
fn resolved_path_follows_branches_and_dangling_fallbacks() {
    let schema: FormSchema = serde_json::from_str(fixture("branching_flow")).expect("schema");
    let declined = answers(&[
        ("attending", "no".into()),
        ("feedback", "More vegan food".into()),
    ]);
    let path = resolve_path(&schema, &declined);
    assert_eq!(path.field_ids(&schema), vec!["attending", "feedback", "diet"]);
}

#[test]
fn previous_step_follows_visited_history_not_index() {
    // Visited welcome, then field 0, then jumped to field 2.
    let history = vec![Position::Welcome, Position::Field(0)];
    assert_eq!(previous_step(&history), Some(Position::Field(0)));
    assert_eq!(previous_step(&history[..1]), Some(Position::Welcome));
    assert_eq!(previous_step(&[]), None);
}

use job_applier::{
    answer::{cache::AnswerCache, resolver::AnswerResolver},
    browser::driver::{ElementHandle, RawButton},
    form::{
        engine::{FormEngine, dismiss, run_application_form},
        form_config::FormConfig,
        form_model::{
            ApplyOutcome, FormState, REASON_APPLIED, REASON_FINISHED, REASON_NO_NEXT,
            REASON_STEP_LIMIT, REASON_STUCK,
        },
    },
    trace::logger::TraceLogger,
};

use crate::common::{
    fake_page::{
        FakePage, FakeStep, button, close_button, errored_text_control, fake_config, text_control,
    },
    source::ScriptedSource,
};

mod common;

fn run(page: &mut FakePage, source: &ScriptedSource, config: &FormConfig) -> ApplyOutcome {
    let mut cache = AnswerCache::in_memory();
    let mut resolver = AnswerResolver::new(&mut cache, source);
    run_application_form(page, &mut resolver, config, &TraceLogger::disabled()).unwrap()
}

fn success_step() -> FakeStep {
    FakeStep::new("Application sent").with_buttons(vec![button("#done", "Done"), close_button()])
}

// =========================================================================
// Successful completion
// =========================================================================

#[test]
fn terminal_header_ends_without_advancing() {
    let steps = vec![
        FakeStep::new("Contact info").with_control(text_control("#email", "Email", "")),
        success_step(),
    ];
    let mut page = FakePage::with_steps(steps);
    let source = ScriptedSource::new().reply("Email", "a@b.c");

    let outcome = run(&mut page, &source, &fake_config());
    assert_eq!(outcome, ApplyOutcome::applied(REASON_APPLIED));
    assert_eq!(page.clicks(), vec!["#next", "#close"]);
    assert_eq!(page.count("click:#done"), 0);
}

#[test]
fn vanished_dialog_counts_as_finished() {
    let steps = vec![
        FakeStep::new("Contact info").with_progress("0%"),
        FakeStep::new("Review your application").with_progress("100%"),
    ];
    let mut page = FakePage::with_steps(steps);
    let source = ScriptedSource::new();

    let outcome = run(&mut page, &source, &fake_config());
    assert_eq!(outcome, ApplyOutcome::applied(REASON_FINISHED));
    assert_eq!(page.count("click:#next"), 2);
}

#[test]
fn advance_is_scrolled_into_view_before_click() {
    let mut page = FakePage::with_steps(vec![FakeStep::new("Contact info")]);
    let source = ScriptedSource::new();

    run(&mut page, &source, &fake_config());
    let scroll = page.actions.iter().position(|a| a == "scroll:#next").unwrap();
    let click = page.actions.iter().position(|a| a == "click:#next").unwrap();
    assert!(scroll < click);
}

#[test]
fn fields_are_filled_before_advancing() {
    let steps = vec![FakeStep::new("Contact info").with_control(text_control("#city", "City", ""))];
    let mut page = FakePage::with_steps(steps);
    let source = ScriptedSource::new().reply("City", "Berlin");

    run(&mut page, &source, &fake_config());
    let typed = page.actions.iter().position(|a| a == "type:#city=Berlin").unwrap();
    let click = page.actions.iter().position(|a| a == "click:#next").unwrap();
    assert!(typed < click);
}

#[test]
fn next_disabled_until_filled_still_advances() {
    let disabled_next = RawButton {
        disabled: true,
        ..button("#next", "Next")
    };
    let steps = vec![
        FakeStep::new("Contact info")
            .with_control(text_control("#phone", "Phone", ""))
            .with_buttons(vec![disabled_next, close_button()]),
        success_step(),
    ];
    let mut page = FakePage::with_steps(steps);
    let source = ScriptedSource::new().reply("Phone", "123");

    let outcome = run(&mut page, &source, &fake_config());
    assert_eq!(outcome, ApplyOutcome::applied(REASON_APPLIED));
    assert_eq!(page.clicks(), vec!["#next", "#close"]);
    let typed = page.actions.iter().position(|a| a == "type:#phone=123").unwrap();
    let click = page.actions.iter().position(|a| a == "click:#next").unwrap();
    assert!(typed < click);
}

// =========================================================================
// Dead ends
// =========================================================================

#[test]
fn unchanged_step_is_stuck() {
    let step = FakeStep::new("Additional questions")
        .with_control(errored_text_control("#years", "Years", "", "Required"))
        .stuck();
    let mut page = FakePage::with_steps(vec![step]);
    let source = ScriptedSource::new();

    let outcome = run(&mut page, &source, &fake_config());
    assert_eq!(outcome, ApplyOutcome::failed(REASON_STUCK));
    assert_eq!(page.clicks(), vec!["#next", "#close"]);
    // Errored field without a value is never sent to the source
    assert_eq!(source.calls(), 0);
}

#[test]
fn stuck_dismissal_confirms_discard() {
    let step = FakeStep::new("Additional questions").stuck();
    let mut page = FakePage::with_steps(vec![step]).with_confirmation();
    let source = ScriptedSource::new();

    let outcome = run(&mut page, &source, &fake_config());
    assert_eq!(outcome.reason, REASON_STUCK);
    assert_eq!(page.clicks(), vec!["#next", "#close", "#confirm-discard"]);
    assert!(!page.confirmation_open);
}

#[test]
fn missing_advance_dismisses_exactly_once() {
    let step = FakeStep::new("Resume")
        .with_control(text_control("#phone", "Phone", ""))
        .with_buttons(vec![button("#upload", "Upload resume"), close_button()]);
    let mut page = FakePage::with_steps(vec![step]).with_confirmation();
    let source = ScriptedSource::new().reply("Phone", "+49 30 1234");

    let outcome = run(&mut page, &source, &fake_config());
    assert_eq!(outcome, ApplyOutcome::failed(REASON_NO_NEXT));
    assert_eq!(page.count("type:#phone=+49 30 1234"), 1);
    assert_eq!(page.count("click:#close"), 1);
    assert_eq!(page.count("click:#confirm-discard"), 1);
}

#[test]
fn missing_close_still_reports_outcome() {
    let step = FakeStep::new("Resume").with_buttons(vec![]);
    let mut page = FakePage::with_steps(vec![step]);
    let source = ScriptedSource::new();

    let outcome = run(&mut page, &source, &fake_config());
    assert_eq!(outcome, ApplyOutcome::failed(REASON_NO_NEXT));
    assert!(page.clicks().is_empty());
}

#[test]
fn step_limit_aborts_when_configured() {
    let steps = (1..=5)
        .map(|i| FakeStep::new(&format!("Step {}", i)))
        .collect();
    let mut page = FakePage::with_steps(steps);
    let source = ScriptedSource::new();
    let config = FormConfig {
        max_steps: Some(2),
        ..fake_config()
    };

    let outcome = run(&mut page, &source, &config);
    assert_eq!(outcome, ApplyOutcome::failed(REASON_STEP_LIMIT));
    assert_eq!(page.clicks(), vec!["#next", "#next", "#close"]);
}

#[test]
fn engine_reports_terminal_state() {
    let mut page = FakePage::with_steps(vec![FakeStep::new("Contact").stuck()]);
    let source = ScriptedSource::new();
    let config = fake_config();
    let tracer = TraceLogger::disabled();
    let mut cache = AnswerCache::in_memory();
    let mut resolver = AnswerResolver::new(&mut cache, &source);

    let mut engine = FormEngine::new(&config, &tracer);
    engine.run(&mut page, &mut resolver).unwrap();
    assert_eq!(engine.state, FormState::Stuck);
    assert_eq!(engine.step, 1);
}

// =========================================================================
// Errors
// =========================================================================

#[test]
fn answer_source_error_escapes_engine() {
    let steps = vec![FakeStep::new("Contact").with_control(text_control("#email", "Email", ""))];
    let mut page = FakePage::with_steps(steps);
    let source = ScriptedSource::failing();
    let mut cache = AnswerCache::in_memory();
    let mut resolver = AnswerResolver::new(&mut cache, &source);

    let result = run_application_form(&mut page, &mut resolver, &fake_config(), &TraceLogger::disabled());
    assert!(result.is_err());
    assert!(page.clicks().is_empty());
}

#[test]
fn broken_driver_escapes_engine() {
    let mut page = FakePage::with_steps(vec![FakeStep::new("Contact")]);
    page.broken = true;
    let source = ScriptedSource::new();
    let mut cache = AnswerCache::in_memory();
    let mut resolver = AnswerResolver::new(&mut cache, &source);

    let result = run_application_form(&mut page, &mut resolver, &fake_config(), &TraceLogger::disabled());
    assert!(result.is_err());
}

// =========================================================================
// Dismiss sub-protocol
// =========================================================================

#[test]
fn dismiss_without_controls_reads_container() {
    let mut page = FakePage::with_steps(vec![FakeStep::new("Contact")]).with_confirmation();
    let config = fake_config();
    let container = ElementHandle::new(&config.container_selector);

    dismiss(&mut page, &config, Some(&container), None);
    assert_eq!(page.clicks(), vec!["#close", "#confirm-discard"]);
    assert!(!page.form_open);
}

#[test]
fn dismiss_with_nothing_is_a_no_op() {
    let mut page = FakePage::default();
    dismiss(&mut page, &fake_config(), None, None);
    assert!(page.actions.is_empty());
}

#[test]
fn confirmation_without_discard_uses_close() {
    let mut page = FakePage::with_steps(vec![FakeStep::new("Contact").stuck()]);
    page.confirmation = Some(vec![RawButton {
        selector: "#confirm-close".into(),
        aria_label: Some("Dismiss".into()),
        ..RawButton::default()
    }]);
    let source = ScriptedSource::new();

    run(&mut page, &source, &fake_config());
    assert_eq!(page.clicks(), vec!["#next", "#close", "#confirm-close"]);
}

// =========================================================================
// Trace
// =========================================================================

#[test]
fn transitions_are_traced_as_jsonl() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.jsonl");
    let tracer = TraceLogger::new(path.to_str().unwrap());

    let mut page = FakePage::with_steps(vec![FakeStep::new("Contact"), success_step()]);
    let source = ScriptedSource::new();
    let config = fake_config();
    let mut cache = AnswerCache::in_memory();
    let mut resolver = AnswerResolver::new(&mut cache, &source);

    FormEngine::new(&config, &tracer)
        .with_job("job-42")
        .run(&mut page, &mut resolver)
        .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let events: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert!(events.len() >= 4);
    assert!(events.iter().all(|e| e["job"] == "job-42"));
    let last = events.last().unwrap();
    assert_eq!(last["state"], "APPLIED");
    assert_eq!(last["reason"], REASON_APPLIED);
    assert!(events.iter().any(|e| e["header"] == "Contact"));
}

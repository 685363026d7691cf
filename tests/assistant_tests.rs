use std::time::Duration;

use pdfmentor::chat::{PLACEHOLDER_TEXT, REPLY_ERROR_TEXT, Role};
use pdfmentor::event_source::EventSource;
use pdfmentor::handoff::HandoffSlot;
use pdfmentor::main_app::{App, View};
use pdfmentor::quiz::QuizPhase;
use pdfmentor::settings::Settings;
use pdfmentor::test_utils::test_helpers::{
    TestScenarioBuilder, capture_terminal_state, create_test_terminal,
};
use pdfmentor::test_utils::{FakeEngine, ScriptedBackend, minimal_pdf_bytes};
use ratatui::Terminal;
use ratatui::backend::TestBackend;

const SETTLE: Duration = Duration::from_secs(5);

// Page area starts at (1, 1) inside the viewer border. At the default
// zoom the first text line sits on page row 7.
const FIRST_LINE_ROW: u16 = 8;
const LINE_START_COL: u16 = 3;
const LINE_END_COL: u16 = 71;

fn app_with(backend: ScriptedBackend) -> (App, Terminal<TestBackend>) {
    let mut app = App::new(
        Settings::default(),
        Some(Box::new(FakeEngine::with_pages(2))),
        Box::new(backend),
        HandoffSlot::ephemeral(),
    );
    app.open_bytes(minimal_pdf_bytes()).unwrap();
    app.wait_for_background(SETTLE);

    let mut terminal = create_test_terminal(80, 24);
    terminal.draw(|f| app.draw(f)).unwrap();
    (app, terminal)
}

/// Feed events one at a time, redrawing in between like the real loop
fn feed(app: &mut App, terminal: &mut Terminal<TestBackend>, scenario: TestScenarioBuilder) {
    let mut source = scenario.build();
    while source.poll(Duration::ZERO).unwrap() {
        let event = source.read().unwrap();
        app.handle_event(&event);
        terminal.draw(|f| app.draw(f)).unwrap();
    }
}

fn select_first_line() -> TestScenarioBuilder {
    TestScenarioBuilder::new().drag(
        (LINE_START_COL, FIRST_LINE_ROW),
        (LINE_END_COL, FIRST_LINE_ROW),
    )
}

#[test]
fn right_click_without_selection_shows_nothing() {
    let (mut app, mut terminal) = app_with(ScriptedBackend::replying("hi"));
    feed(
        &mut app,
        &mut terminal,
        TestScenarioBuilder::new().right_click(20, FIRST_LINE_ROW),
    );
    assert!(!app.menu().is_visible());

    // A plain click is not a selection either
    feed(
        &mut app,
        &mut terminal,
        TestScenarioBuilder::new()
            .left_click(20, FIRST_LINE_ROW)
            .right_click(20, FIRST_LINE_ROW),
    );
    assert!(!app.menu().is_visible());
}

#[test]
fn right_click_on_selection_opens_menu_at_pointer() {
    let (mut app, mut terminal) = app_with(ScriptedBackend::replying("hi"));
    feed(
        &mut app,
        &mut terminal,
        select_first_line().right_click(30, 12),
    );

    assert!(app.menu().is_visible());
    assert_eq!(app.menu().popup_area().map(|a| (a.x, a.y)), Some((30, 12)));
    assert_eq!(app.menu().stored_text(), Some("Page 1 line 1"));

    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains("Explain"));
    assert!(screen.contains("Generate quiz"));
}

#[test]
fn explain_puts_context_before_the_prompt_and_one_reply() {
    let backend = ScriptedBackend::replying("It is the first line.");
    let calls = backend.calls();
    let (mut app, mut terminal) = app_with(backend);

    feed(
        &mut app,
        &mut terminal,
        select_first_line()
            .right_click(30, 12)
            .press_enter(),
    );
    app.wait_for_background(SETTLE);

    let messages = app.chat().messages();
    let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::Context, Role::User, Role::Bot]);
    assert_eq!(messages[0].text, "Context: \"Page 1 line 1\"");
    assert_eq!(messages[1].text, "Explain this:");
    assert_eq!(messages[2].text, "It is the first line.");
    assert!(messages.iter().all(|m| !m.placeholder));

    let calls = calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![(
            "Explain this:".to_string(),
            Some("Page 1 line 1".to_string())
        )]
    );
}

#[test]
fn failed_backend_leaves_one_error_and_no_placeholder() {
    let (mut app, mut terminal) = app_with(ScriptedBackend::failing());
    feed(
        &mut app,
        &mut terminal,
        TestScenarioBuilder::new()
            .press_char('c')
            .type_text("what is this page about?")
            .press_enter(),
    );
    app.wait_for_background(SETTLE);

    let messages = app.chat().messages();
    let errors = messages
        .iter()
        .filter(|m| m.text == REPLY_ERROR_TEXT)
        .count();
    assert_eq!(errors, 1);
    assert!(
        messages
            .iter()
            .all(|m| !m.placeholder && m.text != PLACEHOLDER_TEXT)
    );
    assert_eq!(app.chat().pending_replies(), 0);
}

#[test]
fn typed_message_gets_a_reply_in_order() {
    let (mut app, mut terminal) = app_with(ScriptedBackend::replying("Sure."));
    feed(
        &mut app,
        &mut terminal,
        TestScenarioBuilder::new()
            .press_char('c')
            .type_text("help")
            .press_enter()
            .type_text("   ")
            .press_enter(),
    );
    app.wait_for_background(SETTLE);
    terminal.draw(|f| app.draw(f)).unwrap();

    let texts: Vec<&str> = app.chat().messages().iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["help", "Sure."]);
    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains("Assistant"));
    assert!(screen.contains("Sure."));
}

#[test]
fn click_outside_menu_dismisses_it() {
    let (mut app, mut terminal) = app_with(ScriptedBackend::replying("hi"));
    feed(
        &mut app,
        &mut terminal,
        select_first_line()
            .right_click(30, 12)
            .left_click(2, 20),
    );
    assert!(!app.menu().is_visible());
    assert_eq!(app.menu().stored_text(), None);
    assert_eq!(app.view(), View::Viewer);
}

#[test]
fn dismissed_menu_forgets_the_selection() {
    let (mut app, mut terminal) = app_with(ScriptedBackend::replying("hi"));
    feed(
        &mut app,
        &mut terminal,
        select_first_line()
            .right_click(30, 12)
            .left_click(2, 20)
            .right_click(40, 15),
    );
    assert!(!app.menu().is_visible());
    assert_eq!(app.menu().stored_text(), None);
    assert_eq!(app.viewer().selected_text(), None);
}

#[test]
fn escape_dismiss_also_clears_the_selection() {
    let (mut app, mut terminal) = app_with(ScriptedBackend::replying("hi"));
    feed(
        &mut app,
        &mut terminal,
        select_first_line()
            .right_click(30, 12)
            .press_esc()
            .right_click(30, 12),
    );
    assert!(!app.menu().is_visible());
}

#[test]
fn right_click_elsewhere_moves_the_open_menu() {
    let (mut app, mut terminal) = app_with(ScriptedBackend::replying("hi"));
    feed(
        &mut app,
        &mut terminal,
        select_first_line()
            .right_click(30, 12)
            .right_click(55, 18),
    );
    assert!(app.menu().is_visible());
    assert_eq!(app.menu().popup_area().map(|a| (a.x, a.y)), Some((55, 18)));
    assert_eq!(app.menu().stored_text(), Some("Page 1 line 1"));
}

#[test]
fn generate_quiz_hands_selection_to_quiz_page() {
    let (mut app, mut terminal) = app_with(ScriptedBackend::replying("hi"));
    feed(
        &mut app,
        &mut terminal,
        select_first_line()
            .right_click(30, 12)
            .press_char('j')
            .press_enter(),
    );

    assert_eq!(app.view(), View::Quiz);
    assert_eq!(*app.quiz().phase(), QuizPhase::Setup);
    assert_eq!(app.quiz().source_text(), Some("Page 1 line 1"));
    // Read-once
    assert_eq!(app.handoff().peek().unwrap(), None);

    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains("Page 1 line 1"));
    assert!(screen.contains("Multiple choice"));
}

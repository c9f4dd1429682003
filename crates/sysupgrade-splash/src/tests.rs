use super::*;

use crate::display::{format_event, transaction_percent};

struct RecordingRunner {
    exit_code: i32,
    calls: Vec<Vec<String>>,
}

impl RecordingRunner {
    fn new(exit_code: i32) -> Self {
        Self {
            exit_code,
            calls: Vec::new(),
        }
    }
}

impl SplashRunner for RecordingRunner {
    fn call(&mut self, request: &SplashRequest) -> i32 {
        self.calls.push(request.args());
        self.exit_code
    }
}

fn recording_splash(exit_code: i32) -> SplashOutput<RecordingRunner> {
    SplashOutput::new(RecordingRunner::new(exit_code))
}

/// Splash that has already passed a health check, with the ping call dropped
/// from the recording so counts line up with dispatches only.
fn alive_splash() -> SplashOutput<RecordingRunner> {
    let mut splash = recording_splash(0);
    splash.ping();
    splash.runner_mut().calls.clear();
    splash
}

fn alive_display() -> TransactionDisplay<RecordingRunner> {
    TransactionDisplay::new(alive_splash())
}

fn message_args(text: &str) -> Vec<String> {
    vec![
        "display-message".to_string(),
        "--text".to_string(),
        text.to_string(),
    ]
}

fn progress_args(percent: &str) -> Vec<String> {
    vec![
        "system-update".to_string(),
        "--progress".to_string(),
        percent.to_string(),
    ]
}

#[test]
fn ping_sets_alive_from_exit_code() {
    let mut splash = recording_splash(0);
    splash.ping();
    assert!(splash.alive());
    assert_eq!(splash.runner().calls, vec![vec!["--ping".to_string()]]);
}

#[test]
fn ping_records_dead_then_recovers() {
    let mut splash = recording_splash(1);
    splash.ping();
    assert!(!splash.alive());

    splash.runner_mut().exit_code = 0;
    splash.ping();
    assert!(splash.alive());
    assert_eq!(splash.runner().calls.len(), 2);
}

#[test]
fn first_message_pings_before_dispatching() {
    let mut splash = recording_splash(0);
    splash.message("Hello, splash.");
    assert_eq!(
        splash.runner().calls,
        vec![vec!["--ping".to_string()], message_args("Hello, splash.")]
    );
}

#[test]
fn message_dedupes_identical_text() {
    let mut splash = alive_splash();
    splash.message("Hello, splash.");
    splash.message("Hello, splash.");
    assert_eq!(splash.runner().calls, vec![message_args("Hello, splash.")]);

    splash.message("something else");
    assert_eq!(splash.runner().calls.len(), 2);
}

#[test]
fn dead_splash_absorbs_all_dispatches() {
    let mut splash = recording_splash(1);
    splash.ping();
    assert!(!splash.alive());
    splash.runner_mut().calls.clear();

    splash.message("not even gonna bother");
    splash.progress(50);
    splash.set_mode("updates");
    assert!(splash.runner().calls.is_empty());

    splash.runner_mut().exit_code = 0;
    splash.ping();
    splash.message("back again");
    assert_eq!(
        splash.runner().calls,
        vec![vec!["--ping".to_string()], message_args("back again")]
    );
}

#[test]
fn dispatch_failure_does_not_flip_alive() {
    let mut splash = alive_splash();
    splash.runner_mut().exit_code = 1;
    splash.message("first");
    assert!(splash.alive());

    // Still considered alive, so the next dispatch is attempted too.
    splash.message("second");
    assert_eq!(
        splash.runner().calls,
        vec![message_args("first"), message_args("second")]
    );
}

#[test]
fn progress_formats_decimal_string() {
    let mut splash = alive_splash();
    splash.progress(27);
    assert_eq!(splash.runner().calls, vec![progress_args("27")]);
}

#[test]
fn set_mode_uses_flag_argument() {
    let mut splash = alive_splash();
    splash.set_mode("updates");
    assert_eq!(
        splash.runner().calls,
        vec![vec!["change-mode".to_string(), "--updates".to_string()]]
    );
}

#[test]
fn event_emits_message_and_progress() {
    let mut display = alive_display();
    display.event("testpackage", "install", 0, 100, 1, 1000);

    let calls = &display.splash_mut().runner().calls;
    assert_eq!(calls.len(), 2);
    assert!(calls.contains(&message_args("[1/1000] install: testpackage")));
    assert!(calls.contains(&progress_args("0")));
}

#[test]
fn same_item_progress_collapses_to_two_calls() {
    let mut display = alive_display();
    for current in 0..100 {
        display.event("testpackage", "install", current, 100, 1, 1000);
    }
    assert_eq!(display.splash_mut().runner().calls.len(), 2);
}

#[test]
fn next_item_adds_exactly_one_message_call() {
    let mut display = alive_display();
    for current in 0..100 {
        display.event("testpackage", "install", current, 100, 1, 1000);
    }

    // New item: the message updates but the percentage is still 0.
    display.event("testpackage", "install", 0, 100, 2, 1000);
    let calls = &display.splash_mut().runner().calls;
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls.last(),
        Some(&message_args("[2/1000] install: testpackage"))
    );
}

#[test]
fn progress_emits_on_percent_boundaries() {
    let mut display = alive_display();
    for index in 1..=10 {
        display.event("pkg", "upgrade", 0, 100, index, 20);
    }

    let progress_calls: Vec<&Vec<String>> = display
        .splash_mut()
        .runner()
        .calls
        .iter()
        .filter(|args| args.first().map(String::as_str) == Some("system-update"))
        .collect();
    // index/20 crosses a new multiple of 5 percent on every item.
    assert_eq!(progress_calls.len(), 10);
    assert_eq!(progress_calls[0], &progress_args("5"));
    assert_eq!(progress_calls[9], &progress_args("50"));
}

#[test]
fn verify_follows_event_gating() {
    let mut display = alive_display();
    display.verify("testpackage", 1, 1000);

    let calls = &display.splash_mut().runner().calls;
    assert_eq!(calls.len(), 2);
    assert!(calls.contains(&message_args("[1/1000] verify: testpackage")));
    assert!(calls.contains(&progress_args("0")));

    // Repeating the same verification item makes no further calls.
    display.verify("testpackage", 1, 1000);
    assert_eq!(display.splash_mut().runner().calls.len(), 2);
}

#[test]
fn observer_trait_routes_to_event_and_verify() {
    let mut display = alive_display();
    let observer: &mut dyn TransactionObserver = &mut display;
    observer.item_progress("pkg", "install", 0, 10, 1, 4);
    observer.verify_item("pkg", 2, 4);
    assert_eq!(display.splash_mut().runner().calls.len(), 4);
}

#[test]
fn zero_item_count_pins_percent_at_zero() {
    assert_eq!(transaction_percent(0, 0), 0);
    assert_eq!(transaction_percent(5, 0), 0);
    assert_eq!(transaction_percent(1, 1000), 0);
    assert_eq!(transaction_percent(500, 1000), 50);
    assert_eq!(transaction_percent(1000, 1000), 100);
}

#[test]
fn event_format_is_deterministic() {
    assert_eq!(
        format_event("testpackage", "install", 1, 1000),
        "[1/1000] install: testpackage"
    );
}

#[test]
fn dead_splash_suppresses_display_updates_entirely() {
    let mut splash = recording_splash(1);
    splash.ping();
    splash.runner_mut().calls.clear();

    let mut display = TransactionDisplay::new(splash);
    display.event("pkg", "install", 0, 100, 1, 10);
    assert!(display.splash_mut().runner().calls.is_empty());
}

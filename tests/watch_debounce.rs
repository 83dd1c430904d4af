// tests/watch_debounce.rs

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use assetrun::compose::Request;
use assetrun::config::ConfigFile;
use assetrun::pipeline::{Layout, watch_rules};
use assetrun::watch::{Dispatcher, RebuildBackend, WatchRule, spawn_rule};
use assetrun_test_utils::{Journal, RecordingBackend, init_tracing};
use tokio::time::sleep;

const WINDOW: Duration = Duration::from_millis(100);

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn backend(journal: &Journal, run_for: Duration) -> Arc<dyn RebuildBackend> {
    Arc::new(RecordingBackend::new(journal.clone(), run_for))
}

#[tokio::test(start_paused = true)]
async fn burst_inside_the_window_runs_once() {
    init_tracing();
    let journal = Journal::new();
    let rule = WatchRule::new("styles", ["app/styles/**/*.scss"], "styles");
    let trigger = spawn_rule(&rule, WINDOW, backend(&journal, ms(10)));
    assert_eq!(trigger.label(), "styles");

    for i in 0..5 {
        trigger.notify(format!("app/styles/{i}.scss"));
        sleep(ms(20)).await;
    }
    sleep(ms(500)).await;

    assert_eq!(journal.start_count("styles"), 1);
    assert_eq!(journal.finished(), vec!["styles"]);
}

#[tokio::test(start_paused = true)]
async fn window_restarts_on_every_event() {
    init_tracing();
    let journal = Journal::new();
    let rule = WatchRule::new("styles", ["app/styles/**/*.scss"], "styles");
    let trigger = spawn_rule(&rule, WINDOW, backend(&journal, ms(10)));

    trigger.notify("app/styles/a.scss");
    sleep(ms(80)).await;
    trigger.notify("app/styles/b.scss");
    sleep(ms(80)).await;

    // 160ms after the first event, but only 80ms after the last one.
    assert_eq!(journal.start_count("styles"), 0);

    sleep(ms(100)).await;
    assert_eq!(journal.start_count("styles"), 1);
}

#[tokio::test(start_paused = true)]
async fn separated_changes_run_separately() {
    init_tracing();
    let journal = Journal::new();
    let rule = WatchRule::new("html", ["app/*.html"], "html");
    let trigger = spawn_rule(&rule, WINDOW, backend(&journal, ms(10)));

    trigger.notify("app/index.html");
    sleep(ms(400)).await;
    trigger.notify("app/about.html");
    sleep(ms(400)).await;

    assert_eq!(journal.start_count("html"), 2);
}

#[tokio::test(start_paused = true)]
async fn changes_during_a_run_queue_exactly_one_follow_up() {
    init_tracing();
    let journal = Journal::new();
    let rule = WatchRule::new("scripts", ["app/scripts/**/*.js"], Request::seq(["lint", "scripts"]));
    let trigger = spawn_rule(&rule, WINDOW, backend(&journal, ms(300)));
    let label = "[lint, scripts]";

    trigger.notify("app/scripts/main.js");
    sleep(ms(150)).await;
    assert_eq!(journal.start_count(label), 1);

    // Still running: these collapse into one queued run.
    trigger.notify("app/scripts/a.js");
    trigger.notify("app/scripts/b.js");
    sleep(ms(50)).await;
    trigger.notify("app/scripts/c.js");

    sleep(ms(2000)).await;

    assert_eq!(journal.start_count(label), 2);
    assert_eq!(journal.max_concurrent(label), 1);
}

#[tokio::test(start_paused = true)]
async fn failing_rebuild_keeps_the_rule_alive() {
    init_tracing();
    let journal = Journal::new();
    let rule = WatchRule::new("styles", ["app/styles/**/*.scss"], "styles");
    let failing: Arc<dyn RebuildBackend> =
        Arc::new(RecordingBackend::new(journal.clone(), ms(10)).failing());
    let trigger = spawn_rule(&rule, WINDOW, failing);

    trigger.notify("app/styles/a.scss");
    sleep(ms(400)).await;
    trigger.notify("app/styles/a.scss");
    sleep(ms(400)).await;

    assert_eq!(journal.start_count("styles"), 2);
}

#[tokio::test(start_paused = true)]
async fn distinct_rules_run_independently() {
    init_tracing();
    let journal = Journal::new();
    let shared = backend(&journal, ms(200));
    let styles = spawn_rule(
        &WatchRule::new("styles", ["app/styles/**/*.scss"], "styles"),
        WINDOW,
        Arc::clone(&shared),
    );
    let images = spawn_rule(
        &WatchRule::new("images", ["app/images/**/*"], "images"),
        WINDOW,
        shared,
    );

    styles.notify("app/styles/a.scss");
    images.notify("app/images/logo.png");
    sleep(ms(150)).await;

    // Both windows elapsed at the same time and neither run has finished.
    assert_eq!(journal.started().len(), 2);
    assert!(journal.finished().is_empty());

    sleep(ms(500)).await;
    assert_eq!(journal.finished().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn dispatcher_routes_changes_to_matching_rules() {
    init_tracing();
    let journal = Journal::new();
    let root = Path::new("/project");
    let layout = Layout::from_config(root, &ConfigFile::default());
    let rules = watch_rules(&layout);
    let dispatcher = Dispatcher::new(root, &rules, WINDOW, backend(&journal, ms(10))).unwrap();

    assert_eq!(dispatcher.dispatch(&root.join("app/styles/site.scss")), 1);
    assert_eq!(dispatcher.dispatch(&root.join("app/scripts/main.js")), 1);
    assert_eq!(dispatcher.dispatch(&root.join("dist/css/site.css")), 0);
    assert_eq!(dispatcher.dispatch(Path::new("/somewhere/else/app/index.html")), 0);

    sleep(ms(500)).await;

    let mut started = journal.started();
    started.sort();
    assert_eq!(started, vec!["[lint, scripts]", "styles"]);
}

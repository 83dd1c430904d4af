// tests/resolver_errors.rs

use assetrun::compose::Request;
use assetrun::errors::BuildError;
use assetrun::registry::TaskDef;
use assetrun_test_utils::{HarnessBuilder, Journal, RegistryBuilder, init_tracing};

#[tokio::test]
async fn unknown_task_fails_before_anything_runs() {
    init_tracing();
    let journal = Journal::new();
    let registry = RegistryBuilder::new(journal.clone()).ok("clean").ok("fonts").build();
    let h = HarnessBuilder::new().registry(registry).build();

    let request = Request::seq(["clean", "fonts", "missing"]);
    let err = h.engine.run(&request).await.unwrap_err();

    match err {
        BuildError::UnknownTask(name) => assert_eq!(name, "missing"),
        other => panic!("expected UnknownTask, got {other:?}"),
    }
    assert!(journal.events().is_empty());
}

#[tokio::test]
async fn cyclic_composite_fails_before_anything_runs() {
    init_tracing();
    let journal = Journal::new();
    let registry = RegistryBuilder::new(journal.clone())
        .ok("b")
        .composite("a", Request::seq(["b", "c"]))
        .composite("c", Request::parallel(["b", "a"]))
        .build();

    let err = registry.check_compositions().unwrap_err();
    assert!(matches!(err, BuildError::CyclicComposition { .. }));

    let h = HarnessBuilder::new().registry(registry).build();
    let err = h.engine.run(&Request::task("a")).await.unwrap_err();
    match err {
        BuildError::CyclicComposition { path } => assert_eq!(path, vec!["a", "c", "a"]),
        other => panic!("expected CyclicComposition, got {other:?}"),
    }
    assert!(journal.events().is_empty());
}

#[test]
fn self_referencing_composite_is_rejected_up_front() {
    let registry = RegistryBuilder::new(Journal::new())
        .ok("b")
        .composite("a", Request::seq(["b", "a"]))
        .build();

    match registry.check_compositions() {
        Err(BuildError::CyclicComposition { path }) => assert_eq!(path, vec!["a", "a"]),
        other => panic!("expected CyclicComposition, got {other:?}"),
    }
}

#[test]
fn composite_referencing_unknown_task_is_rejected_up_front() {
    let registry = RegistryBuilder::new(Journal::new())
        .composite("a", Request::seq(["ghost"]))
        .build();

    assert!(matches!(
        registry.check_compositions(),
        Err(BuildError::UnknownTask(name)) if name == "ghost"
    ));
}

#[test]
fn empty_request_is_rejected() {
    let h = HarnessBuilder::new()
        .registry(RegistryBuilder::new(Journal::new()).ok("a").build())
        .build();

    let empty = Request::seq(Vec::<Request>::new());
    assert!(matches!(h.engine.plan(&empty), Err(BuildError::EmptyRequest)));

    let nested_empty = Request::parallel([Request::seq(Vec::<Request>::new())]);
    assert!(matches!(h.engine.plan(&nested_empty), Err(BuildError::EmptyRequest)));
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut registry = RegistryBuilder::new(Journal::new()).ok("clean").build();
    let err = registry
        .register(TaskDef::leaf("clean", |_cx| async { Ok(()) }))
        .unwrap_err();
    assert!(matches!(err, BuildError::DuplicateTask(name) if name == "clean"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn the_pipeline_registry_is_well_formed() {
    let registry = assetrun::pipeline::default_registry().unwrap();
    for name in [
        "clean", "images", "fonts", "html", "htmlmin", "extras", "lint", "scripts", "uglify",
        "styles", "vendor", "rev", "cache", "serve",
    ] {
        assert!(registry.contains(name), "missing task {name}");
    }
    let rebuildable: Vec<&str> = registry
        .tasks()
        .filter(|t| t.is_rebuildable())
        .map(|t| t.name())
        .collect();
    assert_eq!(rebuildable, vec!["fonts", "html", "images", "scripts", "styles"]);
}

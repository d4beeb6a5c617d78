//! Secure CI/CD suite against fixture descriptors

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use infracheck::commands::common::OutputOptions;
use infracheck::commands::run::{self, RunOptions};
use infracheck::commands::validate;
use infracheck::error::FetchErrorKind;
use infracheck::suite::{build_suite, load_suite, StaticOutputs, Suite};
use infracheck::verify::{CaseOutcome, RetryPolicy, Verifier};

use super::helpers::*;

fn load_app_cicd() -> Suite {
    let file = load_suite(&app_cicd_suite()).expect("Failed to load suite");
    let outputs = StaticOutputs::new().with("project_id", PROJECT_ID);
    build_suite(&file, &outputs).expect("Suite should be valid")
}

fn project_var() -> OutputOptions {
    OutputOptions {
        vars: vec![("project_id".to_string(), PROJECT_ID.to_string())],
        ..OutputOptions::default()
    }
}

#[test]
fn test_suite_expands_every_resource() {
    let suite = load_app_cicd();

    let labels: Vec<_> = suite.cases.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "Cloud Build Trigger - App Source",
            "Artifact Registry repository",
            "BinAuthz Attestor build-attestor",
            "BinAuthz Attestor quality-attestor",
            "BinAuthz Attestor security-attestor",
            "CSR app-source",
            "CSR app-dry-manifests",
            "CSR app-wet-manifests",
            "Deploy Trigger deploy-trigger-dev",
            "Deploy Trigger deploy-trigger-qa",
            "Deploy Trigger deploy-trigger-prod",
            "BinAuthz Policy",
        ]
    );

    let gar = &suite.cases[1];
    assert_eq!(
        gar.identity.name(),
        Some("secure-cicd-123-app-image-repo")
    );
    assert_eq!(gar.identity.param("location"), Some("us-central1"));
}

#[test]
fn test_healthy_deployment_passes() {
    let suite = load_app_cicd();
    let fetcher = fixture_fetcher(&app_cicd_descriptors(PROJECT_ID));

    let report = Verifier::new(Arc::new(fetcher), suite.run_config).run(&suite.cases);

    assert!(report.passed(), "{:#?}", report.diagnostics());
    assert_eq!(report.results.len(), 12);
    assert_eq!(report.passed_count(), 12);
    assert!(report.results.iter().all(|r| r.attempts == 1));
}

#[test]
fn test_drift_is_reported_with_expected_and_actual() {
    let suite = load_app_cicd();
    let mut docs = app_cicd_descriptors(PROJECT_ID);
    drift(
        &mut docs,
        "trigger",
        "deploy-trigger-qa",
        "/substitutions/_MANIFEST_WET_REPO",
        json!("app-wet-manifests-old"),
    );
    drift(
        &mut docs,
        "trigger",
        "deploy-trigger-qa",
        "/substitutions/_CLUSTER_PROJECT",
        json!("legacy-cluster"),
    );

    let report = Verifier::new(Arc::new(fixture_fetcher(&docs)), suite.run_config).run(&suite.cases);

    assert!(!report.passed());
    assert_eq!(report.results.len(), 12);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.mismatch_count(), 2);

    let diagnostics = report.diagnostics();
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics[0].contains("[Deploy Trigger deploy-trigger-qa]"));
    assert!(diagnostics[0].contains("_MANIFEST_WET_REPO trigger substitution is valid"));
    assert!(diagnostics[0].contains("equals \"app-wet-manifests\""));
    assert!(diagnostics[0].contains("actual \"app-wet-manifests-old\""));
    assert!(diagnostics[1].contains("contains \"secure-cicd-gke-\""));
}

#[test]
fn test_missing_resource_fails_only_its_case() {
    let mut suite = load_app_cicd();
    suite.run_config.retry = RetryPolicy::fixed(2, Duration::ZERO);

    let docs: Vec<_> = app_cicd_descriptors(PROJECT_ID)
        .into_iter()
        .filter(|(kind, name, _)| {
            !(*kind == "binauthz-attestor" && name.as_deref() == Some("quality-attestor"))
        })
        .collect();

    let report = Verifier::new(Arc::new(fixture_fetcher(&docs)), suite.run_config).run(&suite.cases);

    assert_eq!(report.results.len(), 12);
    assert_eq!(report.passed_count(), 11);

    let missing = &report.results[3];
    assert_eq!(missing.label, "BinAuthz Attestor quality-attestor");
    assert_eq!(missing.attempts, 2);
    match &missing.outcome {
        CaseOutcome::FetchFailed { error } => assert_eq!(error.kind, FetchErrorKind::NotFound),
        other => panic!("expected fetch failure, got {other:?}"),
    }
}

#[test]
fn test_absent_field_reports_absent() {
    let suite = load_app_cicd();
    let mut docs = app_cicd_descriptors(PROJECT_ID);
    let (_, _, source_trigger) = docs
        .iter_mut()
        .find(|(_, name, _)| name.as_deref() == Some("app-source-trigger"))
        .unwrap();
    source_trigger["substitutions"]
        .as_object_mut()
        .unwrap()
        .remove("_MANIFEST_DRY_REPO");

    let report = Verifier::new(Arc::new(fixture_fetcher(&docs)), suite.run_config).run(&suite.cases);

    let check = report.results[0]
        .mismatches()
        .next()
        .expect("dry repo expectation should fail");
    assert_eq!(check.actual, None);
    assert!(report.diagnostics()[0].ends_with("actual absent"));
}

#[test]
fn test_run_command_with_fixture_dir() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture_dir(dir.path(), &app_cicd_descriptors(PROJECT_ID));

    let options = RunOptions {
        suite: app_cicd_suite(),
        outputs: project_var(),
        fixtures: Some(dir.path().to_path_buf()),
        json: true,
        ..RunOptions::default()
    };
    run::execute(options).expect("Healthy deployment should pass");
}

#[test]
fn test_run_command_fails_on_drift() {
    let dir = tempfile::tempdir().unwrap();
    let mut docs = app_cicd_descriptors(PROJECT_ID);
    drift(
        &mut docs,
        "source-repo",
        "app-source",
        "/url",
        json!("https://example.invalid/app-source"),
    );
    write_fixture_dir(dir.path(), &docs);

    let options = RunOptions {
        suite: app_cicd_suite(),
        outputs: project_var(),
        fixtures: Some(dir.path().to_path_buf()),
        max_parallel: Some(1),
        ..RunOptions::default()
    };
    let err = run::execute(options).unwrap_err();
    assert_eq!(err.to_string(), "1 of 12 case(s) failed");
}

#[test]
fn test_run_command_rejects_unresolved_variables() {
    let dir = tempfile::tempdir().unwrap();
    let options = RunOptions {
        suite: app_cicd_suite(),
        fixtures: Some(dir.path().to_path_buf()),
        ..RunOptions::default()
    };

    let err = run::execute(options).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("unresolved variable ${project_id}"), "{message}");
}

#[test]
fn test_validate_command() {
    validate::execute(&app_cicd_suite(), &project_var()).expect("Suite should validate");
    assert!(validate::execute(&app_cicd_suite(), &OutputOptions::default()).is_err());
}

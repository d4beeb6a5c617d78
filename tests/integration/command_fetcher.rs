//! Live describe path against a fake descriptor program

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use infracheck::commands::run::{self, RunOptions};
use infracheck::error::FetchErrorKind;
use infracheck::fetch::{CommandFetcher, CommandFetcherConfig, DescriptorFetcher, QueryCatalog};
use infracheck::models::{Expectation, ResourceIdentity, VerificationCase};
use infracheck::verify::{fetch_with_retry, RetryPolicy, RunConfig, StopSignal, Verifier};

use super::helpers::*;

/// Answers source repo queries, fails everything else the way gcloud does.
/// Every invocation is appended to `calls.log` next to the script.
const FAKE_GCLOUD: &str = r#"
dir=$(dirname "$0")
echo "$*" >> "$dir/calls.log"
case "$*" in
  "source repos describe app-source --project p1 --format=json")
    echo '{"name": "projects/p1/repos/app-source", "url": "https://source.developers.google.com/p/p1/r/app-source"}'
    ;;
  *"describe locked"*)
    echo "ERROR: (gcloud.source.repos.describe) PERMISSION_DENIED: The caller does not have permission" >&2
    exit 1
    ;;
  *"describe garbled"*)
    echo "Listed 0 items."
    ;;
  *"describe slow"*)
    sleep 5
    ;;
  *)
    echo "ERROR: (gcloud.source.repos.describe) NOT_FOUND: Requested entity was not found." >&2
    exit 1
    ;;
esac
"#;

fn repo(name: &str) -> ResourceIdentity {
    ResourceIdentity::new("source-repo")
        .with_param("name", name)
        .with_param("project", "p1")
}

fn fetcher(program: &Path) -> CommandFetcher {
    CommandFetcher::new(
        QueryCatalog::builtin(),
        CommandFetcherConfig {
            program: program.display().to_string(),
            command_timeout: Duration::from_secs(1),
            ..CommandFetcherConfig::default()
        },
    )
}

fn call_count(dir: &Path) -> usize {
    fs::read_to_string(dir.join("calls.log"))
        .map(|log| log.lines().count())
        .unwrap_or(0)
}

#[test]
fn test_describe_parses_program_output() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_program(dir.path(), FAKE_GCLOUD);

    let doc = fetcher(&program).fetch(&repo("app-source")).unwrap();

    assert_eq!(doc.root()["name"], "projects/p1/repos/app-source");
    assert_eq!(call_count(dir.path()), 1);
}

#[test]
fn test_not_found_is_retried_until_budget_runs_out() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_program(dir.path(), FAKE_GCLOUD);

    let outcome = fetch_with_retry(
        &fetcher(&program),
        &repo("app-wet-manifests"),
        &RetryPolicy::fixed(3, Duration::ZERO),
        &StopSignal::never(),
    );

    let err = outcome.result.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::NotFound);
    assert!(err.cause.contains("NOT_FOUND"));
    assert_eq!(outcome.attempts, 3);
    assert_eq!(call_count(dir.path()), 3);
}

#[test]
fn test_permission_denied_is_not_retried() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_program(dir.path(), FAKE_GCLOUD);

    let outcome = fetch_with_retry(
        &fetcher(&program),
        &repo("locked"),
        &RetryPolicy::fixed(3, Duration::ZERO),
        &StopSignal::never(),
    );

    assert_eq!(outcome.result.unwrap_err().kind, FetchErrorKind::AuthFailure);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(call_count(dir.path()), 1);
}

#[test]
fn test_unparseable_output() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_program(dir.path(), FAKE_GCLOUD);

    let err = fetcher(&program).fetch(&repo("garbled")).unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Unparseable);
}

#[test]
fn test_slow_command_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_program(dir.path(), FAKE_GCLOUD);

    let err = fetcher(&program).fetch(&repo("slow")).unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::TimedOut);
    assert!(err.is_transient());
}

#[test]
fn test_run_mixes_pass_and_fetch_failure() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_program(dir.path(), FAKE_GCLOUD);

    let cases = vec![
        VerificationCase::new("CSR app-source", repo("app-source")).expect(
            Expectation::equals("url", "https://source.developers.google.com/p/p1/r/app-source")
                .unwrap(),
        ),
        VerificationCase::new("CSR app-dry-manifests", repo("app-dry-manifests"))
            .expect(Expectation::contains("name", "app-dry-manifests").unwrap()),
    ];
    let config = RunConfig::default().with_retry(RetryPolicy::fixed(2, Duration::ZERO));

    let report = Verifier::new(Arc::new(fetcher(&program)), config).run(&cases);

    assert_eq!(report.results.len(), 2);
    assert!(report.results[0].passed());
    assert_eq!(
        report.results[1].fetch_error().map(|e| e.kind),
        Some(FetchErrorKind::NotFound)
    );
    assert_eq!(report.results[1].attempts, 2);
}

#[test]
fn test_run_command_uses_program_from_suite() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_program(dir.path(), FAKE_GCLOUD);
    let suite_path = dir.path().join("suite.yaml");
    fs::write(
        &suite_path,
        format!(
            r#"
settings:
  fetcher: {{ program: "{}", command_timeout_secs: 5 }}
cases:
  - label: app source repo
    kind: source-repo
    identity: {{ name: app-source, project: p1 }}
    expect:
      - {{ path: name, equals: projects/p1/repos/app-source }}
"#,
            program.display()
        ),
    )
    .unwrap();

    run::execute(RunOptions {
        suite: suite_path,
        ..RunOptions::default()
    })
    .expect("Suite should pass against the fake program");
    assert_eq!(call_count(dir.path()), 1);
}

#[test]
fn test_run_command_requires_program() {
    let dir = tempfile::tempdir().unwrap();
    let suite_path = dir.path().join("suite.yaml");
    fs::write(
        &suite_path,
        r#"
settings:
  fetcher: { program: definitely-not-installed-gcloud }
cases:
  - label: project
    kind: project
    identity: { project: p1 }
    expect: [{ path: lifecycleState, equals: ACTIVE }]
"#,
    )
    .unwrap();

    let err = run::execute(RunOptions {
        suite: suite_path,
        ..RunOptions::default()
    })
    .unwrap_err();
    assert!(err.to_string().contains("not found on PATH"));
}

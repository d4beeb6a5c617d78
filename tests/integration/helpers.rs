//! Shared test helpers for suite integration tests

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

use infracheck::fetch::FixtureFetcher;
use infracheck::models::{Document, ResourceIdentity};

pub const PROJECT_ID: &str = "secure-cicd-123";

/// Path to the bundled secure CI/CD suite
pub fn app_cicd_suite() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join("app_cicd.yaml")
}

/// Every descriptor the secure CI/CD suite checks, as a healthy deployment
/// would report them. Keyed by `(kind, name)`; `name` is `None` for the
/// project-wide BinAuthz policy.
pub fn app_cicd_descriptors(project: &str) -> Vec<(&'static str, Option<String>, Value)> {
    let mut docs = vec![
        (
            "trigger",
            Some("app-source-trigger".to_string()),
            json!({
                "name": "app-source-trigger",
                "substitutions": {
                    "_DEFAULT_REGION": "us-central1",
                    "_MANIFEST_DRY_REPO": "app-dry-manifests",
                    "_MANIFEST_WET_REPO": "app-wet-manifests"
                },
                "triggerTemplate": {"branchName": "main", "projectId": project, "repoName": "app-source"}
            }),
        ),
        (
            "artifact-repository",
            Some(format!("{project}-app-image-repo")),
            json!({
                "format": "DOCKER",
                "name": format!("projects/{project}/locations/us-central1/repositories/{project}-app-image-repo")
            }),
        ),
        (
            "binauthz-policy",
            None,
            json!({
                "defaultAdmissionRule": {
                    "enforcementMode": "ENFORCED_BLOCK_AND_AUDIT_LOG",
                    "evaluationMode": "REQUIRE_ATTESTATION"
                },
                "globalPolicyEvaluationMode": "ENABLE"
            }),
        ),
    ];

    for attestor in ["build-attestor", "quality-attestor", "security-attestor"] {
        docs.push((
            "binauthz-attestor",
            Some(attestor.to_string()),
            json!({"name": format!("projects/{project}/attestors/{attestor}")}),
        ));
    }

    for repo in ["app-source", "app-dry-manifests", "app-wet-manifests"] {
        docs.push((
            "source-repo",
            Some(repo.to_string()),
            json!({
                "name": format!("projects/{project}/repos/{repo}"),
                "url": format!("https://source.developers.google.com/p/{project}/r/{repo}")
            }),
        ));
    }

    for env in ["dev", "qa", "prod"] {
        let name = format!("deploy-trigger-{env}");
        docs.push((
            "trigger",
            Some(name.clone()),
            json!({
                "name": name,
                "substitutions": {
                    "_CLUSTER_PROJECT": format!("secure-cicd-gke-{env}-42"),
                    "_MANIFEST_WET_REPO": "app-wet-manifests"
                },
                "triggerTemplate": {"branchName": env, "projectId": project, "repoName": "app-wet-manifests"}
            }),
        ));
    }

    docs
}

fn identity(kind: &str, name: Option<&str>) -> ResourceIdentity {
    let identity = ResourceIdentity::new(kind);
    match name {
        Some(name) => identity.with_param("name", name),
        None => identity,
    }
}

pub fn fixture_fetcher(docs: &[(&'static str, Option<String>, Value)]) -> FixtureFetcher {
    let mut fetcher = FixtureFetcher::new();
    for (kind, name, doc) in docs {
        fetcher.insert(&identity(kind, name.as_deref()), Document::new(doc.clone()));
    }
    fetcher
}

/// Write descriptors in the `<kind>/<name>.json` fixture layout.
pub fn write_fixture_dir(dir: &Path, docs: &[(&'static str, Option<String>, Value)]) {
    for (kind, name, doc) in docs {
        let text = serde_json::to_string_pretty(doc).expect("Failed to serialize fixture");
        match name {
            Some(name) => {
                let kind_dir = dir.join(kind);
                fs::create_dir_all(&kind_dir).expect("Failed to create fixture directory");
                fs::write(kind_dir.join(format!("{name}.json")), text)
                    .expect("Failed to write fixture");
            }
            None => {
                fs::write(dir.join(format!("{kind}.json")), text).expect("Failed to write fixture")
            }
        }
    }
}

/// Replace one field of the descriptor for `(kind, name)`.
pub fn drift(
    docs: &mut [(&'static str, Option<String>, Value)],
    kind: &str,
    name: &str,
    pointer: &str,
    value: Value,
) {
    let (_, _, doc) = docs
        .iter_mut()
        .find(|(k, n, _)| *k == kind && n.as_deref() == Some(name))
        .expect("No such descriptor");
    *doc.pointer_mut(pointer).expect("No such field") = value;
}

/// Write an executable shell script standing in for the descriptor program.
#[cfg(unix)]
pub fn fake_program(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-gcloud");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write fake program");
    let mut perms = fs::metadata(&path)
        .expect("Failed to stat fake program")
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("Failed to make fake program executable");
    path
}

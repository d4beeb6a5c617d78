//! Resource kind → describe query templates
//!
//! A template is the argument list of the descriptor program with
//! `${param}` placeholders filled from the identity's parameters. Values
//! are shell-escaped before substitution.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

use crate::models::identity::ResourceIdentity;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_\-]*)\}").expect("Invalid regex pattern")
});

/// Templates for the resources a secure CI/CD blueprint creates
const BUILTIN_KINDS: &[(&str, &str)] = &[
    (
        "artifact-repository",
        "artifacts repositories describe ${name} --project ${project} --location ${location}",
    ),
    (
        "binauthz-attestor",
        "container binauthz attestors describe ${name} --project ${project}",
    ),
    (
        "binauthz-policy",
        "container binauthz policy export --project ${project}",
    ),
    (
        "gke-cluster",
        "container clusters describe ${name} --project ${project} --location ${location}",
    ),
    ("project", "projects describe ${project}"),
    (
        "source-repo",
        "source repos describe ${name} --project ${project}",
    ),
    (
        "trigger",
        "beta builds triggers describe ${name} --project ${project}",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unknown resource kind '{0}'")]
    UnknownKind(String),
    #[error("query for kind '{kind}' needs parameter '{param}'")]
    MissingParameter { kind: String, param: String },
}

/// Known resource kinds and their query templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCatalog {
    templates: BTreeMap<String, String>,
}

impl Default for QueryCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl QueryCatalog {
    /// A catalog with no kinds
    pub fn empty() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    /// The built-in gcloud templates
    pub fn builtin() -> Self {
        let templates = BUILTIN_KINDS
            .iter()
            .map(|(kind, template)| (kind.to_string(), template.to_string()))
            .collect();
        Self { templates }
    }

    /// Add or replace a kind
    pub fn with_kind(mut self, kind: &str, template: &str) -> Self {
        self.insert(kind, template);
        self
    }

    pub fn insert(&mut self, kind: &str, template: &str) {
        self.templates.insert(kind.to_string(), template.to_string());
    }

    pub fn template(&self, kind: &str) -> Option<&str> {
        self.templates.get(kind).map(String::as_str)
    }

    pub fn kinds(&self) -> impl Iterator<Item = (&str, &str)> {
        self.templates
            .iter()
            .map(|(kind, template)| (kind.as_str(), template.as_str()))
    }

    /// Parameter names a kind's template needs
    pub fn required_params(&self, kind: &str) -> Result<Vec<String>, QueryError> {
        let template = self
            .template(kind)
            .ok_or_else(|| QueryError::UnknownKind(kind.to_string()))?;
        Ok(PLACEHOLDER
            .captures_iter(template)
            .map(|caps| caps[1].to_string())
            .collect())
    }

    /// Build the query arguments for `identity`.
    pub fn render(&self, identity: &ResourceIdentity) -> Result<String, QueryError> {
        let template = self
            .template(&identity.kind)
            .ok_or_else(|| QueryError::UnknownKind(identity.kind.clone()))?;

        for param in self.required_params(&identity.kind)? {
            if identity.param(&param).is_none() {
                return Err(QueryError::MissingParameter {
                    kind: identity.kind.clone(),
                    param,
                });
            }
        }

        Ok(PLACEHOLDER
            .replace_all(template, |caps: &Captures| {
                let value = identity.param(&caps[1]).unwrap_or_default();
                shell_escape::escape(value.into()).into_owned()
            })
            .into_owned())
    }
}

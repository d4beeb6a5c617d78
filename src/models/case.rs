//! Verification cases and case templates

use serde::Serialize;

use crate::models::expectation::Expectation;
use crate::models::identity::ResourceIdentity;
use crate::models::variables::{self, Variables};

/// One resource identity plus the ordered expectations checked against it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationCase {
    pub label: String,
    pub identity: ResourceIdentity,
    pub expectations: Vec<Expectation>,
}

impl VerificationCase {
    pub fn new(label: impl Into<String>, identity: ResourceIdentity) -> Self {
        Self {
            label: label.into(),
            identity,
            expectations: Vec::new(),
        }
    }

    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }

    /// Copy with variables expanded in the label, identity parameters and
    /// every expectation.
    pub fn expand(&self, vars: &Variables) -> VerificationCase {
        VerificationCase {
            label: vars.expand(&self.label),
            identity: ResourceIdentity {
                kind: self.identity.kind.clone(),
                params: self
                    .identity
                    .params
                    .iter()
                    .map(|(k, v)| (k.clone(), vars.expand(v)))
                    .collect(),
            },
            expectations: self.expectations.iter().map(|e| e.expand(vars)).collect(),
        }
    }

    /// Variable names still unexpanded anywhere in the case
    pub fn unresolved_variables(&self) -> Vec<String> {
        let mut texts: Vec<&str> = vec![self.label.as_str()];
        texts.extend(self.identity.params.values().map(String::as_str));
        for expectation in &self.expectations {
            texts.push(&expectation.label);
            texts.extend(expectation.matcher.strings());
        }

        let mut names: Vec<String> = texts.into_iter().flat_map(variables::referenced).collect();
        names.sort();
        names.dedup();
        names
    }
}

/// A case written once and instantiated for each value of one variable,
/// e.g. the same checks against three source repositories.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseTemplate {
    pub template: VerificationCase,
    pub variable: String,
    pub values: Vec<String>,
}

impl CaseTemplate {
    pub fn new(template: VerificationCase, variable: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            template,
            variable: variable.into(),
            values,
        }
    }

    /// One case per value, in value order. `base` supplies every other variable.
    pub fn expand(&self, base: &Variables) -> Vec<VerificationCase> {
        self.values
            .iter()
            .map(|value| {
                let vars = base.clone().with(&self.variable, value);
                self.template.expand(&vars)
            })
            .collect()
    }
}

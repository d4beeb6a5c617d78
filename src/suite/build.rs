//! Turn a parsed suite file into runnable verification cases
//!
//! Every problem is collected before anything is returned, so a broken
//! suite reports all of its errors at once and never starts a run.

use std::collections::{BTreeSet, HashSet};

use super::outputs::OutputSource;
use super::schema::{CaseDef, ExpectationDef, SuiteFile};
use crate::error::{SetupError, SetupErrors};
use crate::fetch::{CommandFetcherConfig, QueryCatalog, QueryError};
use crate::models::case::{CaseTemplate, VerificationCase};
use crate::models::expectation::{Expectation, Matcher};
use crate::models::identity::ResourceIdentity;
use crate::models::variables::{self, Variables};
use crate::verify::RunConfig;

/// A validated suite, ready to run
#[derive(Debug, Clone)]
pub struct Suite {
    pub cases: Vec<VerificationCase>,
    pub catalog: QueryCatalog,
    pub run_config: RunConfig,
    pub fetcher_config: CommandFetcherConfig,
}

/// Build and validate every case in `file`.
///
/// `${NAME}` resolves from the case's `for_each` parameter, then the
/// suite's `vars`, then `outputs`.
pub fn build_suite(file: &SuiteFile, outputs: &dyn OutputSource) -> Result<Suite, SetupErrors> {
    let mut errors = Vec::new();

    let mut catalog = QueryCatalog::builtin();
    for (kind, template) in &file.kinds {
        catalog.insert(kind, template);
    }

    if let Some(backoff) = file.settings.retry.as_ref().and_then(|r| r.backoff.as_ref()) {
        if backoff.is_conflicting() {
            errors.push(SetupError::ConflictingBackoff);
        }
    }

    let templates: Vec<(&CaseDef, Option<VerificationCase>)> = file
        .cases
        .iter()
        .map(|def| (def, case_template(def, &mut errors)))
        .collect();

    let base = base_variables(file, &templates, outputs);

    let mut cases = Vec::new();
    for (def, template) in templates {
        let Some(template) = template else {
            continue;
        };

        let expanded = match &def.for_each {
            Some(for_each) if for_each.values.is_empty() => {
                errors.push(SetupError::EmptyForEach {
                    context: def.label.clone(),
                    name: for_each.name.clone(),
                });
                continue;
            }
            Some(for_each) => {
                CaseTemplate::new(template, &for_each.name, for_each.values.clone()).expand(&base)
            }
            None => vec![template.expand(&base)],
        };

        for case in expanded {
            check_case(&case, &catalog, &mut errors);
            cases.push(case);
        }
    }

    let mut seen = HashSet::new();
    for case in &cases {
        if !seen.insert(case.label.as_str()) {
            errors.push(SetupError::DuplicateLabel {
                label: case.label.clone(),
            });
        }
    }

    if !errors.is_empty() {
        return Err(SetupErrors(errors));
    }

    Ok(Suite {
        cases,
        catalog,
        run_config: file.settings.run_config(),
        fetcher_config: file.settings.fetcher_config(),
    })
}

/// The unexpanded case for `def`, or `None` if its expectations are invalid.
fn case_template(def: &CaseDef, errors: &mut Vec<SetupError>) -> Option<VerificationCase> {
    let context = &def.label;
    if def.expect.is_empty() {
        errors.push(SetupError::NoExpectations {
            context: context.clone(),
        });
        return None;
    }

    let mut identity = ResourceIdentity::new(&def.kind);
    for (key, value) in &def.identity {
        identity = identity.with_param(key, value);
    }

    let mut case = VerificationCase::new(context, identity);
    let mut valid = true;
    for expect in &def.expect {
        match expectation(context, expect) {
            Ok(expectation) => case.expectations.push(expectation),
            Err(e) => {
                errors.push(e);
                valid = false;
            }
        }
    }

    valid.then_some(case)
}

fn expectation(context: &str, def: &ExpectationDef) -> Result<Expectation, SetupError> {
    let mut matchers = Vec::new();
    if let Some(value) = &def.equals {
        matchers.push(Matcher::Equals(value.clone()));
    }
    if let Some(sub) = &def.contains {
        matchers.push(Matcher::Contains(sub.clone()));
    }
    if def.absent {
        matchers.push(Matcher::Absent);
    }

    let matcher = match matchers.len() {
        0 => {
            return Err(SetupError::MissingMatcher {
                context: context.to_string(),
                path: def.path.clone(),
            })
        }
        1 => matchers.remove(0),
        _ => {
            return Err(SetupError::ConflictingMatchers {
                context: context.to_string(),
                path: def.path.clone(),
            })
        }
    };

    let mut expectation =
        Expectation::new(&def.path, matcher).map_err(|source| SetupError::InvalidPath {
            context: context.to_string(),
            source,
        })?;
    if let Some(label) = &def.label {
        expectation = expectation.with_label(label);
    }
    if def.allow_absent {
        expectation = expectation.allowing_absent();
    }
    Ok(expectation)
}

/// Suite variables layered over the provisioning outputs the suite uses.
fn base_variables(
    file: &SuiteFile,
    templates: &[(&CaseDef, Option<VerificationCase>)],
    outputs: &dyn OutputSource,
) -> Variables {
    let mut names = BTreeSet::new();
    for value in file.vars.values() {
        names.extend(variables::referenced(value));
    }
    for template in templates.iter().filter_map(|(_, t)| t.as_ref()) {
        names.extend(template.unresolved_variables());
    }

    let mut base = Variables::new();
    for name in &names {
        if let Some(value) = outputs.get_output(name) {
            base.set(name, &value);
        }
    }
    for (name, value) in &file.vars {
        base.set(name, value);
    }

    // Vars may refer to other vars; expand until nothing changes
    for _ in 0..=file.vars.len() {
        let mut changed = false;
        for name in file.vars.keys() {
            let current = base.get(name).unwrap_or_default().to_string();
            let expanded = base.expand(&current);
            if expanded != current {
                base.set(name, &expanded);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    base
}

fn check_case(case: &VerificationCase, catalog: &QueryCatalog, errors: &mut Vec<SetupError>) {
    for name in case.unresolved_variables() {
        errors.push(SetupError::UnresolvedVariable {
            context: case.label.clone(),
            name,
        });
    }

    match catalog.required_params(&case.identity.kind) {
        Ok(params) => {
            for param in params {
                if case.identity.param(&param).is_none() {
                    errors.push(SetupError::MissingParameter {
                        context: case.label.clone(),
                        kind: case.identity.kind.clone(),
                        param,
                    });
                }
            }
        }
        Err(QueryError::UnknownKind(kind)) => errors.push(SetupError::UnknownKind {
            context: case.label.clone(),
            kind,
        }),
        Err(QueryError::MissingParameter { .. }) => {}
    }
}

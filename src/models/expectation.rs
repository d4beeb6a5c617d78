//! Expectations: declarative assertions about one field of a descriptor

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::error::PathError;
use crate::extract::{extract, FieldPath};
use crate::models::document::{Document, FieldValue};
use crate::models::variables::Variables;

/// How an extracted value is judged
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Matcher {
    /// Present and structurally equal; numbers compare by value
    Equals(Value),
    /// Present, string-valued, and containing the substring
    Contains(String),
    /// The field is deliberately unset
    Absent,
}

impl Matcher {
    /// Decide whether `actual` satisfies this matcher.
    pub fn matches(&self, actual: Option<&FieldValue>) -> bool {
        match (self, actual) {
            (Matcher::Absent, actual) => actual.is_none(),
            (_, None) => false,
            (Matcher::Equals(expected), Some(actual)) => equals_field(expected, actual),
            (Matcher::Contains(sub), Some(actual)) => {
                actual.as_str().is_some_and(|s| s.contains(sub.as_str()))
            }
        }
    }

    /// Expand variables in expected strings.
    pub fn expand(&self, vars: &Variables) -> Matcher {
        match self {
            Matcher::Equals(value) => Matcher::Equals(expand_value(value, vars)),
            Matcher::Contains(sub) => Matcher::Contains(vars.expand(sub)),
            Matcher::Absent => Matcher::Absent,
        }
    }

    /// Every string the matcher compares against
    pub(crate) fn strings(&self) -> Vec<&str> {
        match self {
            Matcher::Equals(value) => {
                let mut out = Vec::new();
                collect_strings(value, &mut out);
                out
            }
            Matcher::Contains(sub) => vec![sub.as_str()],
            Matcher::Absent => Vec::new(),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Equals(value) => write!(f, "equals {}", FieldValue::from_value(value)),
            Matcher::Contains(sub) => write!(f, "contains {sub:?}"),
            Matcher::Absent => write!(f, "is absent"),
        }
    }
}

fn equals_field(expected: &Value, actual: &FieldValue) -> bool {
    match (expected, actual) {
        (Value::Array(_) | Value::Object(_), FieldValue::Composite(actual)) => {
            equals_json(expected, actual)
        }
        (Value::Array(_) | Value::Object(_), _) | (_, FieldValue::Composite(_)) => false,
        (expected, actual) => equals_json(expected, &scalar_json(actual)),
    }
}

fn scalar_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::Number(n) => Value::Number(n.clone()),
        FieldValue::String(s) => Value::String(s.clone()),
        FieldValue::Composite(v) => v.clone(),
    }
}

/// Structural equality where numbers compare by value (`3` == `3.0`) and a
/// number equals a string holding the same number.
fn equals_json(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            match (n.as_f64(), s.trim().parse::<f64>()) {
                (Some(a), Ok(b)) => a == b,
                _ => false,
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| equals_json(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| equals_json(x, y)))
        }
        (a, b) => a == b,
    }
}

fn expand_value(value: &Value, vars: &Variables) -> Value {
    match value {
        Value::String(s) => Value::String(vars.expand(s)),
        Value::Array(items) => Value::Array(items.iter().map(|v| expand_value(v, vars)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), expand_value(v, vars)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A single declarative assertion about one field of a descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expectation {
    pub label: String,
    pub path: FieldPath,
    pub matcher: Matcher,
    /// Treat an absent field as a match
    #[serde(skip_serializing_if = "is_false")]
    pub allow_absent: bool,
}

impl Expectation {
    /// Create an expectation with a label derived from the path and matcher.
    pub fn new(path: &str, matcher: Matcher) -> Result<Self, PathError> {
        let path = FieldPath::parse(path)?;
        Ok(Self {
            label: format!("{path} {matcher}"),
            path,
            matcher,
            allow_absent: false,
        })
    }

    pub fn equals(path: &str, value: impl Into<Value>) -> Result<Self, PathError> {
        Self::new(path, Matcher::Equals(value.into()))
    }

    pub fn contains(path: &str, substring: impl Into<String>) -> Result<Self, PathError> {
        Self::new(path, Matcher::Contains(substring.into()))
    }

    pub fn absent(path: &str) -> Result<Self, PathError> {
        Self::new(path, Matcher::Absent)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn allowing_absent(mut self) -> Self {
        self.allow_absent = true;
        self
    }

    /// Extract the field and judge it. Never fails.
    pub fn evaluate(&self, doc: &Document) -> ExpectationResult {
        let actual = extract(doc, &self.path);
        let matched = match &actual {
            None if self.allow_absent => true,
            actual => self.matcher.matches(actual.as_ref()),
        };

        ExpectationResult {
            expectation: self.clone(),
            matched,
            actual,
        }
    }

    /// Copy with variables expanded in the label and expected values
    pub fn expand(&self, vars: &Variables) -> Expectation {
        Expectation {
            label: vars.expand(&self.label),
            path: self.path.clone(),
            matcher: self.matcher.expand(vars),
            allow_absent: self.allow_absent,
        }
    }
}

/// Outcome of judging one expectation against a fetched document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpectationResult {
    pub expectation: Expectation,
    pub matched: bool,
    /// The extracted value, kept regardless of the outcome
    pub actual: Option<FieldValue>,
}

impl ExpectationResult {
    pub fn actual_display(&self) -> String {
        match &self.actual {
            Some(value) => value.to_string(),
            None => "absent".to_string(),
        }
    }

    /// One-line diagnostic: label, expected matcher, actual value
    pub fn summary(&self) -> String {
        let status = if self.matched { "PASSED" } else { "FAILED" };
        format!(
            "{status} - {} (expected {} {}, actual {})",
            self.expectation.label,
            self.expectation.path,
            self.expectation.matcher,
            self.actual_display()
        )
    }
}

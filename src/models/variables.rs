//! `${NAME}` variable expansion for case labels, identities and expected values.
//!
//! Unknown variables are left in place so that validation can report them.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_\-]*)\}").expect("Invalid regex pattern")
});

/// Named values available for expansion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    values: BTreeMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing any previous value.
    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// Builder-style variant of [`Variables::set`]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Expand every known `${NAME}` in `text`.
    pub fn expand(&self, text: &str) -> String {
        VARIABLE
            .replace_all(text, |caps: &Captures| match self.get(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// Variable names referenced anywhere in `text`
pub fn referenced(text: &str) -> Vec<String> {
    VARIABLE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

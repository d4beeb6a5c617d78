//! Field path expressions
//!
//! Syntax:
//!
//! - `a.b.c` walks nested object keys
//! - `\.` is a literal dot inside a key (`labels.app\.kubernetes\.io/name`)
//! - `items[0]` indexes an array explicitly
//! - a bare numeric segment (`items.0`) indexes an array, or looks up the
//!   key `"0"` when the node is an object
//!
//! Keys such as `substitutions._MANIFEST_DRY_REPO` are literal map lookups.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PathError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// A parsed, validated field path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let err = |reason: String| PathError {
            path: path.to_string(),
            reason,
        };

        if path.is_empty() {
            return Err(err("path is empty".into()));
        }

        let mut segments = Vec::new();
        let mut key = String::new();
        // Whether the current dot-separated part has any content yet
        let mut part_started = false;
        let mut chars = path.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(escaped) => {
                        key.push(escaped);
                        part_started = true;
                    }
                    None => return Err(err("trailing escape character".into())),
                },
                '.' => {
                    if !part_started {
                        return Err(err("empty segment".into()));
                    }
                    if !key.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    }
                    part_started = false;
                }
                '[' => {
                    if !key.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    }
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(d) => digits.push(d),
                            None => return Err(err("unclosed '['".into())),
                        }
                    }
                    let index = digits
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| err(format!("'{digits}' is not an array index")))?;
                    segments.push(Segment::Index(index));
                    part_started = true;

                    match chars.peek() {
                        None | Some('.') | Some('[') => {}
                        Some(_) => return Err(err("expected '.' or '[' after ']'".into())),
                    }
                }
                ']' => return Err(err("unmatched ']'".into())),
                other => {
                    key.push(other);
                    part_started = true;
                }
            }
        }

        if !part_started {
            return Err(err("empty segment".into()));
        }
        if !key.is_empty() {
            segments.push(Segment::Key(key));
        }

        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.raw
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

//! Field extraction from descriptor documents
//!
//! Extraction never fails: a missing key, an out-of-range index, or a leaf
//! reached before the path is exhausted all yield `None`. Absence is a
//! normal outcome that matchers decide how to treat.

mod path;


pub use path::{FieldPath, Segment};

use serde_json::Value;

use crate::error::PathError;
use crate::models::document::{Document, FieldValue};

/// Return the value at `path`, or `None` if the path does not resolve.
pub fn extract(doc: &Document, path: &FieldPath) -> Option<FieldValue> {
    let mut node = doc.root();

    for segment in path.segments() {
        node = match (segment, node) {
            (Segment::Key(key), Value::Object(map)) => map.get(key)?,
            (Segment::Key(key), Value::Array(items)) => items.get(key.parse::<usize>().ok()?)?,
            (Segment::Index(index), Value::Array(items)) => items.get(*index)?,
            _ => return None,
        };
    }

    Some(FieldValue::from_value(node))
}

/// Parse `path` and extract in one step.
pub fn extract_str(doc: &Document, path: &str) -> Result<Option<FieldValue>, PathError> {
    let path = FieldPath::parse(path)?;
    Ok(extract(doc, &path))
}

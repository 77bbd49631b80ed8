// Structured validation failures and their display/detail formatting.

use serde::{Serialize, Serializer};
use std::fmt;

/// One step into the validated input: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl Serialize for PathSegment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PathSegment::Key(key) => serializer.serialize_str(key),
            PathSegment::Index(index) => serializer.serialize_u64(*index as u64),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// A single validation failure with the path of the offending field.
///
/// Issues are aggregated per request; their order is preserved all the way
/// into the error envelope.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: Vec<PathSegment>,
    pub message: String,
    pub code: &'static str,
}

impl ValidationIssue {
    /// Issue with an empty path (whole-input failures, header values, etc.).
    pub fn root(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
            code,
        }
    }

    /// Issue attached to a single top-level field.
    pub fn field(field: &str, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            path: vec![PathSegment::from(field)],
            message: message.into(),
            code,
        }
    }

    /// Issue with an explicit multi-segment path.
    pub fn at(path: Vec<PathSegment>, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
            code,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return write!(f, "{}", self.message);
        }
        write!(f, "{} {}", join_path(&self.path), self.message)
    }
}

fn join_path(path: &[PathSegment]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<String>>()
        .join(".")
}

/// Reduces a batch of issues into one human-readable string.
///
/// Issues without a path contribute their bare message; the rest are
/// prefixed with the dot-joined path. All parts are joined with `"; "`.
pub fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<String>>()
        .join("; ")
}

/// Serializes issues into ordered `{path, message, code}` detail objects for
/// the error envelope.
pub fn issue_details(issues: &[ValidationIssue]) -> Vec<serde_json::Value> {
    issues
        .iter()
        .map(|issue| serde_json::to_value(issue).unwrap_or(serde_json::Value::Null))
        .collect()
}

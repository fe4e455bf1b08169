use std::fmt;

use thiserror::Error;

use crate::carrier::{ErrorCarrier, Problem};

/// One step of the path the validator reports for a violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    /// Split a JSON pointer (`/user/roles/0`) into segments
    ///
    /// `~1` and `~0` escapes are decoded and purely numeric segments become
    /// indices. The empty pointer yields an empty path.
    pub fn from_pointer(pointer: &str) -> Vec<Self> {
        pointer
            .split('/')
            .skip(1)
            .map(|raw| {
                let key = raw.replace("~1", "/").replace("~0", "~");
                match key.parse::<usize>() {
                    Ok(index) if !key.is_empty() && !key.starts_with('+') => Self::Index(index),
                    _ => Self::Key(key),
                }
            })
            .collect()
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// A single rule the input broke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    /// Location reported by the validator; for unknown keys this is the
    /// object that contained them
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl SchemaIssue {
    pub fn new(path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

/// Input rejected by the schema validator
#[derive(Debug, Clone, Error)]
#[error("schema validation failed with {} issue(s)", .issues.len())]
pub struct SchemaViolation {
    issues: Vec<SchemaIssue>,
}

impl SchemaViolation {
    pub const fn new(issues: Vec<SchemaIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[SchemaIssue] {
        &self.issues
    }
}

/// Translate a schema violation: one problem per issue, keyed by the last
/// segment of the reported path
pub fn translate(violation: &SchemaViolation) -> ErrorCarrier {
    let problems = violation
        .issues
        .iter()
        .map(|issue| {
            let path = issue.path.last().map(ToString::to_string).unwrap_or_default();
            Problem::new(path, issue.message.as_str())
        })
        .collect();

    ErrorCarrier::new(400, "Validation Error")
        .with_problems(problems)
        .with_trace(Some(format!("{violation:?}")))
}

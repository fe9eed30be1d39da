//! Uniform representation of execution failures returned to clients.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code attached to results of queries that ran past their deadline.
pub const TIMEOUT_CODE: &str = "E_TIMEOUT";

/// Classification carried in `extensions.classification`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    DomainError,
    DataFetchingException,
    ValidationError,
    ExecutionTimeout,
    BadRequest,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::DomainError => "DomainError",
            ErrorKind::DataFetchingException => "DataFetchingException",
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::ExecutionTimeout => "ExecutionTimeout",
            ErrorKind::BadRequest => "BadRequest",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

/// One step of an execution path: a response key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => f.write_str(name),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorExtensions {
    pub classification: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

/// A single error entry of an [`ExecutionResult`](super::ExecutionResult).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<SourceLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
    pub extensions: ErrorExtensions,
}

impl StructuredError {
    fn of_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: None,
            extensions: ErrorExtensions {
                classification: kind,
                error_code: None,
                stack_trace: None,
            },
        }
    }

    /// Expected failure with a domain code.
    pub fn domain(code: impl Into<String>, message: impl Into<String>) -> Self {
        let mut error = Self::of_kind(ErrorKind::DomainError, message);
        error.extensions.error_code = Some(code.into());
        error
    }

    /// Unexpected resolver failure; the message is prefixed with the path.
    pub fn data_fetching(path: Vec<PathSegment>, message: &str, trace: Option<String>) -> Self {
        let message = format!(
            "Exception while fetching data ({}) : {}",
            path_string(&path),
            message
        );
        let mut error = Self::of_kind(ErrorKind::DataFetchingException, message);
        error.path = Some(path);
        error.extensions.stack_trace = trace;
        error
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::ValidationError, message)
    }

    pub fn timeout(limit_ms: u128) -> Self {
        let mut error = Self::of_kind(
            ErrorKind::ExecutionTimeout,
            format!("Query execution exceeded {} ms", limit_ms),
        );
        error.extensions.error_code = Some(TIMEOUT_CODE.to_string());
        error
    }

    /// Placeholder for a batch item that could not be read as a request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::BadRequest, message)
    }

    /// Attach path and locations.
    pub fn at(mut self, path: Option<Vec<PathSegment>>, locations: Vec<SourceLocation>) -> Self {
        if path.is_some() {
            self.path = path;
        }
        self.locations = locations;
        self
    }

    /// Same error without the stack trace.
    pub fn without_detail(mut self) -> Self {
        self.extensions.stack_trace = None;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.extensions.classification
    }

    pub fn code(&self) -> Option<&str> {
        self.extensions.error_code.as_deref()
    }

    pub fn detail(&self) -> Option<&str> {
        self.extensions.stack_trace.as_deref()
    }
}

/// `/a/0/b` rendering of a path.
pub fn path_string(path: &[PathSegment]) -> String {
    let mut rendered = String::new();
    for segment in path {
        rendered.push('/');
        rendered.push_str(&segment.to_string());
    }
    rendered
}

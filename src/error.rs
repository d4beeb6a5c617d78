//! Error types shared across the verification engine.
//!
//! Fetch failures and run timeouts are recorded as case outcomes and never
//! cross a case boundary. Only [`SetupError`] is fatal, and it is raised
//! before a run starts.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::models::identity::ResourceIdentity;

/// Whether retrying a failed fetch can be expected to help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorClass {
    /// Propagation delay or rate limiting; likely to resolve on retry
    Transient,
    /// Bad identity, bad credentials or bad output; retrying cannot help
    Permanent,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Transient => write!(f, "transient"),
            ErrorClass::Permanent => write!(f, "permanent"),
        }
    }
}

/// What went wrong while describing a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchErrorKind {
    /// The resource is not (yet) visible
    NotFound,
    /// The description API throttled the request
    RateLimited,
    /// The backend was temporarily unavailable
    Unavailable,
    /// The describe command exceeded its timeout
    TimedOut,
    /// Credentials are missing or lack permission
    AuthFailure,
    /// The identity cannot be turned into a query
    MalformedIdentity,
    /// The command succeeded but its output is not structured data
    Unparseable,
    /// The command failed for an unclassified reason or could not be spawned
    CommandFailed,
    /// The fetcher itself panicked
    Internal,
}

impl FetchErrorKind {
    pub fn class(&self) -> ErrorClass {
        match self {
            FetchErrorKind::NotFound
            | FetchErrorKind::RateLimited
            | FetchErrorKind::Unavailable
            | FetchErrorKind::TimedOut => ErrorClass::Transient,
            FetchErrorKind::AuthFailure
            | FetchErrorKind::MalformedIdentity
            | FetchErrorKind::Unparseable
            | FetchErrorKind::CommandFailed
            | FetchErrorKind::Internal => ErrorClass::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchErrorKind::NotFound => "not found",
            FetchErrorKind::RateLimited => "rate limited",
            FetchErrorKind::Unavailable => "unavailable",
            FetchErrorKind::TimedOut => "timed out",
            FetchErrorKind::AuthFailure => "auth failure",
            FetchErrorKind::MalformedIdentity => "malformed identity",
            FetchErrorKind::Unparseable => "unparseable output",
            FetchErrorKind::CommandFailed => "command failed",
            FetchErrorKind::Internal => "internal error",
        };
        write!(f, "{s}")
    }
}

/// A failed attempt to describe a live resource.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("failed to describe {identity}: {kind}: {cause}")]
pub struct FetchError {
    pub identity: ResourceIdentity,
    pub kind: FetchErrorKind,
    pub cause: String,
}

impl FetchError {
    pub fn new(identity: &ResourceIdentity, kind: FetchErrorKind, cause: impl Into<String>) -> Self {
        Self {
            identity: identity.clone(),
            kind,
            cause: cause.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// A case that was still unresolved when the run deadline expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("run deadline of {}s expired before the case resolved", .deadline.as_secs_f64())]
pub struct RunTimeout {
    pub deadline: Duration,
}

/// Malformed field path in an expectation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid field path '{path}': {reason}")]
pub struct PathError {
    pub path: String,
    pub reason: String,
}

/// Configuration errors detected before a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("{context}: {source}")]
    InvalidPath {
        context: String,
        #[source]
        source: PathError,
    },

    #[error("{context}: expectation on '{path}' declares no matcher (use equals, contains or absent)")]
    MissingMatcher { context: String, path: String },

    #[error("{context}: expectation on '{path}' declares more than one matcher")]
    ConflictingMatchers { context: String, path: String },

    #[error("{context}: unresolved variable ${{{name}}}")]
    UnresolvedVariable { context: String, name: String },

    #[error("{context}: unknown resource kind '{kind}'")]
    UnknownKind { context: String, kind: String },

    #[error("{context}: query for kind '{kind}' needs parameter '{param}'")]
    MissingParameter {
        context: String,
        kind: String,
        param: String,
    },

    #[error("duplicate case label '{label}'")]
    DuplicateLabel { label: String },

    #[error("{context}: for_each '{name}' has no values")]
    EmptyForEach { context: String, name: String },

    #[error("{context}: case has no expectations")]
    NoExpectations { context: String },

    #[error("retry backoff sets both fixed_ms and exponential")]
    ConflictingBackoff,

    #[error("descriptor program '{program}' not found on PATH")]
    ProgramNotFound { program: String },
}

/// Every setup error found while validating a suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupErrors(pub Vec<SetupError>);

impl fmt::Display for SetupErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} setup error(s):", self.0.len())?;
        for error in &self.0 {
            writeln!(f, "  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SetupErrors {}

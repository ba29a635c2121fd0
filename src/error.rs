//! Error types for concept-graph operations.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using concept-graph's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// External collaborator a failed call was addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    GraphStore,
    ResourceAuthority,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Upstream::GraphStore => write!(f, "graph store"),
            Upstream::ResourceAuthority => write!(f, "resource authority"),
        }
    }
}

/// Coarse classification callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    UpstreamUnavailable,
}

/// Core error type for graph operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A resource required as a precondition is missing from the graph
    #[error("{resource} {id} not found")]
    NotFound { resource: String, id: String },

    /// Rejected before any graph call was issued
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Transport, status or decode failure talking to an external service
    #[error("{service} unavailable: {message}")]
    UpstreamUnavailable { service: Upstream, message: String },

    /// External call exceeded its deadline
    #[error("{service} call timed out after {after:?}")]
    Timeout { service: Upstream, after: Duration },
}

impl Error {
    pub fn not_found(resource: impl fmt::Display, id: impl Into<String>) -> Self {
        Error::NotFound {
            resource: resource.to_string(),
            id: id.into(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn graph(err: impl fmt::Display) -> Self {
        Error::UpstreamUnavailable {
            service: Upstream::GraphStore,
            message: err.to_string(),
        }
    }

    pub fn authority(err: impl fmt::Display) -> Self {
        Error::UpstreamUnavailable {
            service: Upstream::ResourceAuthority,
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::UpstreamUnavailable { .. } | Error::Timeout { .. } => {
                ErrorKind::UpstreamUnavailable
            }
        }
    }
}

impl From<neo4rs::Error> for Error {
    fn from(e: neo4rs::Error) -> Self {
        Error::graph(e)
    }
}

impl From<neo4rs::DeError> for Error {
    fn from(e: neo4rs::DeError) -> Self {
        Error::graph(format!("row decode: {}", e))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::authority(e)
    }
}

//! Error types shared across the signup cascade.

use thiserror::Error;

use crate::context::PageAnchor;
use crate::selection::Field;

/// Failure of a single resolver lookup. Never retried; the caller leaves the
/// affected field as it was and logs the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    /// The request could not complete (connection, transport, non-success status)
    #[error("resolver request failed: {0}")]
    NetworkFailure(String),
    /// The response was missing the expected array or carried ill-typed entries
    #[error("malformed resolver response: {0}")]
    MalformedResponse(String),
    /// Lookups are keyed by squadron; an empty one is a caller bug
    #[error("a squadron is required for resolver lookups")]
    MissingSquadron,
}

/// Misuse of the cascade API by the view layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CascadeError {
    #[error("'{value}' is not an available option for {field}")]
    UnknownOption { field: Field, value: String },
    #[error("{0} is not active")]
    FieldInactive(Field),
    #[error("{0} is locked to a single option")]
    FieldLocked(Field),
}

/// Problems turning the page bootstrap payload into a campaign context.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A top-level anchor is missing. Fatal to the whole page.
    #[error("{}", .0.notice())]
    MissingAnchor(PageAnchor),
    #[error("failed to read bootstrap data: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse bootstrap data: {0}")]
    Parse(#[from] serde_json::Error),
}

impl BootstrapError {
    /// Persistent notice text for the page, when the error is a missing anchor.
    pub fn notice(&self) -> Option<String> {
        match self {
            BootstrapError::MissingAnchor(anchor) => Some(anchor.notice()),
            _ => None,
        }
    }
}

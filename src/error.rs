//! Error types
//!
//! Remote rejections are kept apart from local failures so callers can tell
//! a `NotAuthorizedOrNotFound` from a broken config file.

use thiserror::Error;

/// Service error code returned while a resource is invisible to the caller
pub const NOT_AUTHORIZED_OR_NOT_FOUND: &str = "NotAuthorizedOrNotFound";

/// Service error code returned when an `if-match` precondition fails
pub const PRECONDITION_FAILED: &str = "PreconditionFailed";

pub type Result<T> = std::result::Result<T, Error>;

/// A request the OCI control plane rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code} ({status}): {message}{}", request_id_suffix(.request_id))]
pub struct ServiceFailure {
    pub status: u16,
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

impl ServiceFailure {
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            request_id: None,
        }
    }

    /// The resource does not exist, or this principal may not see it
    pub fn is_not_found(&self) -> bool {
        self.status == 404 || self.code == NOT_AUTHORIZED_OR_NOT_FOUND
    }

    pub fn is_precondition_failed(&self) -> bool {
        self.status == 412 || self.code == PRECONDITION_FAILED
    }
}

fn request_id_suffix(request_id: &Option<String>) -> String {
    request_id
        .as_ref()
        .map(|id| format!(" [opc-request-id: {}]", id))
        .unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("service error: {0}")]
    Service(#[from] ServiceFailure),

    #[error(
        "expected exactly one {resource} in {scope} but found {count}. \
         Please specify it via `{flag}`. You can list them with `lpgctl {listing}`"
    )]
    AmbiguousInput {
        resource: &'static str,
        scope: String,
        flag: &'static str,
        listing: &'static str,
        count: usize,
    },

    #[error("invalid peering material: {0}")]
    Validation(String),

    #[error("gave up waiting for {what} after {attempts} attempts")]
    PollTimeout { what: String, attempts: u32 },

    #[error("config error: {0}")]
    Config(String),

    #[error("request signing failed: {0}")]
    Signing(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The underlying service failure, if the remote side rejected the call
    pub fn service_failure(&self) -> Option<&ServiceFailure> {
        match self {
            Error::Service(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.service_failure().is_some_and(ServiceFailure::is_not_found)
    }

    pub fn is_precondition_failed(&self) -> bool {
        self.service_failure()
            .is_some_and(ServiceFailure::is_precondition_failed)
    }
}

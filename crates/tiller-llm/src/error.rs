use std::fmt;

use thiserror::Error;

/// Category of a failure reported by a [`Transport`](crate::Transport)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection could not be established or was dropped
    Connection,
    /// Request exceeded its timeout
    Timeout,
    /// Provider throttled the request
    RateLimited,
    /// Provider reported itself unavailable
    ServiceUnavailable,
    /// Provider failed while producing the response
    InternalServer,
    /// Provider rejected the request
    BadRequest,
    /// Credentials missing or rejected
    Authentication,
    /// Anything else
    Other,
}

impl TransportErrorKind {
    /// Short name used in messages and logs
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection error",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate limited",
            Self::ServiceUnavailable => "service unavailable",
            Self::InternalServer => "internal server error",
            Self::BadRequest => "bad request",
            Self::Authentication => "authentication error",
            Self::Other => "transport error",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure raised by a transport while calling the provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    /// Failure category
    pub kind: TransportErrorKind,
    /// Provider or client message
    pub message: String,
}

impl TransportError {
    /// Create a transport error
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Connection-level failure
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connection, message)
    }

    /// Provider-side internal failure
    pub fn internal_server(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::InternalServer, message)
    }

    /// Provider unavailable
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::ServiceUnavailable, message)
    }

    /// Request rejected by the provider
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::BadRequest, message)
    }
}

/// Errors surfaced by completion calls
#[derive(Debug, Error)]
pub enum LlmError {
    /// Provider answered without usable choices
    #[error("{message}")]
    NoResponse {
        /// Description of the missing or malformed content
        message: String,
        /// Transport failure this was reclassified from
        #[source]
        source: Option<TransportError>,
    },

    /// Transport failure passed through unchanged
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Call or client configuration is unusable
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Provider output could not be interpreted
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// Final error after every allowed attempt failed
    #[error("{source} (attempt {attempts} of {max_attempts})")]
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// Attempts allowed by the retry policy
        max_attempts: u32,
        /// Error returned by the last attempt
        #[source]
        source: Box<LlmError>,
    },
}

impl LlmError {
    /// No-response error without an underlying transport failure
    pub fn no_response(message: impl Into<String>) -> Self {
        Self::NoResponse {
            message: message.into(),
            source: None,
        }
    }

    /// Error returned by the last attempt, looking through retry metadata
    pub fn root(&self) -> &Self {
        match self {
            Self::RetriesExhausted { source, .. } => source.root(),
            other => other,
        }
    }

    /// Number of attempts made, when the retry budget ran out
    pub const fn attempts(&self) -> Option<u32> {
        match self {
            Self::RetriesExhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// Whether this is a no-response failure
    pub fn is_no_response(&self) -> bool {
        matches!(self.root(), Self::NoResponse { .. })
    }

    /// Transport failure behind this error, if any
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self.root() {
            Self::Transport(e) => Some(e),
            Self::NoResponse { source, .. } => source.as_ref(),
            _ => None,
        }
    }
}

//! Error types for request dispatch
//!
//! Every call made through the client resolves to exactly one of the
//! [`ClientError`] variants on failure. The application error shape `E` is
//! chosen per endpoint and decoded from the body of unexpected statuses.

use std::fmt;
use thiserror::Error;

use crate::envelope::ErrorEnvelope;

/// Maximum number of body bytes kept in a decode error
const MAX_BODY_EXCERPT: usize = 512;

/// Result type for client calls with error shape `E`
pub type ClientResult<T, E = ErrorEnvelope> = std::result::Result<T, ClientError<E>>;

/// Coarse classification of a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Timeout => "timeout",
            Self::Connect => "connection",
            Self::Request => "request build",
            Self::Body => "body",
            Self::Other => "unknown",
        };
        f.write_str(label)
    }
}

/// The request never produced a complete response
#[derive(Error, Debug)]
#[error("{method} {path} failed ({kind}): {message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    method: String,
    path: String,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    /// Creates a transport error without an underlying cause
    pub fn new(
        kind: TransportErrorKind,
        method: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            method: method.into(),
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Wraps a reqwest failure, classifying it by kind
    pub fn from_reqwest(err: reqwest::Error, method: &str, path: &str) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_request() || err.is_builder() {
            TransportErrorKind::Request
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Other
        };
        Self {
            kind,
            method: method.to_string(),
            path: path.to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}

/// Failure reported by a response decoder
#[derive(Error, Debug)]
pub enum DecodeFailure {
    /// The body did not match the expected shape
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The body was required but empty
    #[error("empty response body")]
    Empty,
}

/// Error returned by every dispatched call
///
/// `E` is the endpoint's application error shape, decoded from the body of
/// any non-2xx status other than 404 and 409.
#[derive(Error, Debug)]
pub enum ClientError<E = ErrorEnvelope> {
    /// Transport failure; no response was read
    #[error("error on do request: {0}")]
    Transport(#[from] TransportError),

    /// The server answered 404
    #[error("Not Found")]
    NotFound,

    /// The server answered 409
    #[error("Conflict")]
    Conflict,

    /// Non-2xx response whose body decoded into the error shape
    #[error("{error}")]
    Application { status: u16, error: E },

    /// Non-2xx response whose body did not decode into the error shape
    #[error("request failed, code={status}, body={body}")]
    Status { status: u16, body: String },

    /// 2xx response whose body could not be decoded
    #[error("failed to decode response (code={status}): {source}; body: {body}")]
    Decode {
        status: u16,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// 2xx response with an empty body where one was required
    #[error("empty response (code={status})")]
    EmptyResponse { status: u16 },

    /// The request body could not be serialized
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// The call was rejected before anything was sent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl<E> ClientError<E> {
    /// Creates an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// HTTP status of the response that caused the error, if one was read
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound => Some(404),
            Self::Conflict => Some(409),
            Self::Application { status, .. }
            | Self::Status { status, .. }
            | Self::Decode { status, .. }
            | Self::EmptyResponse { status } => Some(*status),
            Self::Transport(_) | Self::Encode(_) | Self::InvalidArgument(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict)
    }

    /// True if the error came from a response with the given status
    pub fn is_status(&self, code: u16) -> bool {
        self.status() == Some(code)
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// The decoded application error, if any
    pub fn application(&self) -> Option<&E> {
        match self {
            Self::Application { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Converts the application error shape, leaving other variants untouched
    pub fn map_application<F>(self, f: impl FnOnce(E) -> F) -> ClientError<F> {
        match self {
            Self::Transport(err) => ClientError::Transport(err),
            Self::NotFound => ClientError::NotFound,
            Self::Conflict => ClientError::Conflict,
            Self::Application { status, error } => ClientError::Application {
                status,
                error: f(error),
            },
            Self::Status { status, body } => ClientError::Status { status, body },
            Self::Decode {
                status,
                body,
                source,
            } => ClientError::Decode {
                status,
                body,
                source,
            },
            Self::EmptyResponse { status } => ClientError::EmptyResponse { status },
            Self::Encode(err) => ClientError::Encode(err),
            Self::InvalidArgument(msg) => ClientError::InvalidArgument(msg),
        }
    }
}

/// A required path component was empty
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{0} is required")]
pub struct MissingArgument(pub &'static str);

impl<E> From<MissingArgument> for ClientError<E> {
    fn from(err: MissingArgument) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

/// Rejects an empty index name, document id or script id before the
/// request is built
pub(crate) fn require(name: &'static str, value: &str) -> Result<(), MissingArgument> {
    if value.is_empty() {
        Err(MissingArgument(name))
    } else {
        Ok(())
    }
}

/// Lossy UTF-8 text of at most [`MAX_BODY_EXCERPT`] bytes of `body`
pub(crate) fn body_excerpt(body: &[u8]) -> String {
    if body.len() <= MAX_BODY_EXCERPT {
        return String::from_utf8_lossy(body).into_owned();
    }
    format!(
        "{}... ({} bytes)",
        String::from_utf8_lossy(&body[..MAX_BODY_EXCERPT]),
        body.len()
    )
}

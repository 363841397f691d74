//! Error model for the `engine-client` crate.

use std::{fmt, time::Duration};

use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Convenience result type.
pub type Result<T> = std::result::Result<T, Error>;

/// High-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An I/O level failure (socket, EOF, etc.).
    Io,
    /// JSON encoding/decoding failure.
    Json,
    /// The HTTP transport failed (handshake, request, body read).
    Transport,
    /// A response body did not follow the expected framing.
    Format,
    /// The engine answered with a status code >= 400.
    Api,
    /// The call timed out.
    Timeout,
    /// Invalid client configuration (endpoint, version, request).
    Config,
}

/// Classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Any error status that is not more specifically classified.
    Generic,
    /// A 404 for a resource other than an image.
    NotFound,
    /// A 404 whose explanation names a missing image.
    ImageNotFound,
}

/// An HTTP error returned by the engine API.
///
/// `Display` renders the composed message, e.g.
/// `404 Client Error: Not Found ("No such image: foo")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    explanation: Option<String>,
    kind: ApiErrorKind,
}

impl ApiError {
    /// Build an error from a status and the (already decoded) explanation.
    ///
    /// Returns `None` for statuses below 400.
    #[must_use]
    pub fn new(status: StatusCode, explanation: Option<String>) -> Option<Self> {
        if status.as_u16() < 400 {
            return None;
        }

        let explanation = explanation.filter(|e| !e.is_empty());
        let kind = classify(status, explanation.as_deref());

        Some(Self {
            status,
            explanation,
            kind,
        })
    }

    /// Build an error from a status and a raw response body.
    ///
    /// The explanation is the JSON `message` field when the body is a JSON
    /// object carrying one, otherwise the trimmed body text.
    #[must_use]
    pub fn from_body(status: StatusCode, body: &[u8]) -> Option<Self> {
        Self::new(status, Some(explanation_from_body(body)))
    }

    /// HTTP status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Canonical reason phrase for the status.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("Unknown")
    }

    /// The engine's explanation, when it sent one.
    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Error classification.
    #[must_use]
    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    /// 4xx status.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// 5xx status.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.status.as_u16();
        if self.is_client_error() {
            write!(f, "{code} Client Error: {}", self.reason())?;
        } else if self.is_server_error() {
            write!(f, "{code} Server Error: {}", self.reason())?;
        } else {
            write!(f, "{code} {}", self.reason())?;
        }

        if let Some(explanation) = &self.explanation {
            write!(f, " (\"{explanation}\")")?;
        }

        Ok(())
    }
}

impl std::error::Error for ApiError {}

fn classify(status: StatusCode, explanation: Option<&str>) -> ApiErrorKind {
    if status != StatusCode::NOT_FOUND {
        return ApiErrorKind::Generic;
    }

    match explanation {
        Some(e)
            if e.contains("No such image")
                || e.contains("not found: does not exist or no pull access") =>
        {
            ApiErrorKind::ImageNotFound
        }
        _ => ApiErrorKind::NotFound,
    }
}

fn explanation_from_body(body: &[u8]) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
        if let Some(Value::String(message)) = map.get("message") {
            return message.clone();
        }
    }

    String::from_utf8_lossy(body).trim().to_string()
}

/// Structured error type.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Socket / file I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Lower-level error.
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {source}")]
    Json {
        /// Lower-level error.
        #[from]
        source: serde_json::Error,
    },

    /// The HTTP connection failed.
    #[error("HTTP transport error: {source}")]
    Http {
        /// Lower-level error.
        #[from]
        source: hyper::Error,
    },

    /// An HTTP request could not be constructed.
    #[error("invalid request: {source}")]
    Request {
        /// Lower-level error.
        #[from]
        source: http::Error,
    },

    /// A response body was malformed (frame header, JSON stream leftovers).
    #[error("malformed response body: {message}")]
    Format {
        /// Human readable message.
        message: String,
    },

    /// The engine returned an error status.
    #[error("{source}")]
    Api {
        /// The decoded API error.
        #[from]
        source: ApiError,
    },

    /// A call exceeded the configured timeout.
    #[error("request timed out after {timeout:?}")]
    Timeout {
        /// Timeout value.
        timeout: Duration,
    },

    /// The endpoint string could not be parsed or is unsupported.
    #[error("invalid endpoint: {message}")]
    InvalidEndpoint {
        /// Human readable message.
        message: String,
    },

    /// An operation requires a newer API version than the client speaks.
    #[error("{operation} requires API version {minimum} or later (client uses {current})")]
    UnsupportedVersion {
        /// Operation name.
        operation: &'static str,
        /// Minimum version the operation needs.
        minimum: &'static str,
        /// Version configured on the client.
        current: String,
    },
}

impl Error {
    /// Returns a coarse error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::Json { .. } => ErrorKind::Json,
            Self::Http { .. } => ErrorKind::Transport,
            Self::Format { .. } => ErrorKind::Format,
            Self::Api { .. } => ErrorKind::Api,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Request { .. } | Self::InvalidEndpoint { .. } | Self::UnsupportedVersion { .. } => {
                ErrorKind::Config
            }
        }
    }

    /// The API error, if this is one.
    #[must_use]
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api { source } => Some(source),
            _ => None,
        }
    }

    /// Whether this is a 404 from the engine (any resource, images included).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.api().map(ApiError::kind),
            Some(ApiErrorKind::NotFound | ApiErrorKind::ImageNotFound)
        )
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    pub(crate) fn endpoint(message: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            message: message.into(),
        }
    }
}

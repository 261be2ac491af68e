//! Error types for the one-shot HTTP client.
//!
//! # Design
//! Every failure of a call surfaces as exactly one `HttpError` variant.
//! Nothing is retried or recovered internally. Status-code failures carry
//! only the code token as it appeared on the status line; the headers and
//! body of an error response are never read.

use std::io;

/// Errors returned by `HttpClient::send` and friends.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The method is not one of the supported tokens or the URL has no
    /// usable components. Raised before any I/O.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The transport could not be opened, written or read.
    #[error("connection error: {message}")]
    Connection { code: Option<i32>, message: String },

    /// The server answered with a 4xx status.
    #[error("server responded with {status} status code")]
    ClientError { status: String },

    /// The server answered with a 5xx status.
    #[error("server responded with {status} status code")]
    ServerError { status: String },

    /// The response declared a JSON content type but its body did not decode.
    #[error("error decoding JSON:\r\n{body}")]
    JsonConversion { body: String },
}

impl HttpError {
    pub(crate) fn connection(message: impl Into<String>) -> Self {
        HttpError::Connection {
            code: None,
            message: message.into(),
        }
    }

    /// The status code carried by `ClientError` and `ServerError`.
    pub fn status(&self) -> Option<&str> {
        match self {
            HttpError::ClientError { status } | HttpError::ServerError { status } => Some(status),
            _ => None,
        }
    }
}

impl From<io::Error> for HttpError {
    fn from(err: io::Error) -> Self {
        HttpError::Connection {
            code: err.raw_os_error(),
            message: err.to_string(),
        }
    }
}

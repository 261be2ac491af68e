//! Classification of response status codes.

use crate::error::HttpError;

/// Outcome implied by the leading digit of a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    ClientError,
    ServerError,
}

/// `4xx` is a client error, `5xx` a server error, anything else succeeds.
pub fn classify(status: &str) -> StatusClass {
    match status.chars().next() {
        Some('4') => StatusClass::ClientError,
        Some('5') => StatusClass::ServerError,
        _ => StatusClass::Success,
    }
}

/// Turn an error class into the matching `HttpError`.
pub fn check_status(status: &str) -> Result<(), HttpError> {
    match classify(status) {
        StatusClass::Success => Ok(()),
        StatusClass::ClientError => Err(HttpError::ClientError {
            status: status.to_string(),
        }),
        StatusClass::ServerError => Err(HttpError::ServerError {
            status: status.to_string(),
        }),
    }
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Backing errors for all STS operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed API (message: {message:?}, retryable: {retryable:?})")]
    API { message: String, retryable: bool },
    #[error("failed to decode response (message: {message:?})")]
    Response { message: String },
    #[error("failed for other reasons (message: {message:?}, retryable: {retryable:?})")]
    Other { message: String, retryable: bool },
}

impl Error {
    /// Returns the error message in "String".
    #[inline]
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Error::API { message, .. }
            | Error::Other { message, .. }
            | Error::Response { message } => message.clone(),
        }
    }

    /// Returns if the error is retryable.
    #[inline]
    #[must_use]
    pub fn retryable(&self) -> bool {
        match self {
            Error::API { retryable, .. } | Error::Other { retryable, .. } => *retryable,
            Error::Response { .. } => false,
        }
    }

    /// Returns true if the error came from decoding a malformed response body.
    #[inline]
    #[must_use]
    pub fn is_response(&self) -> bool {
        matches!(self, Error::Response { .. })
    }
}

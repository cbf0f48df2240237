//! Wrapper around Reqwest's error type so transport failures can be matched
//! exhaustively without depending on reqwest's predicates.

use std::error::Error as StdError;
use std::fmt;

/// The category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request could not be assembled (for example, a malformed URL).
    InvalidRequest,
    /// DNS resolution, TCP or TLS setup failed.
    ConnectFailed,
    /// The connection broke while the body was being read.
    BodyFailed,
    DecodingFailed,
    RedirectPolicyViolated,
    TimedOut,
    UnknownReqwestError,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: reqwest::Error,
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::new(err)
    }
}

impl Error {
    pub(crate) fn new(err: reqwest::Error) -> Error {
        let kind = if err.is_builder() {
            ErrorKind::InvalidRequest
        } else if err.is_timeout() {
            ErrorKind::TimedOut
        } else if err.is_connect() {
            ErrorKind::ConnectFailed
        } else if err.is_body() {
            ErrorKind::BodyFailed
        } else if err.is_decode() {
            ErrorKind::DecodingFailed
        } else if err.is_redirect() {
            ErrorKind::RedirectPolicyViolated
        } else {
            ErrorKind::UnknownReqwestError
        };

        Error { kind, source: err }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Whether the failure happened before any byte reached the service.
    pub fn is_before_send(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::InvalidRequest | ErrorKind::ConnectFailed
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::InvalidRequest => write!(f, "the request could not be built"),
            ErrorKind::ConnectFailed => write!(f, "could not connect to the service"),
            ErrorKind::BodyFailed => write!(f, "the response body was interrupted"),
            ErrorKind::DecodingFailed => write!(f, "the response body could not be decoded"),
            ErrorKind::RedirectPolicyViolated => write!(f, "redirect policy violated"),
            ErrorKind::TimedOut => write!(f, "the request timed out"),
            ErrorKind::UnknownReqwestError => write!(f, "the request failed"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}

//! Request dispatch for the Shodan REST, streaming and exploits APIs.
//!
//! Every request made by this crate passes through a [`Client`], which holds an
//! immutable credential and API base along with a [`ConnectionPool`]. The client
//! offers three operations:
//! - [`Client::get`]: a GET request answered by a single JSON document.
//! - [`Client::post`]: a POST request with a form-encoded query and optional body.
//! - [`Client::consume_stream`]: a GET request answered by newline-delimited JSON,
//!   delivered to a callback item by item, optionally bounded by a `limit`.
//!
//! ## Blocking and non-blocking calls
//!
//! Each operation returns a [`Dispatched`] value. When it is called outside of a
//! tokio runtime, a fresh single-threaded runtime is created for the call and the
//! result is [`Dispatched::Complete`]. When it is called from inside a runtime the
//! request is spawned as a child task and a [`Pending`] handle is returned instead.
//! `Dispatched` implements [`IntoFuture`](std::future::IntoFuture), so async code can
//! simply `.await` it in either case.
//!
//! ## Error Handling
//!
//! The service reports failures as a JSON mapping with an `"error"` message, often
//! alongside a successful HTTP status. These messages are classified into
//! [`ServiceErrorKind`]s so callers can branch on the kind of failure rather than on
//! its text. Messages which match no known kind surface as
//! [`Error::UnknownService`]. Non-success HTTP statuses surface as
//! [`Error::HttpStatus`].

mod apireq;
mod classify;
mod client;
mod dispatch;
mod executor;
mod params;
mod pool;
mod query;
mod stream;

pub mod exploits;
pub mod rest;
pub mod streaming;

#[cfg(test)]
pub(crate) mod mock_server;

use thiserror::Error;

pub use apireq::{DeseralizationFailedError, JsonStreamError, ReqwestError, ReqwestErrorKind};
pub use classify::classify;
pub use client::{
    Client, ClientBuilder, Credential, EXPLOITS_API_BASE, REST_API_BASE, STREAM_API_BASE,
};
pub use dispatch::{in_runtime, Dispatched, Pending};
pub use exploits::ExploitsApi;
pub use params::{ParamValue, Params};
pub use pool::{ConnectionPool, Lease, PoolSettings, PoolStats};
pub use query::{Facets, Query};
pub use rest::RestApi;
pub use stream::ItemStream;
pub use streaming::StreamingApi;

/// The kinds of failure the service reports through an `"error"` message.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
pub enum ServiceErrorKind {
    /// Too many requests were made in too short a time.
    #[strum(serialize = "rate limited")]
    RateLimited,
    /// The service holds no information about the requested resource.
    #[strum(serialize = "no information available")]
    NoInformation,
    /// A search was issued without a query.
    #[strum(serialize = "empty search query")]
    NoQuery,
    /// The API key is not permitted to use the endpoint.
    #[strum(serialize = "access denied")]
    AccessDenied,
    /// The API key was not recognized.
    #[strum(serialize = "invalid API key")]
    InvalidKey,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("no API key was provided")]
    MissingApiKey,

    #[error("invalid api base")]
    InvalidApiBase(#[source] url::ParseError),

    #[error("invalid stream limit \"{0}\", expected a positive integer")]
    InvalidLimit(String),

    #[error("{}", .0)]
    Transport(
        #[from]
        #[source]
        ReqwestError,
    ),

    /// The service answered with a non-success status. The `"error"` message
    /// of the body is kept when one was present.
    #[error("the service responded with HTTP status {status}{}", .message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
    HttpStatus { status: u16, message: Option<String> },

    #[error("the response body was not valid JSON")]
    InvalidJson(#[source] serde_json::Error),

    #[error("failed to parse streamed response")]
    StreamParser(
        #[from]
        #[source]
        JsonStreamError,
    ),

    #[error("{kind}: {message}")]
    Service {
        kind: ServiceErrorKind,
        message: String,
    },

    #[error("the service reported an error: {0}")]
    UnknownService(String),

    #[error("failed to start a runtime for a blocking request")]
    Runtime(#[source] std::io::Error),

    #[error("the request was cancelled")]
    Cancelled,
}

impl Error {
    /// The classified service error kind, if this is a classified service error.
    pub fn service_kind(&self) -> Option<ServiceErrorKind> {
        match self {
            Error::Service { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The HTTP status for a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

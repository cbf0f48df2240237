//! A utility module with helpers for making and parsing API requests.

mod error;
mod json_stream_parser;
mod stream_ext;

pub use error::Error as ReqwestError;
pub use error::ErrorKind as ReqwestErrorKind;

pub use json_stream_parser::DeseralizationFailedError;
pub use json_stream_parser::Error as JsonStreamError;
pub(crate) use json_stream_parser::JsonStreamParser;
pub(crate) use stream_ext::{BodyStream, ReqwestResponseStreamExt};

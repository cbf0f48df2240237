//! This module parses streams of newline-delimited JSON documents from an HTTP response.
//! It expects a byte stream, as produced by the [`reqwest::Response::bytes_stream`]
//! method, and yields one document per non-blank line. Only the line currently
//! being assembled is buffered, so long-lived streams can be consumed incrementally.

use bytes::Bytes;
use core::fmt;
use futures_core::stream::Stream;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use std::error::Error as StdError;
use std::marker::Unpin;

use super::ReqwestError;

#[derive(Debug)]
pub struct DeseralizationFailedError {
    blob: String,
    error: serde_json::error::Error,
}

impl DeseralizationFailedError {
    /// The offending line, lossily decoded as UTF-8.
    pub fn blob(&self) -> &str {
        &self.blob
    }
}

#[derive(Debug)]
pub enum Error {
    /// A single line grew past the parser's size bound.
    ResponseExceededBuffer,
    DeseralizationFailed(DeseralizationFailedError),
    StreamFailed(ReqwestError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResponseExceededBuffer =>
                write!(f, "a streamed line overflowed the buffer, this could indicate a malicious server"),
            Self::DeseralizationFailed(e) => write!(f, "failed to deseralize a streamed JSON document \"{}\": {}", e.blob, e.error),
            Self::StreamFailed(e) => write!(f, "the source stream failed: {}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::StreamFailed(e) => Some(e),
            Self::DeseralizationFailed(e) => Some(&e.error),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct JsonStreamParser<S>
where
    S: Stream<Item = reqwest::Result<Bytes>> + Unpin,
{
    stream: S,
    buf: Vec<u8>,
    max_size: usize,
    // Bytes of `buf` already known to contain no newline
    scanned: usize,
    eof: bool,
    failed: bool,
    data: Vec<u8>,
}

impl<S: Stream<Item = reqwest::Result<Bytes>> + Unpin> JsonStreamParser<S> {
    pub(crate) fn new(stream: S) -> JsonStreamParser<S> {
        Self::with_max_size_and_capacity(
            stream,
            1 << 24, // 16 MiB
            1 << 12, // 4 KiB
        )
    }

    pub(crate) fn with_max_size_and_capacity(
        stream: S,
        max_size: usize,
        init_capacity: usize,
    ) -> JsonStreamParser<S> {
        JsonStreamParser {
            stream,
            buf: Vec::with_capacity(init_capacity),
            max_size,
            scanned: 0,
            eof: false,
            failed: false,
            data: Vec::new(),
        }
    }

    // Returns false once the source stream is exhausted
    async fn refill_buffer(&mut self) -> Result<bool, Error> {
        match self.stream.next().await {
            Some(Ok(b)) => {
                if b.len() + self.buf.len() > self.max_size {
                    return Err(Error::ResponseExceededBuffer);
                }

                self.buf.extend_from_slice(&b);

                Ok(true)
            }
            Some(Err(err)) => Err(Error::StreamFailed(err.into())),
            None => Ok(false),
        }
    }

    // Moves the next complete line (without the trailing [\r]\n) into the
    // data buffer. Returns false when more input is needed.
    fn extract_line(&mut self) -> bool {
        let newline = self.buf[self.scanned..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|p| p + self.scanned);

        let end = match newline {
            Some(end) => end,
            None => {
                self.scanned = self.buf.len();
                return false;
            }
        };

        let content = match self.buf[..end].last() {
            Some(b'\r') => &self.buf[..end - 1],
            _ => &self.buf[..end],
        };

        self.data.clear();
        self.data.extend_from_slice(content);

        self.buf.drain(..=end);
        self.scanned = 0;

        true
    }

    fn is_blank(line: &[u8]) -> bool {
        line.iter().all(|b| b.is_ascii_whitespace())
    }

    /// Returns the next non-blank line, or `None` when the stream has ended.
    pub(crate) async fn next_line(&mut self) -> Option<Result<&[u8], Error>> {
        if self.failed {
            return None;
        }

        loop {
            if self.extract_line() {
                if Self::is_blank(&self.data) {
                    continue;
                }

                return Some(Ok(&self.data));
            }

            if self.eof {
                // A final line may lack its newline
                if Self::is_blank(&self.buf) {
                    self.buf.clear();
                    return None;
                }

                self.data.clear();
                self.data.append(&mut self.buf);
                self.scanned = 0;

                return Some(Ok(&self.data));
            }

            match self.refill_buffer().await {
                Ok(true) => continue,
                Ok(false) => self.eof = true,
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }

    /// Parses the next non-blank line as a `T`.
    pub(crate) async fn parse<T: DeserializeOwned>(&mut self) -> Option<Result<T, Error>> {
        let line = match self.next_line().await? {
            Ok(line) => line,
            Err(err) => return Some(Err(err)),
        };

        let parsed = serde_json::from_slice::<T>(line).map_err(|e| {
            Error::DeseralizationFailed(DeseralizationFailedError {
                blob: String::from_utf8_lossy(line).into_owned(),
                error: e,
            })
        });

        if parsed.is_err() {
            self.failed = true;
        }

        Some(parsed)
    }
}

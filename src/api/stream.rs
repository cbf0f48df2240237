//! Consumption of newline-delimited JSON streams.

use serde_json::Value;
use tracing::debug;

use super::apireq::{BodyStream, JsonStreamParser, ReqwestResponseStreamExt};
use super::client::ClientConfig;
use super::executor::{check_status, get_target, redacted};
use super::pool::{ConnectionPool, Lease};
use super::{Error, Params};

/// The parameter holding the item limit. It is never sent to the service.
pub(crate) const LIMIT_PARAM: &'static str = "limit";

/// Removes the item limit from `params`. An empty value means no limit.
pub(crate) fn take_limit(params: &mut Params) -> Result<Option<usize>, Error> {
    let value = match params.remove(LIMIT_PARAM) {
        Some(value) if value.is_empty() => return Ok(None),
        Some(value) => value,
        None => return Ok(None),
    };

    match value.as_i64() {
        Some(limit) if limit > 0 => Ok(Some(limit as usize)),
        _ => Err(Error::InvalidLimit(value.to_string())),
    }
}

struct OpenStream {
    parser: JsonStreamParser<BodyStream>,
    lease: Lease,
}

/// An open stream, yielding one JSON value per non-blank line.
///
/// The response is closed and the lease released as soon as the body ends,
/// the limit is reached, an error occurs, or the stream is dropped.
pub struct ItemStream {
    open: Option<OpenStream>,
    limit: Option<usize>,
    delivered: usize,
}

impl ItemStream {
    pub async fn next(&mut self) -> Option<Result<Value, Error>> {
        let open = self.open.as_mut()?;

        let parsed = open.parser.parse::<Value>().await;

        match parsed {
            Some(Ok(item)) => {
                self.delivered += 1;

                if self.limit.is_some_and(|limit| self.delivered >= limit) {
                    debug!(delivered = self.delivered, "stream limit reached");
                    self.close();
                }

                Some(Ok(item))
            }
            Some(Err(err)) => {
                self.close();
                Some(Err(err.into()))
            }
            None => {
                debug!(delivered = self.delivered, "stream ended");
                self.close();
                None
            }
        }
    }

    /// Closes the response without reading the rest of it.
    pub fn close(&mut self) {
        if let Some(OpenStream { parser, lease }) = self.open.take() {
            drop(parser);
            lease.release();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.open.is_none()
    }

    /// Items yielded so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

pub(crate) async fn open(
    config: &ClientConfig,
    pool: &ConnectionPool,
    path: &str,
    mut params: Params,
) -> Result<ItemStream, Error> {
    let limit = take_limit(&mut params)?;

    let target = get_target(config.credential(), path, &params);

    let lease = pool.acquire()?;

    debug!(target = %redacted(&target), ?limit, "streaming GET");

    let res = lease
        .http()
        .get(config.url_for(&target))
        .send()
        .await
        .map_err(|e| Error::Transport(e.into()))?;

    let res = check_status(res).await?;

    Ok(ItemStream {
        open: Some(OpenStream {
            parser: res.stream_ndjson(),
            lease,
        }),
        limit,
        delivered: 0,
    })
}

pub(crate) async fn consume<F>(
    config: &ClientConfig,
    pool: &ConnectionPool,
    path: &str,
    params: Params,
    mut on_item: F,
) -> Result<usize, Error>
where
    F: FnMut(Value),
{
    let mut stream = open(config, pool, path, params).await?;

    while let Some(item) = stream.next().await {
        on_item(item?);
    }

    Ok(stream.delivered())
}

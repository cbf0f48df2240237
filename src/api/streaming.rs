//! The real-time banner and alert streams at [`STREAM_API_BASE`].
//!
//! Each method consumes a stream like [`Client::consume_stream`], calling
//! `on_item` once per banner and resolving to the number delivered. Without a
//! limit a stream runs until the service ends it.

use serde_json::Value;

use super::query::{path_list, path_segment};
use super::stream::LIMIT_PARAM;
use super::{Client, Dispatched, Error, Params, STREAM_API_BASE};

// Limits beyond i64::MAX are as good as unbounded
fn limit_params(limit: Option<usize>) -> Params {
    let limit = limit.map(|limit| i64::try_from(limit).unwrap_or(i64::MAX));

    Params::new().with_opt(LIMIT_PARAM, limit)
}

#[derive(Debug, Clone)]
pub struct StreamingApi {
    client: Client,
}

impl StreamingApi {
    pub fn new<S: Into<String>>(api_key: S) -> Result<StreamingApi, Error> {
        Self::with_api_base(api_key, STREAM_API_BASE)
    }

    pub fn with_api_base<S: Into<String>>(api_key: S, api_base: &str) -> Result<StreamingApi, Error> {
        Ok(StreamingApi {
            client: Client::new(api_key, api_base)?,
        })
    }

    pub fn from_client(client: Client) -> StreamingApi {
        StreamingApi { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Every banner the crawlers collect.
    pub fn banners<F>(&self, limit: Option<usize>, on_item: F) -> Dispatched<usize>
    where
        F: FnMut(Value) + Send + 'static,
    {
        self.client
            .consume_stream("/shodan/banners", limit_params(limit), on_item)
    }

    /// Banners for devices in the given autonomous systems, e.g. `AS15169`.
    pub fn banners_within_asns<I, S, F>(&self, asns: I, limit: Option<usize>, on_item: F) -> Dispatched<usize>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
        F: FnMut(Value) + Send + 'static,
    {
        let path = format!("/shodan/asn/{}", path_list(asns));

        self.client.consume_stream(&path, limit_params(limit), on_item)
    }

    /// Banners for devices in the given countries, as ISO 3166 codes.
    pub fn banners_within_countries<I, S, F>(
        &self,
        countries: I,
        limit: Option<usize>,
        on_item: F,
    ) -> Dispatched<usize>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
        F: FnMut(Value) + Send + 'static,
    {
        let path = format!("/shodan/countries/{}", path_list(countries));

        self.client.consume_stream(&path, limit_params(limit), on_item)
    }

    pub fn banners_on_ports<I, F>(&self, ports: I, limit: Option<usize>, on_item: F) -> Dispatched<usize>
    where
        I: IntoIterator<Item = u16>,
        F: FnMut(Value) + Send + 'static,
    {
        let path = format!("/shodan/ports/{}", path_list(ports));

        self.client.consume_stream(&path, limit_params(limit), on_item)
    }

    /// Banners matching any of the key's network alerts.
    pub fn alerts<F>(&self, limit: Option<usize>, on_item: F) -> Dispatched<usize>
    where
        F: FnMut(Value) + Send + 'static,
    {
        self.client
            .consume_stream("/shodan/alert", limit_params(limit), on_item)
    }

    /// Banners matching a single network alert.
    pub fn alert<F>(&self, id: &str, limit: Option<usize>, on_item: F) -> Dispatched<usize>
    where
        F: FnMut(Value) + Send + 'static,
    {
        let path = format!("/shodan/alert/{}", path_segment(id));

        self.client.consume_stream(&path, limit_params(limit), on_item)
    }
}

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use serde_json::Value;

use super::dispatch::{self, Dispatched};
use super::pool::{ConnectionPool, PoolSettings, PoolStats};
use super::stream::{self, ItemStream};
use super::{executor, Error, Params};

pub const REST_API_BASE: &'static str = "https://api.shodan.io";
pub const STREAM_API_BASE: &'static str = "https://stream.shodan.io";
pub const EXPLOITS_API_BASE: &'static str = "https://exploits.shodan.io/api";

/// An API key. It is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new<S: Into<String>>(key: S) -> Result<Credential, Error> {
        let key = key.into();

        if key.trim().is_empty() {
            return Err(Error::MissingApiKey);
        }

        Ok(Credential(key))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// The immutable part of a client, shared by every request it issues.
#[derive(Debug)]
pub(crate) struct ClientConfig {
    api_base: String,
    credential: Credential,
}

impl ClientConfig {
    pub(crate) fn new(api_base: &str, credential: Credential) -> Result<ClientConfig, Error> {
        let parsed = Url::parse(api_base).map_err(Error::InvalidApiBase)?;

        Ok(ClientConfig {
            api_base: parsed.as_str().trim_end_matches('/').to_string(),
            credential,
        })
    }

    pub(crate) fn credential(&self) -> &Credential {
        &self.credential
    }

    pub(crate) fn api_base(&self) -> &str {
        &self.api_base
    }

    /// The absolute URL for a request target (path and query).
    pub(crate) fn url_for(&self, target: &str) -> String {
        format!("{}{}", self.api_base, target)
    }
}

pub struct ClientBuilder {
    api_key: String,
    api_base: String,
    settings: PoolSettings,
}

impl ClientBuilder {
    pub fn api_base<S: Into<String>>(mut self, api_base: S) -> ClientBuilder {
        self.api_base = api_base.into();
        self
    }

    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> ClientBuilder {
        self.settings.user_agent = user_agent.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> ClientBuilder {
        self.settings.connect_timeout = timeout;
        self
    }

    /// Bounds GET and POST exchanges. Streams are unaffected.
    pub fn timeout(mut self, timeout: Option<Duration>) -> ClientBuilder {
        self.settings.timeout = timeout;
        self
    }

    /// Ignore proxies configured through the environment.
    pub fn no_proxy(mut self) -> ClientBuilder {
        self.settings.system_proxy = false;
        self
    }

    pub fn build(self) -> Result<Client, Error> {
        let credential = Credential::new(self.api_key)?;

        Ok(Client {
            config: Arc::new(ClientConfig::new(&self.api_base, credential)?),
            pool: ConnectionPool::new(self.settings),
        })
    }
}

/// A handle to one of the service's APIs. Cloning is cheap; clones share the
/// credential and the pool accounting.
#[derive(Debug, Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    pool: ConnectionPool,
}

impl Client {
    pub fn new<S: Into<String>>(api_key: S, api_base: &str) -> Result<Client, Error> {
        Self::builder(api_key).api_base(api_base).build()
    }

    pub fn builder<S: Into<String>>(api_key: S) -> ClientBuilder {
        ClientBuilder {
            api_key: api_key.into(),
            api_base: REST_API_BASE.to_string(),
            settings: PoolSettings::default(),
        }
    }

    pub fn api_base(&self) -> &str {
        self.config.api_base()
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    fn dispatch<T, F, Fut>(&self, op: F) -> Dispatched<T>
    where
        T: Send + 'static,
        F: FnOnce(Client) -> Fut,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        dispatch::dispatch(op(self.clone()))
    }

    /// Issues a GET request and decodes its JSON response.
    ///
    /// Blocks when called outside of a tokio runtime; otherwise the request is
    /// spawned as a child task, see [`Dispatched`].
    pub fn get(&self, path: &str, params: Params) -> Dispatched<Value> {
        let path = path.to_string();

        self.dispatch(|client| async move { client.async_get(&path, &params).await })
    }

    /// Issues a POST request with `params` in the query string and `body`, if
    /// any, form-encoded in the request body.
    pub fn post(&self, path: &str, body: Option<Params>, params: Params) -> Dispatched<Value> {
        let path = path.to_string();

        self.dispatch(|client| async move { client.async_post(&path, body.as_ref(), params).await })
    }

    /// Consumes a newline-delimited JSON stream, calling `on_item` once per
    /// item in arrival order. A `limit` parameter bounds the number of items;
    /// it is not sent to the service. Resolves to the number of items
    /// delivered.
    pub fn consume_stream<F>(&self, path: &str, params: Params, on_item: F) -> Dispatched<usize>
    where
        F: FnMut(Value) + Send + 'static,
    {
        let path = path.to_string();

        self.dispatch(|client| async move { client.async_consume_stream(&path, params, on_item).await })
    }

    pub async fn async_get(&self, path: &str, params: &Params) -> Result<Value, Error> {
        executor::get(&self.config, &self.pool, path, params).await
    }

    pub async fn async_post(
        &self,
        path: &str,
        body: Option<&Params>,
        params: Params,
    ) -> Result<Value, Error> {
        executor::post(&self.config, &self.pool, path, body, params).await
    }

    pub async fn async_consume_stream<F>(
        &self,
        path: &str,
        params: Params,
        on_item: F,
    ) -> Result<usize, Error>
    where
        F: FnMut(Value),
    {
        stream::consume(&self.config, &self.pool, path, params, on_item).await
    }

    /// Opens a stream for pull-based consumption.
    pub async fn open_stream(&self, path: &str, params: Params) -> Result<ItemStream, Error> {
        stream::open(&self.config, &self.pool, path, params).await
    }
}

//! The exploit database at [`EXPLOITS_API_BASE`].

use serde_json::Value;

use super::rest::search_params;
use super::{Client, Dispatched, Error, Facets, Params, Query, EXPLOITS_API_BASE};

#[derive(Debug, Clone)]
pub struct ExploitsApi {
    client: Client,
}

impl ExploitsApi {
    pub fn new<S: Into<String>>(api_key: S) -> Result<ExploitsApi, Error> {
        Self::with_api_base(api_key, EXPLOITS_API_BASE)
    }

    pub fn with_api_base<S: Into<String>>(api_key: S, api_base: &str) -> Result<ExploitsApi, Error> {
        Ok(ExploitsApi {
            client: Client::new(api_key, api_base)?,
        })
    }

    pub fn from_client(client: Client) -> ExploitsApi {
        ExploitsApi { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Searches exploits. `page` may be passed in `params`.
    pub fn search(&self, query: &Query, facets: &Facets, params: Params) -> Dispatched<Value> {
        self.client.get("/search", search_params(query, facets, params))
    }

    /// Like [`ExploitsApi::search`] but returns only the totals and facets.
    pub fn count(&self, query: &Query, facets: &Facets) -> Dispatched<Value> {
        self.client
            .get("/count", search_params(query, facets, Params::new()))
    }
}

//! The REST API at [`REST_API_BASE`].
//!
//! Every method dispatches like [`Client::get`]: it blocks outside of a tokio
//! runtime and spawns a child task inside one.

use serde_json::Value;

use super::query::{comma_list, path_segment};
use super::{Client, Dispatched, Error, Facets, Params, Query, REST_API_BASE};

/// Merges a query and its facets in front of caller supplied parameters. An
/// empty query or facet list is not transmitted.
pub(crate) fn search_params(query: &Query, facets: &Facets, params: Params) -> Params {
    let mut merged = Params::new()
        .with("query", query.to_string())
        .with("facets", facets.to_string());

    merged.extend(params.iter().map(|(k, v)| (k, v.clone())));
    merged
}

#[derive(Debug, Clone)]
pub struct RestApi {
    client: Client,
}

impl RestApi {
    pub fn new<S: Into<String>>(api_key: S) -> Result<RestApi, Error> {
        Self::with_api_base(api_key, REST_API_BASE)
    }

    pub fn with_api_base<S: Into<String>>(api_key: S, api_base: &str) -> Result<RestApi, Error> {
        Ok(RestApi {
            client: Client::new(api_key, api_base)?,
        })
    }

    pub fn from_client(client: Client) -> RestApi {
        RestApi { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Plan and credit information for the key.
    pub fn info(&self) -> Dispatched<Value> {
        self.client.get("/api-info", Params::new())
    }

    /// Everything known about a host. `history` and `minify` may be passed in
    /// `params`.
    pub fn host(&self, ip: &str, params: Params) -> Dispatched<Value> {
        self.client.get(&format!("/shodan/host/{}", path_segment(ip)), params)
    }

    /// Number of results for a search, without consuming query credits.
    pub fn host_count(&self, query: &Query, facets: &Facets) -> Dispatched<Value> {
        self.client
            .get("/shodan/host/count", search_params(query, facets, Params::new()))
    }

    /// One page of search results. `page` and `minify` may be passed in
    /// `params`.
    pub fn host_search(&self, query: &Query, facets: &Facets, params: Params) -> Dispatched<Value> {
        self.client
            .get("/shodan/host/search", search_params(query, facets, params))
    }

    /// How the service breaks a query into filters and free text.
    pub fn search_tokens(&self, query: &Query) -> Dispatched<Value> {
        self.client.get(
            "/shodan/host/search/tokens",
            Params::new().with("query", query.to_string()),
        )
    }

    pub fn ports(&self) -> Dispatched<Value> {
        self.client.get("/shodan/ports", Params::new())
    }

    pub fn protocols(&self) -> Dispatched<Value> {
        self.client.get("/shodan/protocols", Params::new())
    }

    /// Requests an on-demand scan of the given addresses or networks.
    pub fn scan<I, S>(&self, ips: I) -> Dispatched<Value>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let body = Params::new().with("ips", comma_list(ips));

        self.client.post("/shodan/scan", Some(body), Params::new())
    }

    /// Requests an Internet-wide crawl of a port.
    pub fn crawl_for(&self, port: u16, protocol: Option<&str>) -> Dispatched<Value> {
        let body = Params::new()
            .with("port", port)
            .with_opt("protocol", protocol);

        self.client
            .post("/shodan/scan/internet", Some(body), Params::new())
    }

    pub fn scan_status(&self, id: &str) -> Dispatched<Value> {
        self.client
            .get(&format!("/shodan/scan/{}", path_segment(id)), Params::new())
    }

    /// Saved search queries shared by the community. `page`, `sort` and
    /// `order` may be passed in `params`.
    pub fn community_queries(&self, params: Params) -> Dispatched<Value> {
        self.client.get("/shodan/query", params)
    }

    pub fn search_for_community_query(&self, query: &str, params: Params) -> Dispatched<Value> {
        let mut merged = Params::new().with("query", query);
        merged.extend(params.iter().map(|(k, v)| (k, v.clone())));

        self.client.get("/shodan/query/search", merged)
    }

    pub fn popular_query_tags(&self, size: Option<u32>) -> Dispatched<Value> {
        self.client
            .get("/shodan/query/tags", Params::new().with_opt("size", size))
    }

    pub fn profile(&self) -> Dispatched<Value> {
        self.client.get("/account/profile", Params::new())
    }

    /// Looks up the addresses of the given hostnames.
    pub fn resolve<I, S>(&self, hostnames: I) -> Dispatched<Value>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.client.get(
            "/dns/resolve",
            Params::new().with("hostnames", comma_list(hostnames)),
        )
    }

    /// Looks up the hostnames of the given addresses.
    pub fn reverse_lookup<I, S>(&self, ips: I) -> Dispatched<Value>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.client
            .get("/dns/reverse", Params::new().with("ips", comma_list(ips)))
    }

    /// The headers the caller's client sent, as seen by the service.
    pub fn http_headers(&self) -> Dispatched<Value> {
        self.client.get("/tools/httpheaders", Params::new())
    }

    pub fn my_ip(&self) -> Dispatched<Value> {
        self.client.get("/tools/myip", Params::new())
    }

    /// Likelihood, between 0 and 1, that the address is a honeypot.
    pub fn honeypot_score(&self, ip: &str) -> Dispatched<Value> {
        self.client
            .get(&format!("/labs/honeyscore/{}", path_segment(ip)), Params::new())
    }
}

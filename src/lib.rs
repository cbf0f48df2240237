//! A client for the Shodan network intelligence service.
//!
//! ```no_run
//! use shodanx::api::{Facets, Query, RestApi};
//!
//! let api = RestApi::new("API_KEY").unwrap();
//!
//! // Outside of a runtime the call blocks until the response arrives
//! let results = api
//!     .host_search(&Query::new("nginx").filter("country", "DE"), &Facets::new(), Default::default())
//!     .try_complete()
//!     .unwrap();
//! ```
//!
//! Inside a tokio runtime the same call returns immediately and the result is
//! awaited instead. See [`api`] for details.

pub mod api;

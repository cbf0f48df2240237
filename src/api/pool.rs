//! Per-request transport leases.
//!
//! Despite the name, a [`ConnectionPool`] never reuses a connection. Every
//! [`Lease`] builds its own `reqwest::Client` with idle pooling disabled, and
//! the connection is closed when the request ends. A connection belongs to the
//! runtime that opened it, and blocking calls run on a runtime that is torn
//! down afterwards, so a shared connection could outlive its runtime. What the
//! pool does share across clones is its [`PoolSettings`] and the lease
//! accounting in [`PoolStats`].
//!
//! A lease is released exactly once: either explicitly through
//! [`Lease::release`], or when it is dropped on any other exit path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use super::Error;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport settings shared by every lease of a pool.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub user_agent: String,
    pub connect_timeout: Option<Duration>,
    /// Total time allowed for a GET or POST exchange. Streams are never
    /// subject to it.
    pub timeout: Option<Duration>,
    /// Honor `HTTP_PROXY`-style environment variables.
    pub system_proxy: bool,
}

impl Default for PoolSettings {
    fn default() -> PoolSettings {
        PoolSettings {
            user_agent: concat!("shodanx/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            timeout: None,
            system_proxy: true,
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

/// A snapshot of a pool's lease accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub acquired: usize,
    pub released: usize,
}

impl PoolStats {
    /// Leases which have been acquired but not yet released.
    pub fn in_use(&self) -> usize {
        self.acquired.saturating_sub(self.released)
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionPool {
    settings: Arc<PoolSettings>,
    counters: Arc<Counters>,
}

impl ConnectionPool {
    pub fn new(settings: PoolSettings) -> ConnectionPool {
        ConnectionPool {
            settings: Arc::new(settings),
            counters: Arc::default(),
        }
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Acquires a fresh transport for a single request. Nothing is reused
    /// from earlier leases.
    pub fn acquire(&self) -> Result<Lease, Error> {
        let settings = &self.settings;

        let mut builder = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .pool_max_idle_per_host(0);

        if let Some(timeout) = settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        if !settings.system_proxy {
            builder = builder.no_proxy();
        }

        let client = builder.build().map_err(|e| Error::Transport(e.into()))?;

        let acquired = self.counters.acquired.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(acquired, "connection lease acquired");

        Ok(Lease {
            client,
            counters: Arc::clone(&self.counters),
            released: false,
        })
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            acquired: self.counters.acquired.load(Ordering::SeqCst),
            released: self.counters.released.load(Ordering::SeqCst),
        }
    }
}

impl Default for ConnectionPool {
    fn default() -> ConnectionPool {
        ConnectionPool::new(PoolSettings::default())
    }
}

/// One request's claim on the pool.
#[derive(Debug)]
pub struct Lease {
    client: reqwest::Client,
    counters: Arc<Counters>,
    released: bool,
}

impl Lease {
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if self.released {
            return;
        }

        self.released = true;

        let released = self.counters.released.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(released, "connection lease released");
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.release_once();
    }
}

//! Broker endpoints and the providers that enumerate them.
//!
//! A [`HostProvider`] hands out a [`HostCursor`], an infinite iterator that
//! cycles through the provider's endpoints. Asking the provider again starts
//! a fresh cursor at the first endpoint.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use url::{Host, Url};

use crate::error::{Result, StompError};
use crate::protocol::DEFAULT_PORT;

/// A broker endpoint, `scheme://host[:port]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BrokerUri {
    scheme: String,
    host: String,
    port: u16,
}

impl BrokerUri {
    /// Parse a URI, using [`DEFAULT_PORT`] when it names no port.
    pub fn parse(uri: &str) -> Result<Self> {
        Self::parse_with_default_port(uri, DEFAULT_PORT)
    }

    /// Parse a URI, using `default_port` when it names no port.
    pub fn parse_with_default_port(uri: &str, default_port: u16) -> Result<Self> {
        let url = Url::parse(uri.trim()).map_err(|e| StompError::InvalidUri(format!("{uri}: {e}")))?;

        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => return Err(StompError::InvalidUri(format!("{uri}: missing host"))),
        };

        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            port: url.port().unwrap_or(default_port),
        })
    }

    /// Build an endpoint from its parts.
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }

    #[inline]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host name or address, without IPv6 brackets.
    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Use `port` in place of the parsed one.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl FromStr for BrokerUri {
    type Err = StompError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for BrokerUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{}://[{}]:{}", self.scheme, self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
        }
    }
}

/// Source of broker endpoints for `connect` and reconnection.
pub trait HostProvider: Send + Sync {
    /// A fresh cursor starting at the first endpoint.
    fn hosts(&self) -> HostCursor;
}

/// Infinite, cycling iterator over a fixed endpoint list.
///
/// Yields nothing when the list is empty.
#[derive(Debug, Clone)]
pub struct HostCursor {
    hosts: Arc<[BrokerUri]>,
    next: usize,
}

impl HostCursor {
    fn new(hosts: Arc<[BrokerUri]>) -> Self {
        Self { hosts, next: 0 }
    }
}

impl Iterator for HostCursor {
    type Item = BrokerUri;

    fn next(&mut self) -> Option<BrokerUri> {
        if self.hosts.is_empty() {
            return None;
        }
        let host = self.hosts[self.next].clone();
        self.next = (self.next + 1) % self.hosts.len();
        Some(host)
    }
}

/// A single broker.
#[derive(Debug, Clone)]
pub struct SingleHost {
    hosts: Arc<[BrokerUri]>,
}

impl SingleHost {
    pub fn new(uri: BrokerUri) -> Self {
        Self {
            hosts: Arc::from(vec![uri]),
        }
    }

    /// Parse `uri` and wrap it.
    pub fn parse(uri: &str) -> Result<Self> {
        Ok(Self::new(BrokerUri::parse(uri)?))
    }

    pub fn uri(&self) -> &BrokerUri {
        &self.hosts[0]
    }
}

impl HostProvider for SingleHost {
    fn hosts(&self) -> HostCursor {
        HostCursor::new(Arc::clone(&self.hosts))
    }
}

/// A failover list of brokers, tried in a fixed order.
#[derive(Debug, Clone)]
pub struct Failover {
    hosts: Arc<[BrokerUri]>,
}

impl Failover {
    /// Endpoints are tried in the given order.
    pub fn ordered(hosts: Vec<BrokerUri>) -> Self {
        Self {
            hosts: Arc::from(hosts),
        }
    }

    /// Endpoints are shuffled once, here, and then tried in that order.
    pub fn randomized(hosts: Vec<BrokerUri>) -> Self {
        Self::randomized_with(hosts, &mut rand::rng())
    }

    /// Like [`Failover::randomized`], shuffling with the given generator.
    pub fn randomized_with<R: Rng + ?Sized>(mut hosts: Vec<BrokerUri>, rng: &mut R) -> Self {
        hosts.shuffle(rng);
        Self::ordered(hosts)
    }

    /// Endpoints in the order they are tried.
    pub fn uris(&self) -> &[BrokerUri] {
        &self.hosts
    }
}

impl HostProvider for Failover {
    fn hosts(&self) -> HostCursor {
        HostCursor::new(Arc::clone(&self.hosts))
    }
}

impl<P: HostProvider + ?Sized> HostProvider for Box<P> {
    fn hosts(&self) -> HostCursor {
        (**self).hosts()
    }
}

impl<P: HostProvider + ?Sized> HostProvider for Arc<P> {
    fn hosts(&self) -> HostCursor {
        (**self).hosts()
    }
}

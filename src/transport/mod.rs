//! Transport module - broker endpoints and failover.
//!
//! Provides:
//! - [`BrokerUri`] parsing with the STOMP default port
//! - [`HostProvider`] implementations: [`SingleHost`], [`Failover`]
//! - [`provider_from_uri`] for `failover://(...)` connection strings

mod host;
mod uri;

pub use host::{BrokerUri, Failover, HostCursor, HostProvider, SingleHost};
pub use uri::{provider_from_uri, provider_from_uri_with_port};

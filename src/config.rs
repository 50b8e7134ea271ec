//! Connection settings.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use stomp_wire_client::ConnectionConfig;
//!
//! let config = ConnectionConfig::default()
//!     .with_sync(true)
//!     .with_client_id("orders-consumer")
//!     .with_read_timeout(Duration::from_secs(5));
//! assert_eq!(config.prefetch_size, 1);
//!
//! let config = ConnectionConfig::from_json(r#"{"sync": true, "read_timeout_ms": 1500}"#).unwrap();
//! assert_eq!(config.read_timeout, Duration::from_millis(1500));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::protocol::DEFAULT_PORT;

/// Default readiness wait before `read_frame` gives up.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Default size of a single socket read.
pub const DEFAULT_TCP_BUFFER_SIZE: usize = 1024;

/// Default number of broker candidates tried by `connect`.
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 10;

/// Default bound on a single TCP connect attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(250);

/// Default `activemq.prefetchSize` for new subscriptions.
pub const DEFAULT_PREFETCH_SIZE: u32 = 1;

/// Configuration for a [`Connection`](crate::Connection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Request a receipt for every operation that supports one.
    pub sync: bool,
    /// `activemq.prefetchSize` sent with SUBSCRIBE.
    pub prefetch_size: u32,
    /// Durable client id, sent as `client-id` and `activemq.subscriptionName`.
    pub client_id: Option<String>,
    /// How long `read_frame` waits for data.
    #[serde(rename = "read_timeout_ms", with = "duration_ms")]
    pub read_timeout: Duration,
    /// Bytes requested per socket read.
    pub tcp_buffer_size: usize,
    /// Broker candidates tried per connect.
    pub connect_attempts: u32,
    /// Bound on each TCP connect attempt.
    #[serde(rename = "connect_timeout_ms", with = "duration_ms")]
    pub connect_timeout: Duration,
    /// Port used when a broker URI names none.
    pub default_port: u16,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            sync: false,
            prefetch_size: DEFAULT_PREFETCH_SIZE,
            client_id: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
            tcp_buffer_size: DEFAULT_TCP_BUFFER_SIZE,
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            default_port: DEFAULT_PORT,
        }
    }
}

impl ConnectionConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    pub fn with_prefetch_size(mut self, prefetch_size: u32) -> Self {
        self.prefetch_size = prefetch_size;
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the bytes requested per socket read. Zero is raised to one.
    pub fn with_tcp_buffer_size(mut self, size: usize) -> Self {
        self.tcp_buffer_size = size.max(1);
        self
    }

    pub fn with_connect_attempts(mut self, attempts: u32) -> Self {
        self.connect_attempts = attempts;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_default_port(mut self, port: u16) -> Self {
        self.default_port = port;
        self
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

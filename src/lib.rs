//! # stomp-wire-client
//!
//! Async client for the STOMP text messaging protocol over TCP.
//!
//! This crate lets a Rust program talk to a message broker such as
//! ActiveMQ: send and subscribe, acknowledge, and group work in
//! transactions.
//!
//! ## Architecture
//!
//! - **Decoder** ([`protocol`]): rebuilds frames out of an arbitrarily
//!   chunked byte stream, framed by `content-length` or a `\0` terminator
//! - **Connection** ([`Connection`]): handshake, receipts, reconnection
//!   with subscription replay
//! - **Hosts** ([`transport`]): single broker or failover lists
//! - **Map messages** ([`codec`], [`MapMessage`]): `jms-map-json` and
//!   `jms-map-xml` bodies
//!
//! ## Example
//!
//! ```no_run
//! use stomp_wire_client::{Connection, ConnectionConfig, Headers};
//!
//! #[tokio::main]
//! async fn main() -> stomp_wire_client::Result<()> {
//!     let config = ConnectionConfig::default().with_sync(true);
//!     let mut conn = Connection::from_uri("failover://(tcp://a:61613,tcp://b:61613)", config)?;
//!     conn.connect("admin", "secret", "1.0,1.1,1.2").await?;
//!
//!     conn.begin(Some("tx1"), None).await?;
//!     conn.send("/queue/orders", "order #1", &Headers::new(), None).await?;
//!     conn.commit(Some("tx1"), None).await?;
//!
//!     conn.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod protocol;
pub mod transport;

mod connection;
mod message;

pub use config::ConnectionConfig;
pub use connection::{AckTarget, Connection, ConnectionState, Outgoing, DEFAULT_ACCEPT_VERSIONS};
pub use error::{Result, StompError};
pub use message::{MapMessage, Message};
pub use protocol::{Command, Frame, FrameBuffer, Headers};
pub use transport::{provider_from_uri, BrokerUri, Failover, HostProvider, SingleHost};

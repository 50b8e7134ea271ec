//! Broker connection: handshake, send/receive, transactions and acks.
//!
//! The [`Connection`] owns the socket, the read buffer and the session state.
//! A read or write that fails on the transport triggers one transparent
//! reconnect (handshake with the stored credentials, then every tracked
//! subscription is sent again) followed by one retry. A second failure
//! surfaces to the caller.
//!
//! # Example
//!
//! ```no_run
//! use stomp_wire_client::{Connection, Headers, SingleHost};
//!
//! # async fn run() -> stomp_wire_client::Result<()> {
//! let mut conn = Connection::new(SingleHost::parse("tcp://localhost:61613")?);
//! conn.connect("admin", "secret", "1.0,1.1,1.2").await?;
//!
//! conn.subscribe("/queue/orders", &Headers::new(), None).await?;
//! conn.send("/queue/orders", "hello", &Headers::new(), Some(true)).await?;
//!
//! if let Some(message) = conn.read_frame().await? {
//!     conn.ack(&message, None).await?;
//! }
//! conn.disconnect().await;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use uuid::Uuid;

use crate::config::ConnectionConfig;
use crate::error::{Result, StompError};
use crate::message::{MapMessage, Message};
use crate::protocol::{Command, Frame, FrameBuffer, Headers, MIN_FRAME_LEN};
use crate::transport::{provider_from_uri_with_port, BrokerUri, HostProvider};

/// Versions offered when `connect` is called with an empty version list
/// and none was stored before.
pub const DEFAULT_ACCEPT_VERSIONS: &str = "1.0,1.1,1.2";

/// Lifecycle of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket.
    Disconnected,
    /// Socket open, waiting for CONNECTED.
    Connecting,
    /// Handshake complete.
    Connected,
}

/// What an ACK or NACK refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckTarget {
    /// Headers of a received MESSAGE frame.
    FromFrame(Headers),
    /// A bare message id.
    FromId(String),
}

impl From<&Frame> for AckTarget {
    fn from(frame: &Frame) -> Self {
        AckTarget::FromFrame(frame.headers().clone())
    }
}

impl From<&Message> for AckTarget {
    fn from(message: &Message) -> Self {
        AckTarget::FromFrame(message.headers().clone())
    }
}

impl From<&str> for AckTarget {
    fn from(id: &str) -> Self {
        AckTarget::FromId(id.to_string())
    }
}

impl From<String> for AckTarget {
    fn from(id: String) -> Self {
        AckTarget::FromId(id)
    }
}

/// Payload handed to [`Connection::send`].
#[derive(Debug, Clone)]
pub enum Outgoing {
    /// A body for a new SEND frame.
    Body(Bytes),
    /// A prepared frame; destination and properties are layered on top.
    Frame(Frame),
}

impl From<&str> for Outgoing {
    fn from(body: &str) -> Self {
        Outgoing::Body(Bytes::copy_from_slice(body.as_bytes()))
    }
}

impl From<String> for Outgoing {
    fn from(body: String) -> Self {
        Outgoing::Body(Bytes::from(body))
    }
}

impl From<&[u8]> for Outgoing {
    fn from(body: &[u8]) -> Self {
        Outgoing::Body(Bytes::copy_from_slice(body))
    }
}

impl From<Vec<u8>> for Outgoing {
    fn from(body: Vec<u8>) -> Self {
        Outgoing::Body(Bytes::from(body))
    }
}

impl From<Bytes> for Outgoing {
    fn from(body: Bytes) -> Self {
        Outgoing::Body(body)
    }
}

impl From<Frame> for Outgoing {
    fn from(frame: Frame) -> Self {
        Outgoing::Frame(frame)
    }
}

impl From<MapMessage> for Outgoing {
    fn from(message: MapMessage) -> Self {
        Outgoing::Frame(message.into_frame())
    }
}

impl Outgoing {
    fn into_frame(self) -> Frame {
        match self {
            Outgoing::Body(body) => Frame::new(Command::Send).with_body(body),
            Outgoing::Frame(frame) => frame,
        }
    }
}

#[derive(Debug, Clone)]
struct Credentials {
    username: String,
    password: String,
    versions: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            versions: DEFAULT_ACCEPT_VERSIONS.to_string(),
        }
    }
}

/// A STOMP connection to one broker out of a [`HostProvider`].
pub struct Connection {
    provider: Box<dyn HostProvider>,
    config: ConnectionConfig,
    stream: Option<TcpStream>,
    state: ConnectionState,
    host: Option<BrokerUri>,
    session_id: Option<String>,
    version: f64,
    credentials: Credentials,
    /// destination -> caller properties, replayed after reconnect
    subscriptions: BTreeMap<String, Headers>,
    buffer: FrameBuffer,
}

impl Connection {
    /// Create a disconnected connection with default settings.
    pub fn new(provider: impl HostProvider + 'static) -> Self {
        Self::with_config(provider, ConnectionConfig::default())
    }

    /// Create a disconnected connection.
    pub fn with_config(provider: impl HostProvider + 'static, config: ConnectionConfig) -> Self {
        Self {
            provider: Box::new(provider),
            config,
            stream: None,
            state: ConnectionState::Disconnected,
            host: None,
            session_id: None,
            version: 1.0,
            credentials: Credentials::default(),
            subscriptions: BTreeMap::new(),
            buffer: FrameBuffer::new(),
        }
    }

    /// Create a disconnected connection from a broker or failover URI.
    pub fn from_uri(uri: &str, config: ConnectionConfig) -> Result<Self> {
        let provider = provider_from_uri_with_port(uri, config.default_port)?;
        Ok(Self::with_config(provider, config))
    }

    // ========================================================================
    // State
    // ========================================================================

    #[inline]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True once CONNECTED was received and the socket is still held.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected && self.stream.is_some()
    }

    /// Session id assigned by the broker.
    #[inline]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Negotiated protocol version, 1.0 unless the broker said otherwise.
    #[inline]
    pub fn version(&self) -> f64 {
        self.version
    }

    /// Broker currently connected to.
    #[inline]
    pub fn host(&self) -> Option<&BrokerUri> {
        self.host.as_ref()
    }

    #[inline]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Destinations subscribed to, in replay order.
    pub fn subscriptions(&self) -> impl Iterator<Item = &str> {
        self.subscriptions.keys().map(String::as_str)
    }

    /// Set how long `read_frame` waits for data.
    pub fn set_read_timeout(&mut self, seconds: u64, milliseconds: u64) {
        self.config.read_timeout = Duration::from_secs(seconds) + Duration::from_millis(milliseconds);
    }

    /// Set the bytes requested per socket read. Zero is raised to one.
    pub fn set_buffer_size(&mut self, size: usize) {
        self.config.tcp_buffer_size = size.max(1);
    }

    // ========================================================================
    // Handshake
    // ========================================================================

    /// Open a socket to the first reachable broker and perform the handshake.
    ///
    /// Empty `username`, `password` or `versions` keep the values given to an
    /// earlier call. A `versions` of exactly `"1.0"` sends a 1.0 CONNECT
    /// without `accept-version` and `host`.
    ///
    /// # Errors
    ///
    /// - [`StompError::Connect`] if no broker accepted a socket within the
    ///   attempt budget
    /// - [`StompError::Protocol`] if the broker answered with anything other
    ///   than CONNECTED, or not at all
    pub async fn connect(&mut self, username: &str, password: &str, versions: &str) -> Result<()> {
        self.close_socket();

        if !username.is_empty() {
            self.credentials.username = username.to_string();
        }
        if !password.is_empty() {
            self.credentials.password = password.to_string();
        }
        if !versions.is_empty() {
            self.credentials.versions = versions.to_string();
        }

        self.handshake().await
    }

    async fn open_socket(&mut self) -> Result<()> {
        let attempts = self.config.connect_attempts;
        let mut last_error = String::from("no broker candidates");

        for (attempt, host) in self.provider.hosts().take(attempts as usize).enumerate() {
            let connecting = TcpStream::connect((host.host(), host.port()));
            match timeout(self.config.connect_timeout, connecting).await {
                Ok(Ok(stream)) => {
                    stream.set_nodelay(true)?;
                    tracing::debug!("Socket open to {} (attempt {})", host, attempt + 1);
                    self.stream = Some(stream);
                    self.host = Some(host);
                    return Ok(());
                }
                Ok(Err(e)) => {
                    tracing::warn!("Connect attempt {}/{} to {} failed: {}", attempt + 1, attempts, host, e);
                    last_error = format!("{host}: {e}");
                }
                Err(_) => {
                    tracing::warn!("Connect attempt {}/{} to {} timed out", attempt + 1, attempts, host);
                    last_error = format!("{host}: timed out");
                }
            }
        }

        Err(StompError::Connect(format!(
            "no broker reachable after {attempts} attempts (last: {last_error})"
        )))
    }

    /// Open a socket, send CONNECT and wait for CONNECTED. Never reconnects.
    async fn handshake(&mut self) -> Result<()> {
        self.state = ConnectionState::Connecting;

        let result = self.try_handshake().await;
        if result.is_err() {
            self.close_socket();
        }
        result
    }

    async fn try_handshake(&mut self) -> Result<()> {
        self.open_socket().await?;

        let frame = self.connect_frame();
        self.write_bytes(&frame.encode()).await?;

        let Some(reply) = self.read_frame_once().await? else {
            return Err(StompError::protocol("Connection not acknowledged"));
        };
        if reply.command() != Command::Connected {
            return Err(StompError::protocol_with_body(
                format!("Unexpected command: {}", reply.command()),
                reply.body(),
            ));
        }

        self.session_id = reply.header("session").map(str::to_string);
        self.version = match reply.header("version") {
            Some(v) => v.trim().parse::<f64>().unwrap_or_else(|_| {
                tracing::warn!("Unparseable protocol version {:?}, assuming 1.0", v);
                1.0
            }),
            None => 1.0,
        };
        self.state = ConnectionState::Connected;

        tracing::info!(
            "Connected to {} (session {}, version {})",
            self.host.as_ref().map(ToString::to_string).unwrap_or_default(),
            self.session_id.as_deref().unwrap_or("-"),
            self.version
        );
        Ok(())
    }

    fn connect_frame(&self) -> Frame {
        let mut frame = Frame::new(Command::Connect)
            .with_header("login", self.credentials.username.as_str())
            .with_header("passcode", self.credentials.password.as_str());

        if let Some(client_id) = &self.config.client_id {
            frame = frame.with_header("client-id", client_id.as_str());
        }
        if self.credentials.versions != "1.0" {
            frame = frame.with_header("accept-version", self.credentials.versions.as_str());
            if let Some(host) = &self.host {
                frame = frame.with_header("host", host.host());
            }
        }
        frame
    }

    /// Drop the current socket, handshake again and replay subscriptions.
    async fn reconnect(&mut self) -> Result<()> {
        tracing::info!(
            "Reconnecting ({} subscriptions to restore)",
            self.subscriptions.len()
        );
        self.close_socket();
        self.handshake().await?;

        let replay: Vec<Frame> = self
            .subscriptions
            .iter()
            .map(|(destination, properties)| self.subscribe_frame(destination, properties))
            .collect();
        for frame in replay {
            self.write_bytes(&frame.encode()).await?;
        }
        Ok(())
    }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Send a message to a destination.
    ///
    /// `message` is a body or a prepared frame such as a [`MapMessage`].
    /// `properties` are added as headers; `destination` always wins.
    /// `sync` overrides [`ConnectionConfig::sync`] for this call.
    pub async fn send(
        &mut self,
        destination: &str,
        message: impl Into<Outgoing>,
        properties: &Headers,
        sync: Option<bool>,
    ) -> Result<()> {
        let frame = message
            .into()
            .into_frame()
            .with_headers(properties)
            .with_header("destination", destination);
        self.transmit(frame, sync).await
    }

    /// Subscribe to a destination and remember it for reconnects.
    ///
    /// Defaults: `ack: client-individual`, `id: <destination>`,
    /// `activemq.prefetchSize` from the configuration, and
    /// `activemq.subscriptionName` when a client id is configured.
    /// `properties` override the defaults.
    pub async fn subscribe(
        &mut self,
        destination: &str,
        properties: &Headers,
        sync: Option<bool>,
    ) -> Result<()> {
        let frame = self.subscribe_frame(destination, properties);
        self.transmit(frame, sync).await?;

        self.subscriptions
            .insert(destination.to_string(), properties.clone());
        tracing::debug!("Subscribed to {}", destination);
        Ok(())
    }

    fn subscribe_frame(&self, destination: &str, properties: &Headers) -> Frame {
        let mut frame = Frame::new(Command::Subscribe)
            .with_header("ack", "client-individual")
            .with_header("id", destination)
            .with_header("activemq.prefetchSize", self.config.prefetch_size.to_string());
        if let Some(client_id) = &self.config.client_id {
            frame = frame.with_header("activemq.subscriptionName", client_id.as_str());
        }
        frame
            .with_headers(properties)
            .with_header("destination", destination)
    }

    /// Unsubscribe from a destination and forget it.
    ///
    /// The `id` defaults to the one the subscription was made with.
    pub async fn unsubscribe(
        &mut self,
        destination: &str,
        properties: &Headers,
        sync: Option<bool>,
    ) -> Result<()> {
        let id = self
            .subscriptions
            .get(destination)
            .and_then(|p| p.get("id"))
            .unwrap_or(destination)
            .to_string();

        let frame = Frame::new(Command::Unsubscribe)
            .with_header("id", id)
            .with_headers(properties)
            .with_header("destination", destination);
        self.transmit(frame, sync).await?;

        self.subscriptions.remove(destination);
        tracing::debug!("Unsubscribed from {}", destination);
        Ok(())
    }

    /// Start a transaction.
    pub async fn begin(&mut self, transaction_id: Option<&str>, sync: Option<bool>) -> Result<()> {
        self.transaction(Command::Begin, transaction_id, sync).await
    }

    /// Commit a transaction.
    pub async fn commit(&mut self, transaction_id: Option<&str>, sync: Option<bool>) -> Result<()> {
        self.transaction(Command::Commit, transaction_id, sync).await
    }

    /// Roll back a transaction.
    pub async fn abort(&mut self, transaction_id: Option<&str>, sync: Option<bool>) -> Result<()> {
        self.transaction(Command::Abort, transaction_id, sync).await
    }

    async fn transaction(
        &mut self,
        command: Command,
        transaction_id: Option<&str>,
        sync: Option<bool>,
    ) -> Result<()> {
        let mut frame = Frame::new(command);
        if let Some(tx) = transaction_id {
            frame = frame.with_header("transaction", tx);
        }
        self.transmit(frame, sync).await
    }

    /// Acknowledge a message. Never waits for a receipt.
    pub async fn ack(
        &mut self,
        target: impl Into<AckTarget>,
        transaction_id: Option<&str>,
    ) -> Result<()> {
        let frame = self.ack_frame(Command::Ack, target.into(), transaction_id);
        self.write_frame(&frame).await
    }

    /// Reject a message. Never waits for a receipt.
    pub async fn nack(
        &mut self,
        target: impl Into<AckTarget>,
        transaction_id: Option<&str>,
    ) -> Result<()> {
        let frame = self.ack_frame(Command::Nack, target.into(), transaction_id);
        self.write_frame(&frame).await
    }

    fn ack_frame(&self, command: Command, target: AckTarget, transaction_id: Option<&str>) -> Frame {
        let mut frame = Frame::new(command);
        match target {
            AckTarget::FromFrame(headers) => {
                for name in ["subscription", "message-id"] {
                    if let Some(value) = headers.get(name) {
                        frame = frame.with_header(name, value);
                    }
                }
                if self.version > 1.1 {
                    if let Some(ack) = headers.get("ack") {
                        frame = frame.with_header("id", ack);
                    }
                }
            }
            AckTarget::FromId(id) => {
                frame = frame.with_header("message-id", id);
            }
        }
        if let Some(tx) = transaction_id {
            frame = frame.with_header("transaction", tx);
        }
        frame
    }

    /// Write a frame, waiting for its receipt when synchronous.
    async fn transmit(&mut self, frame: Frame, sync: Option<bool>) -> Result<()> {
        if !sync.unwrap_or(self.config.sync) {
            return self.write_frame(&frame).await;
        }

        let receipt = Uuid::new_v4().to_string();
        let frame = frame.with_header("receipt", receipt.as_str());
        self.write_frame(&frame).await?;
        self.expect_receipt(&receipt).await
    }

    async fn expect_receipt(&mut self, receipt: &str) -> Result<()> {
        let Some(frame) = self.read_next_frame().await? else {
            return Err(StompError::protocol(format!("No receipt received for {receipt}")));
        };

        match (frame.command(), frame.header("receipt-id")) {
            (Command::Receipt, Some(id)) if id == receipt => Ok(()),
            (Command::Receipt, id) => Err(StompError::protocol(format!(
                "Unexpected receipt id {} (expected {})",
                id.unwrap_or("<none>"),
                receipt
            ))),
            (command, _) => Err(StompError::protocol_with_body(
                format!("Unexpected command: {command}"),
                frame.body(),
            )),
        }
    }

    /// Write a frame, reconnecting and retrying once on transport failure.
    async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let bytes = frame.encode();
        match self.write_bytes(&bytes).await {
            Err(e) if e.is_transport() => {
                tracing::warn!("Write of {} frame failed: {}", frame.command(), e);
                self.reconnect().await?;
                self.write_bytes(&bytes).await?;
            }
            other => other?,
        }
        tracing::debug!("Sent {} frame ({} bytes)", frame.command(), bytes.len());
        Ok(())
    }

    async fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(StompError::NotConnected)?;
        stream.write_all(bytes).await?;
        stream.flush().await?;
        Ok(())
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// Read the next frame from the broker.
    ///
    /// Returns `Ok(None)` when nothing arrives within the read timeout.
    /// Frames with a `jms-map-json` or `jms-map-xml` transformation come back
    /// as [`Message::Map`].
    pub async fn read_frame(&mut self) -> Result<Option<Message>> {
        Ok(self.read_next_frame().await?.map(Message::from_frame))
    }

    /// True if a complete frame is buffered or the socket turns readable
    /// within the read timeout.
    pub async fn has_frame_to_read(&self) -> Result<bool> {
        if self.buffer.contains_complete_frame() {
            return Ok(true);
        }
        self.wait_readable().await
    }

    async fn read_next_frame(&mut self) -> Result<Option<Frame>> {
        match self.read_frame_once().await {
            Err(e) if e.is_transport() => {
                tracing::warn!("Read failed: {}", e);
                self.reconnect().await?;
                self.read_frame_once().await
            }
            other => other,
        }
    }

    /// One readiness wait, bounded by the read timeout, then plain reads
    /// until a frame is complete.
    async fn read_frame_once(&mut self) -> Result<Option<Frame>> {
        if !self.buffer.contains_complete_frame() && !self.wait_readable().await? {
            return Ok(None);
        }

        loop {
            if let Some(raw) = self.buffer.extract_next_frame()? {
                if raw.len() < MIN_FRAME_LEN {
                    continue;
                }
                let frame = Frame::decode(&raw)?;
                tracing::debug!("Read {} frame ({} bytes)", frame.command(), raw.len());
                return Ok(Some(frame));
            }

            self.fill_buffer().await?;
        }
    }

    async fn wait_readable(&self) -> Result<bool> {
        let stream = self.stream.as_ref().ok_or(StompError::NotConnected)?;
        match timeout(self.config.read_timeout, stream.readable()).await {
            Ok(ready) => {
                ready?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    async fn fill_buffer(&mut self) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(StompError::NotConnected)?;
        let mut chunk = vec![0u8; self.config.tcp_buffer_size.max(1)];
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(StompError::ConnectionClosed);
        }
        self.buffer.append(&chunk[..n]);
        Ok(())
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Send DISCONNECT (best effort), close the socket and reset the session,
    /// subscriptions, credentials and read buffer.
    pub async fn disconnect(&mut self) {
        if self.stream.is_some() {
            let frame = self.disconnect_frame();
            if let Err(e) = self.write_bytes(&frame.encode()).await {
                tracing::debug!("DISCONNECT not delivered: {}", e);
            }
            if let Some(stream) = self.stream.as_mut() {
                let _ = stream.shutdown().await;
            }
            tracing::info!("Disconnected");
        }

        self.close_socket();
        self.subscriptions.clear();
        self.credentials = Credentials::default();
    }

    fn disconnect_frame(&self) -> Frame {
        let mut frame = Frame::new(Command::Disconnect);
        if let Some(client_id) = &self.config.client_id {
            frame = frame.with_header("client-id", client_id.as_str());
        }
        frame
    }

    fn close_socket(&mut self) {
        self.stream = None;
        self.host = None;
        self.session_id = None;
        self.version = 1.0;
        self.state = ConnectionState::Disconnected;
        self.buffer.clear();
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            let bytes = self.disconnect_frame().encode();
            if let Err(e) = stream.try_write(&bytes) {
                tracing::debug!("DISCONNECT on drop not delivered: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state)
            .field("host", &self.host)
            .field("session_id", &self.session_id)
            .field("version", &self.version)
            .field("subscriptions", &self.subscriptions.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::SingleHost;

    fn connection(config: ConnectionConfig) -> Connection {
        Connection::with_config(SingleHost::new(BrokerUri::new("tcp", "localhost", 61613)), config)
    }

    fn message_headers() -> Headers {
        Headers::from([
            ("subscription", "/queue/a"),
            ("message-id", "ID:1"),
            ("ack", "ack-7"),
            ("destination", "/queue/a"),
        ])
    }

    #[test]
    fn test_initial_state() {
        let conn = connection(ConnectionConfig::default());
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(!conn.is_connected());
        assert_eq!(conn.session_id(), None);
        assert_eq!(conn.version(), 1.0);
    }

    #[test]
    fn test_subscribe_frame_defaults() {
        let conn = connection(ConnectionConfig::default().with_prefetch_size(5));
        let frame = conn.subscribe_frame("/queue/a", &Headers::new());

        let names: Vec<_> = frame.headers().iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["ack", "id", "activemq.prefetchSize", "destination"]);
        assert_eq!(frame.header("ack"), Some("client-individual"));
        assert_eq!(frame.header("id"), Some("/queue/a"));
        assert_eq!(frame.header("activemq.prefetchSize"), Some("5"));
    }

    #[test]
    fn test_subscribe_frame_overrides() {
        let conn = connection(ConnectionConfig::default().with_client_id("cid"));
        let props = Headers::from([("ack", "auto"), ("destination", "/queue/other")]);
        let frame = conn.subscribe_frame("/queue/a", &props);

        assert_eq!(frame.header("ack"), Some("auto"));
        assert_eq!(frame.header("activemq.subscriptionName"), Some("cid"));
        assert_eq!(frame.header("destination"), Some("/queue/a"));
    }

    #[test]
    fn test_ack_frame_version_1_0() {
        let conn = connection(ConnectionConfig::default());
        let frame = conn.ack_frame(Command::Ack, AckTarget::FromFrame(message_headers()), None);

        assert_eq!(frame.header("subscription"), Some("/queue/a"));
        assert_eq!(frame.header("message-id"), Some("ID:1"));
        assert_eq!(frame.header("id"), None);
        assert_eq!(frame.header("transaction"), None);
    }

    #[test]
    fn test_ack_frame_version_1_2_uses_ack_header() {
        let mut conn = connection(ConnectionConfig::default());
        conn.version = 1.2;
        let frame = conn.ack_frame(Command::Nack, AckTarget::FromFrame(message_headers()), Some("tx1"));

        assert_eq!(frame.command(), Command::Nack);
        assert_eq!(frame.header("id"), Some("ack-7"));
        assert_eq!(frame.header("transaction"), Some("tx1"));
    }

    #[test]
    fn test_ack_frame_version_1_1_has_no_id() {
        let mut conn = connection(ConnectionConfig::default());
        conn.version = 1.1;
        let frame = conn.ack_frame(Command::Ack, AckTarget::FromFrame(message_headers()), None);
        assert_eq!(frame.header("id"), None);
    }

    #[test]
    fn test_ack_frame_from_id() {
        let conn = connection(ConnectionConfig::default());
        let frame = conn.ack_frame(Command::Ack, "ID:9".into(), None);

        assert_eq!(frame.headers().len(), 1);
        assert_eq!(frame.header("message-id"), Some("ID:9"));
    }

    #[test]
    fn test_ack_target_from_frame_skips_missing_headers() {
        let conn = connection(ConnectionConfig::default());
        let received = Frame::new(Command::Message).with_header("message-id", "ID:2");
        let frame = conn.ack_frame(Command::Ack, (&received).into(), None);

        assert_eq!(frame.header("message-id"), Some("ID:2"));
        assert!(!frame.headers().contains("subscription"));
    }

    #[test]
    fn test_connect_frame_versions() {
        let mut conn = connection(ConnectionConfig::default().with_client_id("cid"));
        conn.credentials.username = "user".into();
        conn.credentials.password = "pass".into();
        conn.host = Some(BrokerUri::new("tcp", "broker", 61613));

        let frame = conn.connect_frame();
        assert_eq!(frame.header("login"), Some("user"));
        assert_eq!(frame.header("passcode"), Some("pass"));
        assert_eq!(frame.header("client-id"), Some("cid"));
        assert_eq!(frame.header("accept-version"), Some(DEFAULT_ACCEPT_VERSIONS));
        assert_eq!(frame.header("host"), Some("broker"));

        conn.credentials.versions = "1.0".into();
        let frame = conn.connect_frame();
        assert!(!frame.headers().contains("accept-version"));
        assert!(!frame.headers().contains("host"));
    }

    #[test]
    fn test_outgoing_conversions() {
        let frame = Outgoing::from("hi").into_frame();
        assert_eq!(frame.command(), Command::Send);
        assert_eq!(frame.body(), b"hi");

        let prepared = Frame::new(Command::Send).with_header("persistent", "true");
        let frame = Outgoing::from(prepared.clone()).into_frame();
        assert_eq!(frame, prepared);
    }

    #[test]
    fn test_set_read_timeout_and_buffer() {
        let mut conn = connection(ConnectionConfig::default());
        conn.set_read_timeout(2, 500);
        assert_eq!(conn.config().read_timeout, Duration::from_millis(2500));

        conn.set_buffer_size(0);
        assert_eq!(conn.config().tcp_buffer_size, 1);
    }

    #[tokio::test]
    async fn test_operations_need_a_socket() {
        let mut conn = connection(ConnectionConfig::default());
        assert!(matches!(
            conn.send("/queue/a", "x", &Headers::new(), None).await,
            Err(StompError::NotConnected)
        ));
        assert!(matches!(conn.read_frame().await, Err(StompError::NotConnected)));
        assert!(matches!(conn.has_frame_to_read().await, Err(StompError::NotConnected)));
    }

    #[tokio::test]
    async fn test_connect_fails_without_broker() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = ConnectionConfig::default().with_connect_attempts(3);
        let mut conn = Connection::with_config(
            SingleHost::new(BrokerUri::new("tcp", "127.0.0.1", port)),
            config,
        );

        assert!(matches!(
            conn.connect("", "", "").await,
            Err(StompError::Connect(_))
        ));
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }
}

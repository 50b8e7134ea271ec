//! Error types for stomp-wire-client.

use thiserror::Error;

/// Main error type for all STOMP operations.
#[derive(Debug, Error)]
pub enum StompError {
    /// No broker could be reached within the connect attempt budget.
    #[error("Could not connect: {0}")]
    Connect(String),

    /// The broker answered with something other than what the protocol requires
    /// (wrong command, missing or mismatched receipt, malformed framing).
    #[error("Protocol error: {message}")]
    Protocol {
        /// What went wrong.
        message: String,
        /// Body of the offending broker frame, if there was one.
        body: Option<String>,
    },

    /// Read or write failure on the socket.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The broker closed the socket in an orderly way.
    #[error("Connection closed by broker")]
    ConnectionClosed,

    /// An operation needed a live socket and there was none.
    #[error("Socket connection hasn't been established")]
    NotConnected,

    /// Broker URI could not be parsed.
    #[error("Invalid broker URI: {0}")]
    InvalidUri(String),

    /// JSON error (map bodies, configuration).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML error (map bodies).
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl StompError {
    /// Create a protocol error without a broker body.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            body: None,
        }
    }

    /// Create a protocol error carrying the broker's frame body as detail.
    pub fn protocol_with_body(message: impl Into<String>, body: &[u8]) -> Self {
        Self::Protocol {
            message: message.into(),
            body: Some(String::from_utf8_lossy(body).into_owned()),
        }
    }

    /// True for failures that a reconnect may cure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::ConnectionClosed)
    }
}

/// Result type alias using StompError.
pub type Result<T> = std::result::Result<T, StompError>;

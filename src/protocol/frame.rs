//! Frame value type.
//!
//! A frame is built once with the `with_*` methods and read afterwards.
//! Uses `bytes::Bytes` so a decoded body is shared, not copied.
//!
//! # Example
//!
//! ```
//! use stomp_wire_client::protocol::{Command, Frame};
//!
//! let frame = Frame::new(Command::Send)
//!     .with_header("destination", "/queue/a")
//!     .with_body("hello");
//!
//! let bytes = frame.encode();
//! assert_eq!(bytes, b"SEND\ndestination:/queue/a\n\nhello\0");
//! ```

use std::borrow::Cow;

use bytes::Bytes;

use super::wire_format::{decode_frame, Command, CONTENT_LENGTH, NEWLINE, NULL_BYTE};
use super::Headers;
use crate::error::Result;

/// A complete protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command: Command,
    headers: Headers,
    body: Bytes,
}

impl Frame {
    /// Create a frame with no headers and an empty body.
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Create a frame from its parts.
    pub fn from_parts(command: Command, headers: Headers, body: Bytes) -> Self {
        Self {
            command,
            headers,
            body,
        }
    }

    /// Set one header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Overlay a set of headers; names already present are overwritten.
    pub fn with_headers(mut self, headers: &Headers) -> Self {
        self.headers.merge(headers);
        self
    }

    /// Replace the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Declare the body length so brokers read it as binary.
    pub fn with_content_length(self) -> Self {
        let len = self.body.len();
        self.with_header(CONTENT_LENGTH, len.to_string())
    }

    /// Parse a frame from extracted wire bytes.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        decode_frame(raw)
    }

    #[inline]
    pub fn command(&self) -> Command {
        self.command
    }

    #[inline]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Value of a single header.
    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as shared `Bytes` (cheap clone).
    #[inline]
    pub fn body_bytes(&self) -> Bytes {
        self.body.clone()
    }

    /// Body decoded as UTF-8, lossily.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Split into command, headers and body.
    pub fn into_parts(self) -> (Command, Headers, Bytes) {
        (self.command, self.headers, self.body)
    }

    /// Serialize to wire bytes, terminator included.
    ///
    /// A `content-length` header is written as the body's byte length,
    /// whatever value it was given.
    pub fn encode(&self) -> Vec<u8> {
        let command = self.command.as_str();
        let mut buf = Vec::with_capacity(command.len() + 64 * (self.headers.len() + 1) + self.body.len());

        buf.extend_from_slice(command.as_bytes());
        buf.push(NEWLINE);

        let body_len = self.body.len().to_string();
        for (name, value) in self.headers.iter() {
            let value = if name == CONTENT_LENGTH { body_len.as_str() } else { value };
            buf.extend_from_slice(name.as_bytes());
            buf.push(b':');
            buf.extend_from_slice(value.as_bytes());
            buf.push(NEWLINE);
        }

        buf.push(NEWLINE);
        buf.extend_from_slice(&self.body);
        buf.push(NULL_BYTE);
        buf
    }
}

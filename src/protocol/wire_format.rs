//! Wire format constants, command vocabulary and frame parsing.
//!
//! A STOMP frame on the wire:
//! ```text
//! COMMAND\n
//! name:value\n        (zero or more, order preserved, no escaping)
//! \n
//! <body bytes>
//! \0
//! ```

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use super::{Frame, Headers};
use crate::error::{Result, StompError};

/// Frame terminator byte.
pub const NULL_BYTE: u8 = 0x00;

/// Line terminator.
pub const NEWLINE: u8 = b'\n';

/// Blank line separating the header block from the body.
pub const HEADER_SEPARATOR: &[u8] = b"\n\n";

/// Header that switches a frame to length-delimited framing.
pub const CONTENT_LENGTH: &str = "content-length";

/// Default broker port when a URI omits it.
pub const DEFAULT_PORT: u16 = 61613;

/// Extracted frames shorter than this are keep-alive noise, not frames.
pub const MIN_FRAME_LEN: usize = 2;

/// Bytes trimmed from the end of a sentinel-delimited body.
const TRAILING_WHITESPACE: &[u8] = b" \t\n\r\x0B\0";

/// STOMP command vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Connect,
    Connected,
    Send,
    Subscribe,
    Unsubscribe,
    Begin,
    Commit,
    Abort,
    Ack,
    Nack,
    Disconnect,
    Message,
    Receipt,
    Error,
}

impl Command {
    /// Wire spelling of the command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Connected => "CONNECTED",
            Command::Send => "SEND",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Begin => "BEGIN",
            Command::Commit => "COMMIT",
            Command::Abort => "ABORT",
            Command::Ack => "ACK",
            Command::Nack => "NACK",
            Command::Disconnect => "DISCONNECT",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = StompError;

    fn from_str(s: &str) -> Result<Self> {
        let command = match s {
            "CONNECT" => Command::Connect,
            "CONNECTED" => Command::Connected,
            "SEND" => Command::Send,
            "SUBSCRIBE" => Command::Subscribe,
            "UNSUBSCRIBE" => Command::Unsubscribe,
            "BEGIN" => Command::Begin,
            "COMMIT" => Command::Commit,
            "ABORT" => Command::Abort,
            "ACK" => Command::Ack,
            "NACK" => Command::Nack,
            "DISCONNECT" => Command::Disconnect,
            "MESSAGE" => Command::Message,
            "RECEIPT" => Command::Receipt,
            "ERROR" => Command::Error,
            other => {
                return Err(StompError::protocol(format!("Unknown command: {other:?}")));
            }
        };
        Ok(command)
    }
}

/// Position of the first `\n\n` in `buf`.
#[inline]
pub fn find_header_separator(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_SEPARATOR.len())
        .position(|w| w == HEADER_SEPARATOR)
}

/// Declared body length from a header block.
///
/// Matches only a line that is exactly `content-length:<digits>`.
pub fn declared_content_length(header_block: &[u8]) -> Option<usize> {
    const PREFIX: &[u8] = b"content-length:";

    header_block
        .split(|&b| b == NEWLINE)
        .filter_map(|line| line.strip_prefix(PREFIX))
        .find(|digits| !digits.is_empty() && digits.iter().all(u8::is_ascii_digit))
        .and_then(|digits| std::str::from_utf8(digits).ok()?.parse().ok())
}

/// Parse one extracted frame (terminator already removed).
///
/// First line is the command, each following line splits on its first `:`.
/// Sentinel-delimited bodies lose trailing whitespace; a body whose length
/// was declared with `content-length` is kept byte for byte.
pub fn decode_frame(raw: &[u8]) -> Result<Frame> {
    let raw = trim_leading_newlines(raw);

    let (head, body) = match find_header_separator(raw) {
        Some(sep) => (&raw[..sep], &raw[sep + HEADER_SEPARATOR.len()..]),
        None => (raw, &raw[raw.len()..]),
    };

    let head = std::str::from_utf8(head)
        .map_err(|_| StompError::protocol("Frame headers are not valid UTF-8"))?;

    let mut lines = head.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));
    let command: Command = lines.next().unwrap_or_default().parse()?;

    let mut headers = Headers::new();
    for line in lines.filter(|line| !line.is_empty()) {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| StompError::protocol(format!("Malformed header line: {line:?}")))?;
        headers.insert(name, value);
    }

    let body = if headers.contains(CONTENT_LENGTH) {
        body
    } else {
        trim_trailing_whitespace(body)
    };

    Ok(Frame::from_parts(command, headers, Bytes::copy_from_slice(body)))
}

#[inline]
pub(crate) fn trim_leading_newlines(buf: &[u8]) -> &[u8] {
    let skip = buf.iter().take_while(|&&b| b == NEWLINE).count();
    &buf[skip..]
}

#[inline]
fn trim_trailing_whitespace(buf: &[u8]) -> &[u8] {
    let keep = buf
        .iter()
        .rposition(|b| !TRAILING_WHITESPACE.contains(b))
        .map_or(0, |i| i + 1);
    &buf[..keep]
}

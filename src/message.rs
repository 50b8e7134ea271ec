//! Messages returned by the read loop and map messages for sending.
//!
//! A decoded frame whose `transformation` header names a known map scheme is
//! surfaced as [`Message::Map`]; everything else stays a plain
//! [`Message::Frame`].

use bytes::Bytes;

use crate::codec::{MapBody, Transformation, TRANSFORMATION_HEADER};
use crate::error::Result;
use crate::protocol::{Command, Frame, Headers};

/// A frame read from the broker.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Plain frame.
    Frame(Frame),
    /// Frame whose body decoded as a map.
    Map(MapMessage),
}

impl Message {
    /// Reinterpret a decoded frame as a map message when its
    /// `transformation` header asks for it.
    ///
    /// A body that fails to decode is logged and returned as a plain frame.
    pub fn from_frame(frame: Frame) -> Self {
        let Some(transformation) = Transformation::of(&frame) else {
            return Message::Frame(frame);
        };

        match transformation.decode(frame.body()) {
            Ok(map) => Message::Map(MapMessage { frame, map }),
            Err(e) => {
                tracing::warn!(
                    "Could not decode {} body ({} bytes): {}",
                    transformation.as_str(),
                    frame.body().len(),
                    e
                );
                Message::Frame(frame)
            }
        }
    }

    /// The underlying frame.
    pub fn frame(&self) -> &Frame {
        match self {
            Message::Frame(frame) => frame,
            Message::Map(map) => &map.frame,
        }
    }

    /// Consume into the underlying frame.
    pub fn into_frame(self) -> Frame {
        match self {
            Message::Frame(frame) => frame,
            Message::Map(map) => map.frame,
        }
    }

    #[inline]
    pub fn command(&self) -> Command {
        self.frame().command()
    }

    #[inline]
    pub fn headers(&self) -> &Headers {
        self.frame().headers()
    }

    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.frame().header(name)
    }

    #[inline]
    pub fn body(&self) -> &[u8] {
        self.frame().body()
    }

    /// Map payload, for map messages.
    pub fn map(&self) -> Option<&MapBody> {
        match self {
            Message::Frame(_) => None,
            Message::Map(map) => Some(&map.map),
        }
    }
}

impl From<Frame> for Message {
    fn from(frame: Frame) -> Self {
        Message::from_frame(frame)
    }
}

/// A message carrying a string-keyed map, encoded per a [`Transformation`].
///
/// # Example
///
/// ```
/// use stomp_wire_client::codec::MapBody;
/// use stomp_wire_client::MapMessage;
///
/// let mut map = MapBody::new();
/// map.insert("city".into(), "Belgrade".into());
///
/// let message = MapMessage::new(map).unwrap().with_header("persistent", "true");
/// let frame = message.into_frame();
/// assert_eq!(frame.header("transformation"), Some("jms-map-json"));
/// assert_eq!(frame.body(), br#"{"city":"Belgrade"}"#);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MapMessage {
    frame: Frame,
    map: MapBody,
}

impl MapMessage {
    /// Build an outbound `jms-map-json` SEND frame from a map.
    pub fn new(map: MapBody) -> Result<Self> {
        Self::with_transformation(map, Transformation::JmsMapJson)
    }

    /// Build an outbound SEND frame from a map with the given scheme.
    pub fn with_transformation(map: MapBody, transformation: Transformation) -> Result<Self> {
        let body = transformation.encode(&map)?;
        let frame = Frame::new(Command::Send)
            .with_header(TRANSFORMATION_HEADER, transformation.as_str())
            .with_body(Bytes::from(body));
        Ok(Self { frame, map })
    }

    /// Add a header to the outbound frame.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.frame = self.frame.with_header(name, value);
        self
    }

    /// Decoded payload.
    pub fn map(&self) -> &MapBody {
        &self.map
    }

    /// Frame carrying the encoded payload.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Consume into the frame carrying the encoded payload.
    pub fn into_frame(self) -> Frame {
        self.frame
    }
}

impl From<MapMessage> for Frame {
    fn from(message: MapMessage) -> Self {
        message.into_frame()
    }
}

//! Codec module - map payload transformations.
//!
//! Brokers such as ActiveMQ convert JMS map messages to a textual body and
//! name the scheme in the `transformation` header:
//!
//! - [`JsonMapCodec`] - `jms-map-json`, a JSON object
//! - [`XmlMapCodec`] - `jms-map-xml`, `<map><entry>..</entry></map>`
//!
//! # Design
//!
//! Codecs are marker structs with static methods; [`Transformation`] picks
//! one from a header value.
//!
//! # Example
//!
//! ```
//! use stomp_wire_client::codec::{JsonMapCodec, MapBody};
//!
//! let mut map = MapBody::new();
//! map.insert("city".into(), "Belgrade".into());
//!
//! let body = JsonMapCodec::encode(&map).unwrap();
//! assert_eq!(JsonMapCodec::decode(&body).unwrap(), map);
//! ```

mod json;
mod xml;

pub use json::JsonMapCodec;
pub use xml::XmlMapCodec;

use crate::error::Result;
use crate::protocol::Frame;

/// Header naming the body transformation.
pub const TRANSFORMATION_HEADER: &str = "transformation";

/// Structured payload of a map message.
pub type MapBody = serde_json::Map<String, serde_json::Value>;

/// Known body transformation schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transformation {
    /// `jms-map-json`
    JmsMapJson,
    /// `jms-map-xml`
    JmsMapXml,
}

impl Transformation {
    /// Header value for this scheme.
    pub fn as_str(&self) -> &'static str {
        match self {
            Transformation::JmsMapJson => "jms-map-json",
            Transformation::JmsMapXml => "jms-map-xml",
        }
    }

    /// Scheme named by a header value, if known.
    pub fn from_header(value: &str) -> Option<Self> {
        match value {
            "jms-map-json" => Some(Transformation::JmsMapJson),
            "jms-map-xml" => Some(Transformation::JmsMapXml),
            _ => None,
        }
    }

    /// Scheme named by a frame's `transformation` header, if known.
    pub fn of(frame: &Frame) -> Option<Self> {
        frame
            .header(TRANSFORMATION_HEADER)
            .and_then(Self::from_header)
    }

    /// Encode a map into a body.
    pub fn encode(&self, map: &MapBody) -> Result<Vec<u8>> {
        match self {
            Transformation::JmsMapJson => JsonMapCodec::encode(map),
            Transformation::JmsMapXml => Ok(XmlMapCodec::encode(map)),
        }
    }

    /// Decode a body into a map.
    pub fn decode(&self, body: &[u8]) -> Result<MapBody> {
        match self {
            Transformation::JmsMapJson => JsonMapCodec::decode(body),
            Transformation::JmsMapXml => XmlMapCodec::decode(body),
        }
    }
}

//! `jms-map-xml` codec using `quick-xml`.
//!
//! Body layout produced by ActiveMQ:
//!
//! ```text
//! <map>
//!   <entry>
//!     <string>name</string>
//!     <string>Dejan</string>
//!   </entry>
//!   <entry>
//!     <string>age</string>
//!     <int>42</int>
//!   </entry>
//! </map>
//! ```
//!
//! The first child of an `entry` is the key, the second the value. The value
//! element's name types it: integer and floating point elements become JSON
//! numbers, `boolean` becomes a JSON bool, anything else a string.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Number, Value};

use super::MapBody;
use crate::error::{Result, StompError};

/// XML map codec.
pub struct XmlMapCodec;

impl XmlMapCodec {
    /// Encode a map as `<map><entry>..</entry></map>`.
    pub fn encode(map: &MapBody) -> Vec<u8> {
        let mut xml = String::from("<map>");
        for (key, value) in map {
            let (element, text) = match value {
                Value::String(s) => ("string", s.clone()),
                Value::Bool(b) => ("boolean", b.to_string()),
                Value::Number(n) if n.is_f64() => ("double", n.to_string()),
                Value::Number(n) => ("long", n.to_string()),
                Value::Null => ("null", String::new()),
                other => ("string", other.to_string()),
            };
            xml.push_str("<entry><string>");
            xml.push_str(&escape(key.as_str()));
            xml.push_str("</string>");
            if element == "null" {
                xml.push_str("<null/>");
            } else {
                xml.push_str(&format!("<{element}>{}</{element}>", escape(text.as_str())));
            }
            xml.push_str("</entry>");
        }
        xml.push_str("</map>");
        xml.into_bytes()
    }

    /// Decode an XML map body.
    ///
    /// Entries with fewer than two child elements are skipped.
    ///
    /// # Errors
    ///
    /// Returns error if the body is not UTF-8 or not well-formed XML.
    pub fn decode(body: &[u8]) -> Result<MapBody> {
        let xml = std::str::from_utf8(body)
            .map_err(|_| StompError::protocol("jms-map-xml body is not valid UTF-8"))?;

        let mut reader = Reader::from_str(xml);
        let mut map = MapBody::new();

        let mut in_entry = false;
        // (element name, text) for each child of the current entry
        let mut fields: Vec<(String, String)> = Vec::new();
        let mut current: Option<(String, String)> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) if e.name().as_ref() == b"entry" => {
                    in_entry = true;
                    fields.clear();
                }
                Event::Start(e) if in_entry => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    current = Some((name, String::new()));
                }
                Event::Empty(e) if in_entry => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    fields.push((name, String::new()));
                }
                Event::Text(t) => {
                    if let Some((_, text)) = current.as_mut() {
                        let unescaped = t
                            .unescape()
                            .map_err(|e| StompError::protocol(format!("jms-map-xml: {e}")))?;
                        text.push_str(&unescaped);
                    }
                }
                Event::CData(c) => {
                    if let Some((_, text)) = current.as_mut() {
                        text.push_str(&String::from_utf8_lossy(&c));
                    }
                }
                Event::End(e) if e.name().as_ref() == b"entry" => {
                    in_entry = false;
                    if let [(_, key), (element, text), ..] = fields.as_slice() {
                        map.insert(key.clone(), typed_value(element, text));
                    }
                }
                Event::End(_) => {
                    if let Some(field) = current.take() {
                        fields.push(field);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(map)
    }
}

fn typed_value(element: &str, text: &str) -> Value {
    match element {
        "int" | "long" | "short" | "byte" => text
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(text.to_string())),
        "double" | "float" => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.to_string())),
        "boolean" => match text.trim() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(text.to_string()),
        },
        "null" => Value::Null,
        _ => Value::String(text.to_string()),
    }
}

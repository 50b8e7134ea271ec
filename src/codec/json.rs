//! `jms-map-json` codec using `serde_json`.

use serde_json::Value;

use super::MapBody;
use crate::error::{Result, StompError};

/// JSON object codec for map messages.
pub struct JsonMapCodec;

impl JsonMapCodec {
    /// Encode a map as a JSON object.
    #[inline]
    pub fn encode(map: &MapBody) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(map)?)
    }

    /// Decode a JSON object body.
    ///
    /// # Errors
    ///
    /// Returns error if the body is not JSON or not a JSON object.
    pub fn decode(body: &[u8]) -> Result<MapBody> {
        match serde_json::from_slice::<Value>(body)? {
            Value::Object(map) => Ok(map),
            _ => Err(StompError::protocol_with_body(
                "jms-map-json body is not a JSON object",
                body,
            )),
        }
    }
}

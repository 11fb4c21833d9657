//! Encoding a [`Message`](crate::message::Message) to and from an opaque,
//! self-describing byte payload: `base64(serde_json::to_vec(message))`.
//!
//! `Message::args` is a `serde_json::Map<String, Value>`, and `Value`'s
//! `Deserialize` impl requires a self-describing format (it calls
//! `deserialize_any`), which rules out a non-self-describing binary codec
//! like `bincode` for this payload. The base64 wrapping keeps the result
//! safe to treat as opaque ASCII bytes on the wire.

use crate::error::{BgpyError, Result};
use crate::message::Message;

/// Encodes a message to a base64-wrapped JSON payload.
pub fn serialize(msg: &Message) -> Result<Vec<u8>> {
    let bytes = serde_json::to_vec(msg)?;
    Ok(base64::encode(bytes).into_bytes())
}

/// Decodes a payload produced by [`serialize`] back into a [`Message`].
pub fn deserialize(payload: &[u8]) -> Result<Message> {
    let bytes = base64::decode(payload).map_err(|e| BgpyError::Encoding(e.to_string()))?;
    Ok(serde_json::from_slice(&bytes)?)
}

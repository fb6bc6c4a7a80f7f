//! Hex text envelope for WebSocket frames.
//!
//! The remote server reads every frame as text holding a byte-string literal:
//!
//! ```text
//! b'82a4...'
//! ^^      ^
//! prefix  suffix
//! ```
//!
//! Outbound payloads are hex-encoded and wrapped; inbound text drops the
//! two-character prefix and the one trailing character before hex-decoding.
//! This doubles the wire size but is bit-compatible with the server.

use crate::error::{Result, WorkerError};

/// Text envelope codec.
pub struct HexEnvelope;

impl HexEnvelope {
    /// Leading characters of an enveloped frame.
    pub const PREFIX: &'static str = "b'";
    /// Trailing character of an enveloped frame.
    pub const SUFFIX: &'static str = "'";

    /// Wrap raw bytes into the envelope text.
    pub fn wrap(payload: &[u8]) -> String {
        let mut text = String::with_capacity(payload.len() * 2 + 3);
        text.push_str(Self::PREFIX);
        text.push_str(&hex::encode(payload));
        text.push_str(Self::SUFFIX);
        text
    }

    /// Strip the envelope and decode the hex body.
    ///
    /// The prefix and suffix are removed by position, not by value.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Envelope`] if the text is too short to hold an
    /// envelope or the body is not valid hex.
    pub fn unwrap(text: &str) -> Result<Vec<u8>> {
        let end = text
            .len()
            .checked_sub(Self::SUFFIX.len())
            .filter(|end| *end >= Self::PREFIX.len())
            .ok_or_else(|| WorkerError::Envelope(format!("frame too short ({} bytes)", text.len())))?;

        let body = text
            .get(Self::PREFIX.len()..end)
            .ok_or_else(|| WorkerError::Envelope("frame is not ASCII at envelope bounds".into()))?;

        Ok(hex::decode(body)?)
    }
}

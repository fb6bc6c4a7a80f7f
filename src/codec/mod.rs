//! Codec module - serialization for protocol messages and the wire envelope.
//!
//! - [`MsgPackCodec`] - MessagePack using `rmp-serde` (`to_vec_named`)
//! - [`HexEnvelope`] - the `b'<hex>'` text wrapping the remote server expects
//!
//! # Design
//!
//! Codecs are marker structs with static methods rather than trait objects.
//! The payload schema belongs to the remote execution framework; this crate
//! only needs an `encode(value) -> bytes` / `decode(bytes) -> value` pair.
//!
//! # Example
//!
//! ```
//! use wsworker_client::codec::{HexEnvelope, MsgPackCodec};
//!
//! let encoded = MsgPackCodec::encode(&"hello").unwrap();
//! let text = HexEnvelope::wrap(&encoded);
//! assert!(text.starts_with("b'"));
//!
//! let raw = HexEnvelope::unwrap(&text).unwrap();
//! let decoded: String = MsgPackCodec::decode(&raw).unwrap();
//! assert_eq!(decoded, "hello");
//! ```

mod envelope;
mod msgpack;

pub use envelope::HexEnvelope;
pub use msgpack::MsgPackCodec;

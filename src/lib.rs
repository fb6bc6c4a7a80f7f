//! # wsworker-client
//!
//! Client-side proxy for a remote execution worker reached over WebSocket.
//!
//! The proxy forwards opaque commands to a worker server and returns the
//! decoded results. It is the transport and reliability layer only: what a
//! command means is up to the remote framework.
//!
//! ## Architecture
//!
//! - **Codec**: MsgPack payloads inside a hex text envelope
//! - **Transport**: blocking channel for ordinary calls, cooperative (tokio)
//!   channel for the async `fit` path, never both at once
//! - **Session**: one live connection, reconnects and retries exactly once
//!   when the server drops the socket mid-exchange
//! - **Worker proxy**: `search`, remote introspection, generic commands,
//!   `fit` / `synchronous_fit`
//!
//! ## Example
//!
//! ```ignore
//! use wsworker_client::{protocol::Value, WorkerProxy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut bob = WorkerProxy::builder("localhost", 8777)
//!         .id("bob")
//!         .connect()?;
//!
//!     let hits: Vec<Value> = bob.search(["#mnist"])?;
//!     let model: Value = bob.fit("mnist", None).await?;
//!
//!     println!("{} -> {} hits, model {model}", bob.describe()?, hits.len());
//!     bob.close()?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod protocol;
pub mod transport;

mod session;
mod store;
#[cfg(test)]
mod testing;
mod worker;

pub use config::{WorkerConfig, DEFAULT_RETRY_PAUSE, TIMEOUT_INTERVAL};
pub use error::{Result, WorkerError};
pub use session::Session;
pub use store::ObjectStore;
pub use worker::{WorkerBuilder, WorkerProxy};

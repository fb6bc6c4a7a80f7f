//! Search a remote worker, print its summary, then train on a dataset.
//!
//! Run against a worker server listening on `localhost:8777`:
//!
//! ```text
//! RUST_LOG=wsworker_client=debug cargo run --example remote_search -- mnist
//! ```

use std::env;

use tracing_subscriber::EnvFilter;
use wsworker_client::protocol::Value;
use wsworker_client::{Result, WorkerProxy};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dataset = env::args().nth(1).unwrap_or_else(|| "mnist".to_string());

    let mut bob = WorkerProxy::builder("localhost", 8777)
        .id("bob")
        .verbose(true)
        .connect()?;

    let hits: Vec<Value> = bob.search([format!("#{dataset}")])?;
    println!("{} matches for #{dataset}", hits.len());
    for hit in &hits {
        println!("  {hit}");
    }

    println!("{}", bob.describe()?);

    let model: Value = bob.fit(&dataset, None).await?;
    println!("trained model: {model}");

    bob.close()
}

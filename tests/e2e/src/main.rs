//! End-to-end check of the regtest harness against a running node.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;

mod bitcoin_core;

#[tokio::main]
async fn main() -> Result<()> {
	println!("\n₿ Running Bitcoin Core harness test...");
	bitcoin_core::run_test().await?;

	println!("\n✅ All tests completed successfully!");
	Ok(())
}

use std::time::Duration;

use adapters::{MineOptions, NewAddressOptions, NodeClient, SendOptions, WalletOptions, WalletStatus};
use anyhow::Result;
use bitcoin::Amount;
use config::Config;
use serde_json::json;

pub async fn run_test() -> Result<()> {
	let config = Config::load(None)?;
	let mut client = NodeClient::new(&config.node)?;
	println!("  endpoint: {}", client.endpoint());

	client.wait_until_ready(30, Duration::from_secs(1)).await?;

	let mining_address = client.bootstrap().await?;
	assert_eq!(client.mining_address(), Some(mining_address.as_str()));

	// A second pass must find the wallet already loaded.
	assert_eq!(client.ensure_wallet().await?, WalletStatus::AlreadyLoaded);

	// Coinbase outputs mature after 100 blocks.
	let hashes = client.mine(&MineOptions::new().blocks(101)).await?;
	assert_eq!(hashes.len(), 101);
	assert!(client.get_balance().await? >= Amount::from_sat(50 * 100_000_000));

	let recipient = client
		.get_new_address(&NewAddressOptions::new().label("e2e").address_type("bech32m"))
		.await?;
	let txid = client.send_to_address(&SendOptions::new(recipient.clone(), Amount::from_sat(100_000))).await?;
	assert_eq!(txid.len(), 64);

	let hashes = client.mine(&MineOptions::default()).await?;
	assert_eq!(hashes.len(), 1);

	let tx = client.call("gettransaction", &[json!(txid)]).await?;
	assert!(tx["confirmations"].as_i64().unwrap_or_default() >= 1);

	// Unknown methods surface the node's code.
	let err = client.call("nosuchmethod", &[]).await.err().ok_or_else(|| anyhow::anyhow!("expected error"))?;
	assert_eq!(err.rpc_code(), Some(-32601));

	// Round-trip a throwaway wallet through a client bound to it.
	let scratch_config = config.node.for_wallet("e2e-scratch.dat")?;
	let mut scratch = NodeClient::new(&scratch_config)?;
	scratch.bootstrap().await?;
	assert!(client.list_wallets().await?.iter().any(|w| w == "e2e-scratch.dat"));
	scratch.unload_wallet(&WalletOptions::default()).await?;
	assert!(!client.list_wallets().await?.iter().any(|w| w == "e2e-scratch.dat"));

	println!("  ✓ bootstrap, mine, send and wallet round-trip");
	Ok(())
}

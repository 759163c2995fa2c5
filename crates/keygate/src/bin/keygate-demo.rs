//! Runs the subscription scenario once against an in-memory chain.
//!
//! An owner seals a message so that only they and active subscribers of a
//! plan can open it. A consumer tries to open it before and after
//! subscribing.
//!
//! Environment:
//!
//! - `KEYGATE_CHAIN` - chain name (default `mumbai`)
//! - `KEYGATE_SUBSCRIPTION_CONTRACT` - `0x` hex address of the subscription contract
//! - `KEYGATE_RPC_URL` - recorded in the config; the demo never dials it
//! - `KEYGATE_OWNER_SEED`, `KEYGATE_CONSUMER_SEED` - 32-byte hex Ed25519 seeds
//! - `KEYGATE_MASTER_KEY` - 32-byte hex escrow master key
//! - `KEYGATE_PLAN_ID` - plan id (default `100`)
//! - `KEYGATE_QUERY_TIMEOUT_MS` - per-call timeout
//! - `KEYGATE_DB` - SQLite path (default in-memory)
//! - `RUST_LOG` - log filter (default `info`)

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use keygate::core::{Address, ChainId, Keypair, MethodSignature, Value};
use keygate::escrow::MasterKeyWrapper;
use keygate::policy::memory::MemoryChain;
use keygate::store::SqliteStore;
use keygate::{Vault, VaultConfig, VaultError, SUBSCRIPTION_METHOD};
use tracing::info;
use tracing_subscriber::EnvFilter;

const MESSAGE: &[u8] = b"this is a super secret message";

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn seed_from_env(name: &str) -> Result<Option<[u8; 32]>> {
    let Some(value) = env(name) else {
        return Ok(None);
    };
    let bytes =
        hex::decode(value.trim_start_matches("0x")).with_context(|| format!("{name} is not hex"))?;
    let seed: [u8; 32] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("{name} must be 32 bytes"))?;
    Ok(Some(seed))
}

fn keypair_from_env(name: &str) -> Result<Keypair> {
    Ok(match seed_from_env(name)? {
        Some(seed) => Keypair::from_seed(&seed),
        None => Keypair::generate(),
    })
}

fn config_from_env() -> Result<VaultConfig> {
    let mut config = VaultConfig::default();
    if let Some(chain) = env("KEYGATE_CHAIN") {
        config.chain = ChainId::new(chain);
    }
    config.subscription_contract = match env("KEYGATE_SUBSCRIPTION_CONTRACT") {
        Some(hex) => hex
            .parse::<Address>()
            .context("KEYGATE_SUBSCRIPTION_CONTRACT is not an address")?,
        None => Address::from_bytes([0xca; 32]),
    };
    config.rpc_url = env("KEYGATE_RPC_URL");
    if let Some(ms) = env("KEYGATE_QUERY_TIMEOUT_MS") {
        let ms: u64 = ms.parse().context("KEYGATE_QUERY_TIMEOUT_MS is not a number")?;
        config.evaluator.query_timeout = Some(Duration::from_millis(ms));
    }
    Ok(config)
}

fn report(who: &str, outcome: &keygate::Result<zeroize::Zeroizing<Vec<u8>>>) {
    match outcome {
        Ok(plaintext) => println!("{who}: decrypted {:?}", String::from_utf8_lossy(plaintext)),
        Err(VaultError::Escrow(e)) => println!("{who}: {e}"),
        Err(e) => println!("{who}: failed: {e}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let config = config_from_env()?;
    let plan_id = env("KEYGATE_PLAN_ID").unwrap_or_else(|| "100".to_string());
    let owner = keypair_from_env("KEYGATE_OWNER_SEED")?;
    let consumer = keypair_from_env("KEYGATE_CONSUMER_SEED")?;

    let wrapper = match seed_from_env("KEYGATE_MASTER_KEY")? {
        Some(key) => MasterKeyWrapper::from_bytes(key),
        None => MasterKeyWrapper::generate()?,
    };
    let store = match env("KEYGATE_DB") {
        Some(path) => SqliteStore::open(&path).with_context(|| format!("opening {path}"))?,
        None => SqliteStore::open_memory()?,
    };

    if let Some(url) = &config.rpc_url {
        info!(%url, "RPC transport not built in; using the in-memory chain");
    }

    let chain = MemoryChain::new();
    let script_subscriptions = |count: i128| {
        chain.respond(
            &config.chain,
            &config.subscription_contract,
            &MethodSignature::new(SUBSCRIPTION_METHOD),
            vec![
                Value::Address(consumer.address()),
                Value::Address(owner.address()),
                Value::from(plan_id.as_str()),
            ],
            Value::Number(count),
        )
    };

    let vault = Vault::new(store, wrapper, Arc::clone(&chain), config.clone());
    info!(
        owner = %owner.address(),
        consumer = %consumer.address(),
        plan = %plan_id,
        "starting scenario"
    );

    let policy = vault.subscription_policy(owner.address(), &plan_id)?;
    let artifact = vault
        .seal(MESSAGE, policy, &owner, owner.address())
        .await
        .context("sealing the message")?;
    println!("sealed record {}", artifact.id());

    let outcome = vault.open(&artifact.id(), &owner, owner.address()).await;
    report("owner", &outcome);

    script_subscriptions(0);
    let outcome = vault.open(&artifact.id(), &consumer, consumer.address()).await;
    report("consumer without subscription", &outcome);

    script_subscriptions(1);
    let outcome = vault.open(&artifact.id(), &consumer, consumer.address()).await;
    report("consumer with subscription", &outcome);

    Ok(())
}

//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;
use std::time::Duration;

use keygate::{subscription_policy, Vault, VaultConfig, SUBSCRIPTION_METHOD};
use keygate_core::{Address, AuthAssertion, ChainId, Keypair, MethodSignature, Policy, Value};
use keygate_escrow::MasterKeyWrapper;
use keygate_policy::memory::MemoryChain;
use keygate_policy::QueryError;
use keygate_store::MemoryStore;

/// A participant with a deterministic or random identity.
#[derive(Debug, Clone)]
pub struct Party {
    pub keypair: Keypair,
}

impl Party {
    /// Create a party with a random keypair.
    pub fn new() -> Self {
        Self {
            keypair: Keypair::generate(),
        }
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            keypair: Keypair::from_seed(&seed),
        }
    }

    pub fn address(&self) -> Address {
        self.keypair.address()
    }

    /// A valid assertion signed by this party.
    pub fn assertion(&self) -> AuthAssertion {
        AuthAssertion::build(self.address(), &self.keypair)
            .expect("keypair signs for its own address")
    }
}

impl Default for Party {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple parties with distinct deterministic identities.
pub fn multi_party(count: usize) -> Vec<Party> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            seed[31] = 0x5a;
            Party::with_seed(seed)
        })
        .collect()
}

/// Vault type used by [`ScenarioFixture`].
pub type ScenarioVault = Vault<MemoryStore, MasterKeyWrapper, Arc<MemoryChain>>;

/// The subscription scenario: an owner, a consumer and a plan.
///
/// The vault evaluates against a scripted [`MemoryChain`]; use
/// [`set_subscriptions`](Self::set_subscriptions) and friends to control
/// what the subscription contract answers for the consumer.
pub struct ScenarioFixture {
    pub chain: Arc<MemoryChain>,
    pub vault: ScenarioVault,
    pub owner: Party,
    pub consumer: Party,
    pub plan_id: String,
}

impl ScenarioFixture {
    /// Plan, chain and contract used unless overridden.
    pub const PLAN_ID: &'static str = "100";
    pub const CHAIN: &'static str = "mumbai";
    pub const CONTRACT: Address = Address::from_bytes([0xca; 32]);

    /// Owner seeded with `[1; 32]`, consumer with `[2; 32]`.
    pub fn new() -> Self {
        Self::with_config(Self::config())
    }

    /// The fixture's default config with `query_timeout` replaced.
    pub fn with_timeout(timeout: Duration) -> Self {
        let mut config = Self::config();
        config.evaluator.query_timeout = Some(timeout);
        Self::with_config(config)
    }

    pub fn with_config(config: VaultConfig) -> Self {
        let chain = MemoryChain::new();
        let vault = Vault::new(
            MemoryStore::new(),
            MasterKeyWrapper::from_bytes([0x4b; 32]),
            Arc::clone(&chain),
            config,
        );
        Self {
            chain,
            vault,
            owner: Party::with_seed([1; 32]),
            consumer: Party::with_seed([2; 32]),
            plan_id: Self::PLAN_ID.to_string(),
        }
    }

    fn config() -> VaultConfig {
        VaultConfig {
            chain: ChainId::new(Self::CHAIN),
            subscription_contract: Self::CONTRACT,
            ..VaultConfig::default()
        }
    }

    /// `[caller == owner, OR, getActiveSubscriptionCount(caller, owner, plan) > 0]`.
    pub fn policy(&self) -> Policy {
        subscription_policy(
            ChainId::new(Self::CHAIN),
            Self::CONTRACT,
            self.owner.address(),
            &self.plan_id,
        )
        .expect("subscription policy is well formed")
    }

    /// Script the consumer's active subscription count.
    pub fn set_subscriptions(&self, count: i128) {
        self.chain.respond(
            &ChainId::new(Self::CHAIN),
            &Self::CONTRACT,
            &MethodSignature::new(SUBSCRIPTION_METHOD),
            self.subscription_params(),
            Value::Number(count),
        );
    }

    /// Answer the consumer's subscription query only after `delay`.
    pub fn delay_subscriptions(&self, delay: Duration, count: i128) {
        self.chain.respond_after(
            &ChainId::new(Self::CHAIN),
            &Self::CONTRACT,
            &MethodSignature::new(SUBSCRIPTION_METHOD),
            self.subscription_params(),
            delay,
            Value::Number(count),
        );
    }

    /// Fail the consumer's subscription query.
    pub fn fail_subscriptions(&self, error: QueryError) {
        self.chain.fail(
            &ChainId::new(Self::CHAIN),
            &Self::CONTRACT,
            &MethodSignature::new(SUBSCRIPTION_METHOD),
            self.subscription_params(),
            error,
        );
    }

    fn subscription_params(&self) -> Vec<Value> {
        vec![
            Value::Address(self.consumer.address()),
            Value::Address(self.owner.address()),
            Value::from(self.plan_id.as_str()),
        ]
    }
}

impl Default for ScenarioFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygate_core::Ed25519Verifier;

    #[test]
    fn test_multi_party() {
        let parties = multi_party(3);

        let addresses: Vec<_> = parties.iter().map(|p| p.address()).collect();
        assert_ne!(addresses[0], addresses[1]);
        assert_ne!(addresses[1], addresses[2]);
        assert_ne!(addresses[0], addresses[2]);
    }

    #[test]
    fn test_party_assertion_verifies() {
        let party = Party::new();
        party.assertion().verify(&Ed25519Verifier).unwrap();
    }

    #[tokio::test]
    async fn test_scenario_scripting() {
        let fixture = ScenarioFixture::new();
        fixture.set_subscriptions(2);

        let artifact = fixture
            .vault
            .seal(
                b"x",
                fixture.policy(),
                &fixture.owner.keypair,
                fixture.owner.address(),
            )
            .await
            .unwrap();
        let opened = fixture
            .vault
            .open(
                &artifact.id(),
                &fixture.consumer.keypair,
                fixture.consumer.address(),
            )
            .await
            .unwrap();
        assert_eq!(opened.as_slice(), b"x");
        assert_eq!(fixture.chain.call_count(), 1);
    }
}

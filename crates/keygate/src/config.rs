//! Vault configuration.
//!
//! Library code never reads the environment; callers build a
//! [`VaultConfig`] themselves. The demo binary fills one from `KEYGATE_*`
//! variables.

use std::time::Duration;

use keygate_core::{Address, ChainId};
use keygate_policy::EvaluatorConfig;

/// Chain the demo scenario runs against when none is configured.
pub const DEFAULT_CHAIN: &str = "mumbai";

/// Default upper bound on a single contract call.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the Vault.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Chain that subscription conditions are evaluated on.
    pub chain: ChainId,
    /// Contract answering `getActiveSubscriptionCount`.
    pub subscription_contract: Address,
    /// RPC endpoint for a real chain-query backend. Informational: the
    /// Vault itself only talks to the `ChainQuery` it is given.
    pub rpc_url: Option<String>,
    /// Condition evaluation settings.
    pub evaluator: EvaluatorConfig,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            chain: ChainId::new(DEFAULT_CHAIN),
            subscription_contract: Address::ZERO,
            rpc_url: None,
            evaluator: EvaluatorConfig {
                query_timeout: Some(DEFAULT_QUERY_TIMEOUT),
            },
        }
    }
}

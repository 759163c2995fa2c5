//! Chain-query abstraction for contract conditions.
//!
//! The evaluator never talks to an RPC endpoint itself. It issues read-only
//! calls through [`ChainQuery`]; implementations may use JSON-RPC, an
//! indexer, or a cache. Every failure is reported as a [`QueryError`] and
//! becomes "could not determine" upstream, never "denied".

use std::sync::Arc;

use async_trait::async_trait;
use keygate_core::{Address, ChainId, MethodSignature, Value};
use thiserror::Error;

/// Why a chain call produced no answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("chain call timed out")]
    Timeout,

    #[error("chain call cancelled")]
    Cancelled,

    #[error("transport error: {0}")]
    Transport(String),

    /// The node refused the call (revert, unknown contract, bad ABI).
    #[error("call rejected: {0}")]
    Rejected(String),
}

/// Read-only access to contract state.
///
/// Implementations must be thread-safe (Send + Sync). Timeouts are the
/// implementation's responsibility; the evaluator may add its own.
#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// Call `method` on `contract` with fully resolved parameters.
    async fn call(
        &self,
        chain: &ChainId,
        contract: &Address,
        method: &MethodSignature,
        params: &[Value],
    ) -> Result<Value, QueryError>;
}

#[async_trait]
impl<T: ChainQuery + ?Sized> ChainQuery for Arc<T> {
    async fn call(
        &self,
        chain: &ChainId,
        contract: &Address,
        method: &MethodSignature,
        params: &[Value],
    ) -> Result<Value, QueryError> {
        (**self).call(chain, contract, method, params).await
    }
}

/// A scriptable in-memory chain for tests and demos.
///
/// Responses are keyed by chain, contract, method name and parameters.
/// Unscripted calls fail with a transport error.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::RwLock;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct CallKey {
        chain: ChainId,
        contract: Address,
        method: String,
        params: Vec<Value>,
    }

    #[derive(Debug, Clone)]
    enum Scripted {
        Value(Value),
        Delayed(Duration, Value),
        Fail(QueryError),
    }

    /// In-memory [`ChainQuery`] implementation.
    #[derive(Default)]
    pub struct MemoryChain {
        responses: RwLock<HashMap<CallKey, Scripted>>,
        calls: AtomicUsize,
    }

    impl MemoryChain {
        /// Create a chain with no scripted responses.
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Answer matching calls with `value`.
        pub fn respond(
            &self,
            chain: &ChainId,
            contract: &Address,
            method: &MethodSignature,
            params: Vec<Value>,
            value: Value,
        ) {
            self.script(chain, contract, method, params, Scripted::Value(value));
        }

        /// Answer matching calls with `value` after `delay`.
        pub fn respond_after(
            &self,
            chain: &ChainId,
            contract: &Address,
            method: &MethodSignature,
            params: Vec<Value>,
            delay: Duration,
            value: Value,
        ) {
            self.script(chain, contract, method, params, Scripted::Delayed(delay, value));
        }

        /// Fail matching calls with `error`.
        pub fn fail(
            &self,
            chain: &ChainId,
            contract: &Address,
            method: &MethodSignature,
            params: Vec<Value>,
            error: QueryError,
        ) {
            self.script(chain, contract, method, params, Scripted::Fail(error));
        }

        /// Total number of calls received so far.
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn script(
            &self,
            chain: &ChainId,
            contract: &Address,
            method: &MethodSignature,
            params: Vec<Value>,
            response: Scripted,
        ) {
            let key = CallKey {
                chain: chain.clone(),
                contract: *contract,
                method: method.name().to_string(),
                params,
            };
            let mut responses = self.responses.write().unwrap_or_else(|e| e.into_inner());
            responses.insert(key, response);
        }
    }

    #[async_trait]
    impl ChainQuery for MemoryChain {
        async fn call(
            &self,
            chain: &ChainId,
            contract: &Address,
            method: &MethodSignature,
            params: &[Value],
        ) -> Result<Value, QueryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let key = CallKey {
                chain: chain.clone(),
                contract: *contract,
                method: method.name().to_string(),
                params: params.to_vec(),
            };
            let scripted = {
                let responses = self.responses.read().unwrap_or_else(|e| e.into_inner());
                responses.get(&key).cloned()
            };

            match scripted {
                Some(Scripted::Value(value)) => Ok(value),
                Some(Scripted::Delayed(delay, value)) => {
                    tokio::time::sleep(delay).await;
                    Ok(value)
                }
                Some(Scripted::Fail(error)) => Err(error),
                None => Err(QueryError::Transport(format!(
                    "no response scripted for {}.{} on {}",
                    contract,
                    method.name(),
                    chain
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryChain;
    use super::*;

    #[tokio::test]
    async fn test_memory_chain_scripted_response() {
        let chain = MemoryChain::new();
        let id = ChainId::new("mumbai");
        let contract = Address::from_bytes([9; 32]);
        let method = MethodSignature::new("balanceOf(address)");
        let params = vec![Value::Address(Address::from_bytes([1; 32]))];

        chain.respond(&id, &contract, &method, params.clone(), Value::Number(5));

        // Lookup is by method name, so a bare name matches the full signature.
        let bare = MethodSignature::new("balanceOf");
        let value = chain.call(&id, &contract, &bare, &params).await.unwrap();
        assert_eq!(value, Value::Number(5));
        assert_eq!(chain.call_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_chain_unscripted_is_transport_error() {
        let chain = MemoryChain::new();
        let result = chain
            .call(
                &ChainId::new("mumbai"),
                &Address::ZERO,
                &MethodSignature::new("anything"),
                &[],
            )
            .await;
        assert!(matches!(result, Err(QueryError::Transport(_))));
    }

    #[tokio::test]
    async fn test_memory_chain_scripted_failure() {
        let chain = MemoryChain::new();
        let id = ChainId::new("mumbai");
        let method = MethodSignature::new("m");
        chain.fail(&id, &Address::ZERO, &method, vec![], QueryError::Cancelled);

        let result = chain.call(&id, &Address::ZERO, &method, &[]).await;
        assert_eq!(result, Err(QueryError::Cancelled));
    }
}

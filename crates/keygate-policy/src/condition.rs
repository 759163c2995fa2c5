//! Evaluation of a single condition.

use std::time::Duration;

use keygate_core::{Address, AuthAssertion, Condition, ContractQuery, DirectComparison};
use keygate_core::{IdentityComparator, IdentityField};
use tracing::{trace, warn};

use crate::chain::{ChainQuery, QueryError};
use crate::error::{PolicyError, Result};
use crate::verdict::Verdict;

/// Configuration for condition evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvaluatorConfig {
    /// Upper bound on a single chain call. `None` leaves timeouts to the
    /// chain-query implementation.
    pub query_timeout: Option<Duration>,
}

/// Evaluates atomic conditions for a candidate address.
pub struct ConditionEvaluator<Q> {
    chain: Q,
    config: EvaluatorConfig,
}

impl<Q: ChainQuery> ConditionEvaluator<Q> {
    pub fn new(chain: Q, config: EvaluatorConfig) -> Self {
        Self { chain, config }
    }

    /// The chain-query backend.
    pub fn chain(&self) -> &Q {
        &self.chain
    }

    /// Evaluate `condition` for `candidate`.
    ///
    /// `proof` must have been signed by `candidate`; its signature is the
    /// caller's concern. Chain failures surface as
    /// [`PolicyError::EvaluationUnavailable`], never as `false`.
    pub async fn evaluate(
        &self,
        condition: &Condition,
        candidate: &Address,
        proof: &AuthAssertion,
    ) -> Result<bool> {
        self.verdict(condition, candidate, proof).await?.into_result()
    }

    /// Like [`evaluate`](Self::evaluate) but keeps the three-valued outcome.
    pub async fn verdict(
        &self,
        condition: &Condition,
        candidate: &Address,
        proof: &AuthAssertion,
    ) -> Result<Verdict> {
        ensure_speaks_for(proof, candidate)?;
        self.check(condition, candidate).await
    }

    /// Evaluate without the identity check. Callers must have done it.
    pub(crate) async fn check(
        &self,
        condition: &Condition,
        candidate: &Address,
    ) -> Result<Verdict> {
        match condition {
            Condition::DirectComparison(direct) => Ok(compare_identity(direct, candidate).into()),
            Condition::ContractQuery(query) => self.query(query, candidate).await,
            Condition::Operator(op) => Err(PolicyError::MalformedPolicy(format!(
                "operator {:?} is not evaluable",
                op
            ))),
        }
    }

    async fn query(&self, query: &ContractQuery, candidate: &Address) -> Result<Verdict> {
        let params = query.resolve_params(candidate);
        let call = self
            .chain
            .call(&query.chain, &query.contract, &query.method, &params);

        let outcome = match self.config.query_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(QueryError::Timeout)),
            None => call.await,
        };

        let value = match outcome {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    chain = %query.chain,
                    method = query.method.name(),
                    error = %e,
                    "contract condition could not be evaluated"
                );
                return Ok(Verdict::Unavailable(format!("{}: {}", query.method.name(), e)));
            }
        };

        let key = query.result_key.as_deref().unwrap_or("");
        let Some(actual) = value.lookup(key) else {
            trace!(method = query.method.name(), key, "result key missing from call result");
            return Ok(Verdict::Unsatisfied);
        };

        Ok(query.comparator.holds(actual.compare(&query.expected)).into())
    }
}

fn compare_identity(direct: &DirectComparison, candidate: &Address) -> bool {
    let actual = match direct.field {
        IdentityField::CallerAddress => candidate,
    };
    match direct.comparator {
        IdentityComparator::Eq => *actual == direct.expected,
    }
}

pub(crate) fn ensure_speaks_for(proof: &AuthAssertion, candidate: &Address) -> Result<()> {
    if proof.speaks_for(candidate) {
        Ok(())
    } else {
        Err(PolicyError::IdentityMismatch {
            candidate: *candidate,
            signer: proof.signer,
        })
    }
}

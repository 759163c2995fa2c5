//! Evaluation of whole policies.
//!
//! A flat policy is folded strictly left to right:
//!
//! ```text
//! acc = eval(c0)
//! for (op, c) in rest:
//!     acc = acc op eval(c)
//! ```
//!
//! There is no operator precedence and no grouping. `[A, OR, B, AND, C]`
//! is `(A OR B) AND C`, not `A OR (B AND C)`. Callers that need grouping
//! use [`PolicyEvaluator::evaluate_tree`].
//!
//! Conditions are skipped once the running result is fixed (`true` before
//! an OR, `false` before an AND). Skipped conditions are never queried, so
//! they cannot contribute an "unavailable" outcome.

use std::future::Future;
use std::pin::Pin;

use keygate_core::{Address, AuthAssertion, BoolOp, Policy, PolicyTree};
use tracing::trace;

use crate::chain::ChainQuery;
use crate::condition::{ensure_speaks_for, ConditionEvaluator, EvaluatorConfig};
use crate::error::Result;
use crate::verdict::Verdict;

type VerdictFuture<'a> = Pin<Box<dyn Future<Output = Result<Verdict>> + Send + 'a>>;

/// Folds condition results over a policy.
pub struct PolicyEvaluator<Q> {
    conditions: ConditionEvaluator<Q>,
}

impl<Q: ChainQuery> PolicyEvaluator<Q> {
    pub fn new(chain: Q, config: EvaluatorConfig) -> Self {
        Self {
            conditions: ConditionEvaluator::new(chain, config),
        }
    }

    /// The underlying condition evaluator.
    pub fn conditions(&self) -> &ConditionEvaluator<Q> {
        &self.conditions
    }

    /// Evaluate `policy` for `candidate`.
    ///
    /// Fails with `IdentityMismatch` before any condition is evaluated, and
    /// with `EvaluationUnavailable` only when an undeterminable condition
    /// decides the result. `policy` is well formed by construction.
    pub async fn evaluate(
        &self,
        policy: &Policy,
        candidate: &Address,
        proof: &AuthAssertion,
    ) -> Result<bool> {
        self.verdict(policy, candidate, proof).await?.into_result()
    }

    /// Three-valued form of [`evaluate`](Self::evaluate).
    pub async fn verdict(
        &self,
        policy: &Policy,
        candidate: &Address,
        proof: &AuthAssertion,
    ) -> Result<Verdict> {
        ensure_speaks_for(proof, candidate)?;

        let mut acc = self.conditions.check(policy.head(), candidate).await?;
        for (position, (op, condition)) in policy.tail().enumerate() {
            if acc.short_circuits(op) {
                trace!(position = position + 1, ?op, "condition skipped");
                continue;
            }
            let next = self.conditions.check(condition, candidate).await?;
            acc = acc.combine(op, next);
        }
        Ok(acc)
    }

    /// Evaluate a nested policy tree with the same short-circuit rules.
    pub async fn evaluate_tree(
        &self,
        tree: &PolicyTree,
        candidate: &Address,
        proof: &AuthAssertion,
    ) -> Result<bool> {
        tree.validate()?;
        ensure_speaks_for(proof, candidate)?;
        self.tree_verdict(tree, candidate).await?.into_result()
    }

    fn tree_verdict<'a>(
        &'a self,
        tree: &'a PolicyTree,
        candidate: &'a Address,
    ) -> VerdictFuture<'a> {
        Box::pin(async move {
            let (op, children) = match tree {
                PolicyTree::Condition(condition) => {
                    return self.conditions.check(condition, candidate).await
                }
                PolicyTree::All(children) => (BoolOp::And, children),
                PolicyTree::Any(children) => (BoolOp::Or, children),
            };

            let mut iter = children.iter();
            let Some(first) = iter.next() else {
                return Ok(Verdict::Unsatisfied);
            };
            let mut acc = self.tree_verdict(first, candidate).await?;
            for child in iter {
                if acc.short_circuits(op) {
                    break;
                }
                let next = self.tree_verdict(child, candidate).await?;
                acc = acc.combine(op, next);
            }
            Ok(acc)
        })
    }
}

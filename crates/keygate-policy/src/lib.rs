//! # Keygate Policy
//!
//! Evaluates access policies against a candidate address and live chain
//! state.
//!
//! ## Overview
//!
//! - [`ConditionEvaluator`] decides one condition: a direct address
//!   comparison, or a read-only contract call compared against an expected
//!   value.
//! - [`PolicyEvaluator`] folds a flat policy strictly left to right, with
//!   short-circuiting, and evaluates optional nested [`PolicyTree`]s.
//! - [`ChainQuery`] is the seam to the chain; [`memory::MemoryChain`] is a
//!   scriptable in-memory implementation.
//!
//! ## Outcomes
//!
//! Evaluation is three-valued ([`Verdict`]). A chain call that times out,
//! is cancelled, or fails in transport is *unavailable*, not *false*. An
//! unavailable condition surfaces as
//! [`PolicyError::EvaluationUnavailable`] only if it determines the result.
//!
//! [`PolicyTree`]: keygate_core::PolicyTree

pub mod chain;
pub mod condition;
pub mod error;
pub mod evaluator;
pub mod verdict;

pub use chain::{memory, ChainQuery, QueryError};
pub use condition::{ConditionEvaluator, EvaluatorConfig};
pub use error::{PolicyError, Result};
pub use evaluator::PolicyEvaluator;
pub use verdict::Verdict;

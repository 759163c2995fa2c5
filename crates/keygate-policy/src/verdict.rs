//! Three-valued evaluation outcome.
//!
//! A condition backed by a chain call can be satisfied, unsatisfied, or
//! undeterminable. Folding uses Kleene logic so an unavailable condition
//! only matters when it actually decides the result:
//!
//! | lhs         | op  | rhs         | result      |
//! |-------------|-----|-------------|-------------|
//! | unavailable | OR  | satisfied   | satisfied   |
//! | unavailable | OR  | unsatisfied | unavailable |
//! | unavailable | AND | unsatisfied | unsatisfied |
//! | unavailable | AND | satisfied   | unavailable |

use keygate_core::BoolOp;

use crate::error::{PolicyError, Result};

/// Outcome of evaluating a condition or a whole policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Satisfied,
    Unsatisfied,
    /// Could not be determined; carries the first cause.
    Unavailable(String),
}

impl Verdict {
    /// Whether the fold result is already fixed before looking at the rhs.
    pub fn short_circuits(&self, op: BoolOp) -> bool {
        matches!(
            (self, op),
            (Verdict::Satisfied, BoolOp::Or) | (Verdict::Unsatisfied, BoolOp::And)
        )
    }

    /// Combine with the next condition's verdict.
    pub fn combine(self, op: BoolOp, rhs: Verdict) -> Verdict {
        match op {
            BoolOp::Or => match (self, rhs) {
                (Verdict::Satisfied, _) | (_, Verdict::Satisfied) => Verdict::Satisfied,
                (Verdict::Unavailable(cause), _) | (_, Verdict::Unavailable(cause)) => {
                    Verdict::Unavailable(cause)
                }
                (Verdict::Unsatisfied, Verdict::Unsatisfied) => Verdict::Unsatisfied,
            },
            BoolOp::And => match (self, rhs) {
                (Verdict::Unsatisfied, _) | (_, Verdict::Unsatisfied) => Verdict::Unsatisfied,
                (Verdict::Unavailable(cause), _) | (_, Verdict::Unavailable(cause)) => {
                    Verdict::Unavailable(cause)
                }
                (Verdict::Satisfied, Verdict::Satisfied) => Verdict::Satisfied,
            },
        }
    }

    /// Collapse to a boolean, surfacing an undetermined result as an error.
    pub fn into_result(self) -> Result<bool> {
        match self {
            Verdict::Satisfied => Ok(true),
            Verdict::Unsatisfied => Ok(false),
            Verdict::Unavailable(cause) => Err(PolicyError::EvaluationUnavailable(cause)),
        }
    }

    pub fn is_satisfied(&self) -> bool {
        matches!(self, Verdict::Satisfied)
    }
}

impl From<bool> for Verdict {
    fn from(b: bool) -> Self {
        if b {
            Verdict::Satisfied
        } else {
            Verdict::Unsatisfied
        }
    }
}

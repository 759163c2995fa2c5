//! Proptest generators for property-based testing.

use proptest::prelude::*;

use keygate_core::{
    Address, BoolOp, ChainId, Condition, ContractQuery, Keypair, Policy, SymmetricKey,
};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random address.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 32]>().prop_map(Address::from_bytes)
}

/// Generate a random symmetric key.
pub fn symmetric_key() -> impl Strategy<Value = SymmetricKey> {
    any::<[u8; 32]>().prop_map(SymmetricKey::from_bytes)
}

/// Generate payload bytes of at most `max_len`.
pub fn plaintext(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a boolean operator.
pub fn bool_op() -> impl Strategy<Value = BoolOp> {
    prop_oneof![Just(BoolOp::And), Just(BoolOp::Or)]
}

/// How a generated condition evaluates for the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    True,
    False,
    /// Backed by a chain call that fails.
    Unavailable,
}

impl Outcome {
    /// Kleene value: `None` is undetermined.
    pub fn value(self) -> Option<bool> {
        match self {
            Outcome::True => Some(true),
            Outcome::False => Some(false),
            Outcome::Unavailable => None,
        }
    }
}

/// Parameters for a flat policy with known per-condition outcomes.
#[derive(Debug, Clone)]
pub struct PolicyParams {
    pub first: Outcome,
    pub rest: Vec<(BoolOp, Outcome)>,
}

impl PolicyParams {
    /// Number of evaluable conditions.
    pub fn condition_count(&self) -> usize {
        self.rest.len() + 1
    }

    /// Left fold in three-valued logic, without short-circuiting.
    pub fn expected(&self) -> Option<bool> {
        self.rest
            .iter()
            .fold(self.first.value(), |acc, (op, outcome)| {
                let rhs = outcome.value();
                match op {
                    BoolOp::Or => match (acc, rhs) {
                        (Some(true), _) | (_, Some(true)) => Some(true),
                        (Some(false), Some(false)) => Some(false),
                        _ => None,
                    },
                    BoolOp::And => match (acc, rhs) {
                        (Some(false), _) | (_, Some(false)) => Some(false),
                        (Some(true), Some(true)) => Some(true),
                        _ => None,
                    },
                }
            })
    }

    /// Whether any condition is backed by a chain call.
    pub fn has_unavailable(&self) -> bool {
        self.first == Outcome::Unavailable
            || self.rest.iter().any(|(_, o)| *o == Outcome::Unavailable)
    }
}

fn outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        3 => Just(Outcome::True),
        3 => Just(Outcome::False),
        1 => Just(Outcome::Unavailable),
    ]
}

impl Arbitrary for PolicyParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (outcome(), prop::collection::vec((bool_op(), outcome()), 0..6))
            .prop_map(|(first, rest)| PolicyParams { first, rest })
            .boxed()
    }
}

/// Address that never matches a generated candidate.
pub const STRANGER: Address = Address::from_bytes([0xee; 32]);

/// Contract targeted by generated unavailable conditions. Nothing is ever
/// scripted for it, so every call fails in transport.
pub const UNREACHABLE_CONTRACT: Address = Address::from_bytes([0xdd; 32]);

/// Build the policy described by `params` for `candidate`.
///
/// True and false outcomes become direct address comparisons; unavailable
/// outcomes become contract queries against [`UNREACHABLE_CONTRACT`].
pub fn policy_from_params(params: &PolicyParams, candidate: Address) -> Policy {
    let condition = |outcome: Outcome| match outcome {
        Outcome::True => Condition::caller_is(candidate),
        Outcome::False => Condition::caller_is(STRANGER),
        Outcome::Unavailable => {
            ContractQuery::new(ChainId::new("test"), UNREACHABLE_CONTRACT, "unreachable")
                .caller_param()
                .into()
        }
    };

    let mut conditions = vec![condition(params.first)];
    for (op, outcome) in &params.rest {
        conditions.push(Condition::Operator(*op));
        conditions.push(condition(*outcome));
    }
    Policy::new(conditions).expect("generated policies alternate")
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_generated_policies_are_valid(
            params in any::<PolicyParams>(),
            candidate in address(),
        ) {
            let policy = policy_from_params(&params, candidate);
            prop_assert_eq!(policy.len(), params.condition_count());
            prop_assert!(policy.validate().is_ok());
        }

        #[test]
        fn test_policy_digest_deterministic(
            params in any::<PolicyParams>(),
            candidate in address(),
        ) {
            let a = policy_from_params(&params, candidate);
            let b = policy_from_params(&params, candidate);
            prop_assert_eq!(a.digest().unwrap(), b.digest().unwrap());
        }
    }

    #[test]
    fn test_expected_has_no_precedence() {
        // (T OR F) AND F
        let params = PolicyParams {
            first: Outcome::True,
            rest: vec![(BoolOp::Or, Outcome::False), (BoolOp::And, Outcome::False)],
        };
        assert_eq!(params.expected(), Some(false));
    }

    #[test]
    fn test_expected_kleene() {
        let rescued = PolicyParams {
            first: Outcome::Unavailable,
            rest: vec![(BoolOp::Or, Outcome::True)],
        };
        assert_eq!(rescued.expected(), Some(true));

        let decided = PolicyParams {
            first: Outcome::Unavailable,
            rest: vec![(BoolOp::And, Outcome::True)],
        };
        assert_eq!(decided.expected(), None);
    }
}

//! Access policy model.
//!
//! A [`Policy`] is a flat, ordered list in which evaluable conditions and
//! boolean operators strictly alternate:
//!
//! ```text
//! [ cond, op, cond, op, cond ]
//! ```
//!
//! Evaluation is a strict left-to-right fold with no precedence, so
//! `[A, OR, B, AND, C]` means `(A OR B) AND C`. There is no grouping in the
//! flat form. [`PolicyTree`] is an optional nested representation for
//! callers that need it; every flat policy converts to an equivalent tree.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::canonical;
use crate::error::{CoreError, Result};
use crate::types::{Address, ChainId, MethodSignature};
use crate::value::Value;

const POLICY_DIGEST_CONTEXT: &str = "keygate-core-v0-policy";

/// Identity attribute a direct comparison reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityField {
    /// The address that signed the presented assertion.
    CallerAddress,
}

/// Comparator for direct identity comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityComparator {
    Eq,
}

/// Comparator applied to a contract call result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl Comparator {
    /// Whether this comparator needs an ordering rather than equality.
    pub fn is_ordering(&self) -> bool {
        !matches!(self, Comparator::Eq)
    }

    /// Apply to the result of `actual.compare(expected)`.
    ///
    /// Incomparable values never satisfy any comparator.
    pub fn holds(&self, ordering: Option<Ordering>) -> bool {
        match (self, ordering) {
            (_, None) => false,
            (Comparator::Eq, Some(o)) => o == Ordering::Equal,
            (Comparator::Gt, Some(o)) => o == Ordering::Greater,
            (Comparator::Lt, Some(o)) => o == Ordering::Less,
            (Comparator::Gte, Some(o)) => o != Ordering::Less,
            (Comparator::Lte, Some(o)) => o != Ordering::Greater,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Comparator::Eq => "=",
            Comparator::Gt => ">",
            Comparator::Lt => "<",
            Comparator::Gte => ">=",
            Comparator::Lte => "<=",
        };
        f.write_str(symbol)
    }
}

/// Boolean operator joining two conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOp {
    And,
    Or,
}

/// A contract call parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Param {
    /// Replaced by the candidate address at evaluation time.
    Caller,
    Literal(Value),
}

impl Param {
    /// Resolve against a candidate address.
    pub fn resolve(&self, caller: &Address) -> Value {
        match self {
            Param::Caller => Value::Address(*caller),
            Param::Literal(v) => v.clone(),
        }
    }
}

impl From<Value> for Param {
    fn from(v: Value) -> Self {
        Param::Literal(v)
    }
}

impl From<Address> for Param {
    fn from(a: Address) -> Self {
        Param::Literal(Value::Address(a))
    }
}

impl From<u32> for Param {
    fn from(n: u32) -> Self {
        Param::Literal(Value::from(n))
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::Literal(Value::from(s))
    }
}

/// Compare the caller's own address against a fixed address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectComparison {
    pub field: IdentityField,
    pub comparator: IdentityComparator,
    pub expected: Address,
}

/// Call a read-only contract method and compare its result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractQuery {
    pub chain: ChainId,
    pub contract: Address,
    pub method: MethodSignature,
    pub params: Vec<Param>,
    pub comparator: Comparator,
    pub expected: Value,
    /// Dotted path into a structured result. `None` or empty uses the raw result.
    #[serde(default)]
    pub result_key: Option<String>,
}

impl ContractQuery {
    /// Start a query; defaults to `result > 0`.
    pub fn new(chain: ChainId, contract: Address, method: impl Into<MethodSignature>) -> Self {
        Self {
            chain,
            contract,
            method: method.into(),
            params: Vec::new(),
            comparator: Comparator::Gt,
            expected: Value::Number(0),
            result_key: None,
        }
    }

    pub fn param(mut self, param: impl Into<Param>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Append the caller placeholder.
    pub fn caller_param(mut self) -> Self {
        self.params.push(Param::Caller);
        self
    }

    pub fn expect(mut self, comparator: Comparator, expected: impl Into<Value>) -> Self {
        self.comparator = comparator;
        self.expected = expected.into();
        self
    }

    pub fn result_key(mut self, key: impl Into<String>) -> Self {
        self.result_key = Some(key.into());
        self
    }

    /// Parameters with the caller placeholder substituted.
    pub fn resolve_params(&self, caller: &Address) -> Vec<Value> {
        self.params.iter().map(|p| p.resolve(caller)).collect()
    }

    fn validate(&self) -> Result<()> {
        if self.chain.as_str().is_empty() {
            return Err(CoreError::MalformedPolicy("contract query has empty chain".into()));
        }
        if self.method.name().is_empty() {
            return Err(CoreError::MalformedPolicy("contract query has empty method".into()));
        }
        if self.comparator.is_ordering() && !self.expected.is_numeric() {
            return Err(CoreError::MalformedPolicy(format!(
                "comparator {} needs a numeric expected value, got {}",
                self.comparator, self.expected
            )));
        }
        Ok(())
    }
}

/// One node of a flat policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    DirectComparison(DirectComparison),
    ContractQuery(ContractQuery),
    /// Separator between two evaluable conditions. Not evaluable itself.
    Operator(BoolOp),
}

impl Condition {
    /// `caller == address`.
    pub fn caller_is(address: Address) -> Self {
        Condition::DirectComparison(DirectComparison {
            field: IdentityField::CallerAddress,
            comparator: IdentityComparator::Eq,
            expected: address,
        })
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, Condition::Operator(_))
    }

    fn validate(&self) -> Result<()> {
        match self {
            Condition::ContractQuery(q) => q.validate(),
            Condition::DirectComparison(_) | Condition::Operator(_) => Ok(()),
        }
    }
}

impl From<ContractQuery> for Condition {
    fn from(q: ContractQuery) -> Self {
        Condition::ContractQuery(q)
    }
}

impl From<DirectComparison> for Condition {
    fn from(d: DirectComparison) -> Self {
        Condition::DirectComparison(d)
    }
}

/// Blake3 digest of a policy's canonical encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyDigest(pub [u8; 32]);

impl PolicyDigest {
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for PolicyDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PolicyDigest({})", &self.to_hex()[..16])
    }
}

/// An immutable, validated flat policy.
///
/// Every constructor validates, decoding included, so a `Policy` value
/// always alternates and is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Condition>", into = "Vec<Condition>")]
pub struct Policy {
    conditions: Vec<Condition>,
}

impl Policy {
    /// Build from a raw alternating sequence, validating it.
    pub fn new(conditions: Vec<Condition>) -> Result<Self> {
        let policy = Self { conditions };
        policy.validate()?;
        Ok(policy)
    }

    /// A policy with a single condition.
    pub fn single(condition: Condition) -> Result<Self> {
        Self::new(vec![condition])
    }

    /// Check the alternation invariant and each condition's own shape.
    pub fn validate(&self) -> Result<()> {
        let len = self.conditions.len();
        if len == 0 {
            return Err(CoreError::MalformedPolicy("policy is empty".into()));
        }
        if len % 2 == 0 {
            return Err(CoreError::MalformedPolicy(format!(
                "policy length must be odd, got {len}"
            )));
        }
        for (i, condition) in self.conditions.iter().enumerate() {
            let expect_operator = i % 2 == 1;
            if condition.is_operator() != expect_operator {
                return Err(CoreError::MalformedPolicy(if expect_operator {
                    format!("expected operator at position {i}")
                } else {
                    format!("expected condition at position {i}")
                }));
            }
            condition.validate()?;
        }
        Ok(())
    }

    /// The raw alternating sequence.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// The first evaluable condition.
    pub fn head(&self) -> &Condition {
        &self.conditions[0]
    }

    /// `(operator, condition)` pairs after the head.
    pub fn tail(&self) -> impl Iterator<Item = (BoolOp, &Condition)> + '_ {
        self.conditions[1..].chunks(2).filter_map(|pair| match pair {
            [Condition::Operator(op), condition] => Some((*op, condition)),
            _ => None,
        })
    }

    /// Number of evaluable conditions.
    pub fn len(&self) -> usize {
        self.conditions.len().div_ceil(2)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Digest used to bind wrapped keys to this policy.
    pub fn digest(&self) -> Result<PolicyDigest> {
        let bytes = canonical::to_cbor(self)?;
        let mut hasher = blake3::Hasher::new_derive_key(POLICY_DIGEST_CONTEXT);
        hasher.update(&bytes);
        Ok(PolicyDigest(*hasher.finalize().as_bytes()))
    }

    /// Convert to the equivalent left-nested tree.
    pub fn to_tree(&self) -> PolicyTree {
        let mut tree = PolicyTree::Condition(self.head().clone());
        for (op, condition) in self.tail() {
            let leaf = PolicyTree::Condition(condition.clone());
            tree = match (op, tree) {
                (BoolOp::And, PolicyTree::All(mut children)) => {
                    children.push(leaf);
                    PolicyTree::All(children)
                }
                (BoolOp::Or, PolicyTree::Any(mut children)) => {
                    children.push(leaf);
                    PolicyTree::Any(children)
                }
                (BoolOp::And, other) => PolicyTree::All(vec![other, leaf]),
                (BoolOp::Or, other) => PolicyTree::Any(vec![other, leaf]),
            };
        }
        tree
    }

    /// Parse a JSON policy document.
    pub fn from_json(json: &str) -> Result<Self> {
        let conditions: Vec<Condition> =
            serde_json::from_str(json).map_err(|e| CoreError::Decoding(e.to_string()))?;
        Self::new(conditions)
    }

    /// Render as a JSON policy document.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::Encoding(e.to_string()))
    }
}

impl TryFrom<Vec<Condition>> for Policy {
    type Error = CoreError;

    fn try_from(conditions: Vec<Condition>) -> Result<Self> {
        Self::new(conditions)
    }
}

impl From<Policy> for Vec<Condition> {
    fn from(policy: Policy) -> Self {
        policy.conditions
    }
}

/// Builder that keeps conditions and operators alternating.
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    conditions: Vec<Condition>,
}

impl PolicyBuilder {
    /// Start with the first condition.
    pub fn new(first: impl Into<Condition>) -> Self {
        Self {
            conditions: vec![first.into()],
        }
    }

    pub fn or(self, next: impl Into<Condition>) -> Self {
        self.push(BoolOp::Or, next.into())
    }

    pub fn and(self, next: impl Into<Condition>) -> Self {
        self.push(BoolOp::And, next.into())
    }

    fn push(mut self, op: BoolOp, next: Condition) -> Self {
        self.conditions.push(Condition::Operator(op));
        self.conditions.push(next);
        self
    }

    /// Finish and validate.
    pub fn build(self) -> Result<Policy> {
        Policy::new(self.conditions)
    }
}

/// Nested policy form. A superset of the flat form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyTree {
    /// An evaluable leaf; operators are not allowed here.
    Condition(Condition),
    /// Satisfied when every child is.
    All(Vec<PolicyTree>),
    /// Satisfied when any child is.
    Any(Vec<PolicyTree>),
}

impl PolicyTree {
    pub fn validate(&self) -> Result<()> {
        match self {
            PolicyTree::Condition(Condition::Operator(_)) => Err(CoreError::MalformedPolicy(
                "operator used as a tree leaf".into(),
            )),
            PolicyTree::Condition(c) => c.validate(),
            PolicyTree::All(children) | PolicyTree::Any(children) => {
                if children.is_empty() {
                    return Err(CoreError::MalformedPolicy("empty group in policy tree".into()));
                }
                children.iter().try_for_each(PolicyTree::validate)
            }
        }
    }
}

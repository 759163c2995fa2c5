//! Ready-made policies.

use keygate_core::{
    Address, ChainId, Comparator, Condition, ContractQuery, Policy, PolicyBuilder, Result, Value,
};

/// Subscription-count method queried by [`subscription_policy`].
pub const SUBSCRIPTION_METHOD: &str = "getActiveSubscriptionCount(address,address,uint32)";

/// The owner, or anyone with an active subscription to `plan_id`.
///
/// Evaluates as `caller == owner OR
/// getActiveSubscriptionCount(caller, owner, plan_id) > 0`. The owner
/// short-circuits the contract call.
pub fn subscription_policy(
    chain: ChainId,
    contract: Address,
    owner: Address,
    plan_id: &str,
) -> Result<Policy> {
    PolicyBuilder::new(Condition::caller_is(owner))
        .or(subscriber_condition(chain, contract, owner, plan_id))
        .build()
}

/// `getActiveSubscriptionCount(caller, owner, plan_id) > 0`.
pub fn subscriber_condition(
    chain: ChainId,
    contract: Address,
    owner: Address,
    plan_id: &str,
) -> Condition {
    ContractQuery::new(chain, contract, SUBSCRIPTION_METHOD)
        .caller_param()
        .param(owner)
        .param(Value::from(plan_id))
        .expect(Comparator::Gt, 0u32)
        .into()
}

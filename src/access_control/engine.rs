//! Decision engine
//!
//! Deny by default, allow on the first rule that matches both resource and
//! operation. There is no deny rule: grants are purely additive, so adding a
//! rule can never turn an allow into a deny.

use crate::access_control::types::{Decision, EffectiveRules, NO_MATCHING_RULE};
use crate::request::ClassifiedRequest;
use tracing::trace;

/// Decide a classified request against an effective rule set.
///
/// Pure: no I/O, no mutation. Roles whose scope does not reach the request's
/// namespace never contribute, even if the caller did not filter them out.
pub fn authorize(effective: &EffectiveRules, request: &ClassifiedRequest) -> Decision {
    for (role, rule) in effective.grants() {
        if !role.applies_to(&request.namespace) {
            continue;
        }
        if rule.matches(&request.resource, &request.subresource, &request.verb) {
            trace!(role = %role.name, rule = %rule, "Rule matched");
            return Decision::granted_by(role, rule);
        }
    }
    Decision::deny(NO_MATCHING_RULE)
}

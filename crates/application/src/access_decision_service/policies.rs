use std::collections::BTreeMap;

use tracing::debug;
use veridex_core::{AppResult, TenantId};
use veridex_domain::{AttributeValue, PolicyDecision};

use super::AccessDecisionService;

impl AccessDecisionService {
    /// Evaluates the tenant's policy set against an attribute map.
    ///
    /// The first policy whose rules all match determines the result.
    /// Policies evaluate by priority descending; within one priority the
    /// adapter's insertion order is preserved by a stable sort here, so
    /// the tie-break does not depend on adapter behavior.
    pub async fn evaluate_policies(
        &self,
        tenant_id: TenantId,
        attributes: &BTreeMap<String, AttributeValue>,
    ) -> AppResult<PolicyDecision> {
        let mut policies = self.policy_repository.list_active_policies(tenant_id).await?;
        policies.retain(|policy| policy.is_active());
        policies.sort_by(|left, right| right.priority().cmp(&left.priority()));

        for policy in &policies {
            if policy.matches(attributes) {
                debug!(
                    tenant_id = %tenant_id,
                    policy = policy.name().as_str(),
                    effect = policy.effect().as_str(),
                    "policy matched"
                );
                return Ok(PolicyDecision::from(policy.effect()));
            }
        }

        Ok(PolicyDecision::NoMatch)
    }
}

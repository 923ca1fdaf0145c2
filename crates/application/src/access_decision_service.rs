//! The combined access-decision algorithm.
//!
//! Four authorization models contribute to one verdict under a fixed
//! precedence: policy effects are tenant-wide governance and override
//! everything (a deny absolutely, an allow for attribute-only checks),
//! role grants cover the common case, and ACL entries are the most
//! specific per-resource override, checked last.
//!
//! Every decision is a fresh sequence of read-only lookups; the service
//! holds no mutable state and offers no snapshot isolation across its
//! reads. Two decisions made microseconds apart may differ under
//! concurrent administrative edits. That is an accepted trade-off, and
//! the test suite pins it rather than papering over it.

mod acl;
mod policies;
mod rbac;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;
use veridex_core::{AppResult, TenantId};
use veridex_domain::{AttributeValue, PermissionCode, PolicyDecision, RoleId, UserId};

use crate::{AclRepository, AttributeRepository, PolicyRepository, RoleRepository};

/// How ACL lookups treat entries when the caller names no resource
/// instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnscopedAclMatching {
    /// An instance-less check matches entries regardless of their own
    /// resource instance: a standing grant for the resource type. The
    /// default, and the reading existing entry data assumes.
    #[default]
    AnyInstance,
    /// An instance-less check matches only entries created without a
    /// resource instance.
    UnscopedEntriesOnly,
}

/// Engine configuration, passed to the constructor.
#[derive(Debug, Clone, Default)]
pub struct AccessDecisionConfig {
    /// Matching rule for instance-less ACL checks.
    pub unscoped_acl_matching: UnscopedAclMatching,
}

/// One access check: principal, tenant, and the requested capability or
/// resource context.
#[derive(Debug, Clone)]
pub struct AccessRequest {
    /// Principal the decision is made for.
    pub user_id: UserId,
    /// Tenant scope of the decision.
    pub tenant_id: TenantId,
    /// Principal's role identifiers, already resolved by the caller.
    pub role_ids: Vec<RoleId>,
    /// Caller-supplied attribute overrides, merged over resolved values.
    pub attributes: BTreeMap<String, AttributeValue>,
    /// Permission code to check through RBAC, when the caller needs one.
    pub permission_code: Option<PermissionCode>,
    /// Resource type for ACL checks.
    pub resource_type: Option<String>,
    /// Resource instance for ACL checks.
    pub resource_id: Option<String>,
    /// Action name for ACL checks.
    pub action: Option<String>,
}

/// Application service producing allow/deny verdicts.
#[derive(Clone)]
pub struct AccessDecisionService {
    config: AccessDecisionConfig,
    attribute_repository: Arc<dyn AttributeRepository>,
    role_repository: Arc<dyn RoleRepository>,
    policy_repository: Arc<dyn PolicyRepository>,
    acl_repository: Arc<dyn AclRepository>,
}

impl AccessDecisionService {
    /// Creates a new access-decision service from repository
    /// implementations.
    #[must_use]
    pub fn new(
        config: AccessDecisionConfig,
        attribute_repository: Arc<dyn AttributeRepository>,
        role_repository: Arc<dyn RoleRepository>,
        policy_repository: Arc<dyn PolicyRepository>,
        acl_repository: Arc<dyn AclRepository>,
    ) -> Self {
        Self {
            config,
            attribute_repository,
            role_repository,
            policy_repository,
            acl_repository,
        }
    }

    /// Produces the combined verdict for one request.
    ///
    /// Precedence, not configurable:
    /// 1. a fully matching deny policy refuses outright;
    /// 2. a fully matching allow policy grants attribute-only checks
    ///    (no permission code requested);
    /// 3. an RBAC grant for the requested permission code grants;
    /// 4. an ACL entry for the user, or any of the caller's roles,
    ///    grants resource-scoped requests;
    /// 5. otherwise the default is deny.
    ///
    /// "Not granted" is always a `false` verdict; `Err` means the
    /// decision itself failed and must be treated as a non-grant by the
    /// caller.
    pub async fn can_access(&self, request: &AccessRequest) -> AppResult<bool> {
        let attributes = self.merged_attributes(request).await?;

        match self
            .evaluate_policies(request.tenant_id, &attributes)
            .await?
        {
            PolicyDecision::Deny => {
                debug!(
                    user_id = %request.user_id,
                    tenant_id = %request.tenant_id,
                    "access denied by policy"
                );
                return Ok(false);
            }
            PolicyDecision::Allow if request.permission_code.is_none() => {
                debug!(
                    user_id = %request.user_id,
                    tenant_id = %request.tenant_id,
                    "access granted by policy"
                );
                return Ok(true);
            }
            PolicyDecision::Allow | PolicyDecision::NoMatch => {}
        }

        if let Some(permission_code) = &request.permission_code
            && self
                .has_permission(request.user_id, request.tenant_id, permission_code)
                .await?
        {
            debug!(
                user_id = %request.user_id,
                tenant_id = %request.tenant_id,
                permission = %permission_code,
                "access granted by role"
            );
            return Ok(true);
        }

        if self.resource_grant(request).await? {
            debug!(
                user_id = %request.user_id,
                tenant_id = %request.tenant_id,
                "access granted by acl entry"
            );
            return Ok(true);
        }

        Ok(false)
    }

    /// Returns the attribute values currently assigned to a principal.
    pub async fn resolve_attributes(
        &self,
        user_id: UserId,
    ) -> AppResult<BTreeMap<String, AttributeValue>> {
        self.attribute_repository.list_attribute_values(user_id).await
    }

    async fn merged_attributes(
        &self,
        request: &AccessRequest,
    ) -> AppResult<BTreeMap<String, AttributeValue>> {
        let mut attributes = self.resolve_attributes(request.user_id).await?;
        for (name, value) in &request.attributes {
            attributes.insert(name.clone(), value.clone());
        }

        Ok(attributes)
    }
}

use veridex_core::{AppResult, TenantId};
use veridex_domain::{AclResourceScope, AclSubject};

use super::{AccessDecisionService, AccessRequest, UnscopedAclMatching};

impl AccessDecisionService {
    /// Returns whether an explicit entry grants the subject the
    /// permission on the resource type within the given scope.
    pub async fn has_acl_entry(
        &self,
        subject: &AclSubject,
        tenant_id: TenantId,
        resource_type: &str,
        scope: &AclResourceScope,
        permission: &str,
    ) -> AppResult<bool> {
        let entry = self
            .acl_repository
            .find_entry(subject, tenant_id, resource_type, scope, permission)
            .await?;

        Ok(entry.is_some())
    }

    /// Runs the ACL stage of `can_access`: the user subject first, then
    /// each caller role, OR semantics.
    ///
    /// The stage applies only when the request names a resource type and
    /// either a resource instance or an action. The entry permission is
    /// the request action when present, else the requested permission
    /// code; with neither the stage cannot run.
    pub(super) async fn resource_grant(&self, request: &AccessRequest) -> AppResult<bool> {
        let Some(resource_type) = request.resource_type.as_deref() else {
            return Ok(false);
        };
        if request.resource_id.is_none() && request.action.is_none() {
            return Ok(false);
        }

        let Some(permission) = request
            .action
            .as_deref()
            .or_else(|| request.permission_code.as_ref().map(|code| code.as_str()))
        else {
            return Ok(false);
        };

        let scope = match (&request.resource_id, self.config.unscoped_acl_matching) {
            (Some(resource_id), _) => AclResourceScope::Instance(resource_id.clone()),
            (None, UnscopedAclMatching::AnyInstance) => AclResourceScope::Any,
            (None, UnscopedAclMatching::UnscopedEntriesOnly) => AclResourceScope::UnscopedOnly,
        };

        let user_subject = AclSubject::User(request.user_id);
        if self
            .has_acl_entry(
                &user_subject,
                request.tenant_id,
                resource_type,
                &scope,
                permission,
            )
            .await?
        {
            return Ok(true);
        }

        for role_id in &request.role_ids {
            let role_subject = AclSubject::Role(*role_id);
            if self
                .has_acl_entry(
                    &role_subject,
                    request.tenant_id,
                    resource_type,
                    &scope,
                    permission,
                )
                .await?
            {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

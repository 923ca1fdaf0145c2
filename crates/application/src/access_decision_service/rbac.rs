use chrono::Utc;
use veridex_core::{AppResult, TenantId};
use veridex_domain::{PermissionCode, UserId};

use super::AccessDecisionService;

impl AccessDecisionService {
    /// Returns whether the principal holds the permission through any
    /// currently valid role assignment in the tenant.
    ///
    /// An assignment whose expiry has passed confers nothing, even while
    /// the role itself still grants the permission to other holders.
    pub async fn has_permission(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
        permission_code: &PermissionCode,
    ) -> AppResult<bool> {
        let assignments = self
            .role_repository
            .list_active_role_assignments(user_id, tenant_id)
            .await?;
        let now = Utc::now();

        for assignment in assignments {
            if assignment.expires_at.is_some_and(|expires_at| expires_at <= now) {
                continue;
            }

            let permissions = self
                .role_repository
                .list_active_permissions(assignment.role_id)
                .await?;
            if permissions.contains(permission_code) {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Returns whether the principal holds any of the permission codes.
    /// Route guards use this for "one of several capabilities" checks.
    pub async fn has_any_permission(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
        permission_codes: &[PermissionCode],
    ) -> AppResult<bool> {
        for permission_code in permission_codes {
            if self.has_permission(user_id, tenant_id, permission_code).await? {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

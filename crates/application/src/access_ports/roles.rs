use async_trait::async_trait;
use chrono::{DateTime, Utc};
use veridex_core::{AppResult, TenantId};
use veridex_domain::{PermissionCode, RoleId, UserId};

/// Assignment projection linking a principal to one active role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignmentRecord {
    /// Assigned role identifier.
    pub role_id: RoleId,
    /// Role name, for diagnostics.
    pub role_name: String,
    /// Optional assignment expiry. Expired assignments confer nothing.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Repository port for role assignments and role grants.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Lists a principal's assignments in the tenant, restricted to roles
    /// with the active flag set. Expiry is not filtered here; the engine
    /// applies it against the evaluation clock.
    async fn list_active_role_assignments(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> AppResult<Vec<RoleAssignmentRecord>>;

    /// Lists a role's grants whose catalog entries are active. Deactivated
    /// permissions must be absent even while still linked.
    async fn list_active_permissions(&self, role_id: RoleId) -> AppResult<Vec<PermissionCode>>;
}

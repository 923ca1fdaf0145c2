use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::PgPool;

use veridex_application::{
    AclEntryRecord, AclRepository, AttributeRepository, PolicyRepository, RoleAssignmentRecord,
    RoleRepository,
};
use veridex_core::{AppResult, TenantId};
use veridex_domain::{
    AclResourceScope, AclSubject, AttributeValue, PermissionCode, PolicyDefinition, RoleId, UserId,
};

mod acl;
mod attributes;
mod policies;
mod roles;
#[cfg(test)]
mod tests;

/// PostgreSQL-backed store implementing every decision port.
///
/// All lookups are single read-only queries; no snapshot spans the
/// engine's separate reads within one decision.
#[derive(Clone)]
pub struct PostgresAccessRepository {
    pool: PgPool,
}

impl PostgresAccessRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttributeRepository for PostgresAccessRepository {
    async fn list_attribute_values(
        &self,
        user_id: UserId,
    ) -> AppResult<BTreeMap<String, AttributeValue>> {
        self.list_attribute_values_impl(user_id).await
    }
}

#[async_trait]
impl RoleRepository for PostgresAccessRepository {
    async fn list_active_role_assignments(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> AppResult<Vec<RoleAssignmentRecord>> {
        self.list_active_role_assignments_impl(user_id, tenant_id).await
    }

    async fn list_active_permissions(&self, role_id: RoleId) -> AppResult<Vec<PermissionCode>> {
        self.list_active_permissions_impl(role_id).await
    }
}

#[async_trait]
impl PolicyRepository for PostgresAccessRepository {
    async fn list_active_policies(&self, tenant_id: TenantId) -> AppResult<Vec<PolicyDefinition>> {
        self.list_active_policies_impl(tenant_id).await
    }
}

#[async_trait]
impl AclRepository for PostgresAccessRepository {
    async fn find_entry(
        &self,
        subject: &AclSubject,
        tenant_id: TenantId,
        resource_type: &str,
        scope: &AclResourceScope,
        permission: &str,
    ) -> AppResult<Option<AclEntryRecord>> {
        self.find_entry_impl(subject, tenant_id, resource_type, scope, permission)
            .await
    }
}

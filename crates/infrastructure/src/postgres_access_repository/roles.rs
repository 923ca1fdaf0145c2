use chrono::{DateTime, Utc};
use sqlx::FromRow;
use veridex_core::{AppError, AppResult, TenantId};
use veridex_domain::{PermissionCode, RoleId, UserId};

use veridex_application::RoleAssignmentRecord;

use super::PostgresAccessRepository;

#[derive(Debug, FromRow)]
struct AssignmentRow {
    role_id: uuid::Uuid,
    role_name: String,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct PermissionCodeRow {
    code: String,
}

impl PostgresAccessRepository {
    pub(super) async fn list_active_role_assignments_impl(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> AppResult<Vec<RoleAssignmentRecord>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT
                assignments.role_id,
                roles.name AS role_name,
                assignments.expires_at
            FROM rbac_role_assignments AS assignments
            INNER JOIN rbac_roles AS roles
                ON roles.id = assignments.role_id
            WHERE assignments.tenant_id = $1
                AND assignments.user_id = $2
                AND roles.is_active = TRUE
            ORDER BY roles.name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load role assignments: {error}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| RoleAssignmentRecord {
                role_id: RoleId::from_uuid(row.role_id),
                role_name: row.role_name,
                expires_at: row.expires_at,
            })
            .collect())
    }

    pub(super) async fn list_active_permissions_impl(
        &self,
        role_id: RoleId,
    ) -> AppResult<Vec<PermissionCode>> {
        let rows = sqlx::query_as::<_, PermissionCodeRow>(
            r#"
            SELECT permissions.code
            FROM rbac_role_permissions AS role_permissions
            INNER JOIN access_permissions AS permissions
                ON permissions.id = role_permissions.permission_id
            WHERE role_permissions.role_id = $1
                AND permissions.is_active = TRUE
            ORDER BY permissions.code
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role grants: {error}")))?;

        rows.into_iter()
            .map(|row| {
                PermissionCode::new(row.code.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "failed to decode permission code '{}' for role '{role_id}': {error}",
                        row.code
                    ))
                })
            })
            .collect()
    }
}

use sqlx::FromRow;
use veridex_application::AclEntryRecord;
use veridex_core::{AppError, AppResult, TenantId};
use veridex_domain::{AclResourceScope, AclSubject};

use super::PostgresAccessRepository;

#[derive(Debug, FromRow)]
struct AclEntryRow {
    entry_id: uuid::Uuid,
    resource_id: Option<String>,
}

impl PostgresAccessRepository {
    pub(super) async fn find_entry_impl(
        &self,
        subject: &AclSubject,
        tenant_id: TenantId,
        resource_type: &str,
        scope: &AclResourceScope,
        permission: &str,
    ) -> AppResult<Option<AclEntryRecord>> {
        // One statement per scope: an instance check also accepts
        // type-wide entries, `Any` leaves resource_id unfiltered, and
        // the strict mode requires it absent.
        let query = match scope {
            AclResourceScope::Instance(resource_id) => sqlx::query_as::<_, AclEntryRow>(
                r#"
                SELECT entries.id AS entry_id, entries.resource_id
                FROM acl_entries AS entries
                WHERE entries.tenant_id = $1
                    AND entries.subject_type = $2
                    AND entries.subject_id = $3
                    AND entries.resource_type = $4
                    AND entries.permission = $5
                    AND (entries.resource_id IS NULL OR entries.resource_id = $6)
                LIMIT 1
                "#,
            )
            .bind(tenant_id.as_uuid())
            .bind(subject.type_as_str())
            .bind(subject.id_as_uuid())
            .bind(resource_type)
            .bind(permission)
            .bind(resource_id.as_str()),
            AclResourceScope::Any => sqlx::query_as::<_, AclEntryRow>(
                r#"
                SELECT entries.id AS entry_id, entries.resource_id
                FROM acl_entries AS entries
                WHERE entries.tenant_id = $1
                    AND entries.subject_type = $2
                    AND entries.subject_id = $3
                    AND entries.resource_type = $4
                    AND entries.permission = $5
                LIMIT 1
                "#,
            )
            .bind(tenant_id.as_uuid())
            .bind(subject.type_as_str())
            .bind(subject.id_as_uuid())
            .bind(resource_type)
            .bind(permission),
            AclResourceScope::UnscopedOnly => sqlx::query_as::<_, AclEntryRow>(
                r#"
                SELECT entries.id AS entry_id, entries.resource_id
                FROM acl_entries AS entries
                WHERE entries.tenant_id = $1
                    AND entries.subject_type = $2
                    AND entries.subject_id = $3
                    AND entries.resource_type = $4
                    AND entries.permission = $5
                    AND entries.resource_id IS NULL
                LIMIT 1
                "#,
            )
            .bind(tenant_id.as_uuid())
            .bind(subject.type_as_str())
            .bind(subject.id_as_uuid())
            .bind(resource_type)
            .bind(permission),
        };

        let row = query.fetch_optional(&self.pool).await.map_err(|error| {
            AppError::Internal(format!("failed to look up acl entry: {error}"))
        })?;

        Ok(row.map(|row| AclEntryRecord {
            entry_id: row.entry_id.to_string(),
            resource_id: row.resource_id,
        }))
    }
}

use async_trait::async_trait;
use veridex_core::{AppResult, TenantId};
use veridex_domain::{AclResourceScope, AclSubject};

/// ACL entry projection returned from lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclEntryRecord {
    /// Stable entry identifier.
    pub entry_id: String,
    /// Resource instance the entry was created for, if any.
    pub resource_id: Option<String>,
}

/// Repository port for explicit resource grants.
#[async_trait]
pub trait AclRepository: Send + Sync {
    /// Finds an entry scoping the subject to the resource type and
    /// permission, with the entry's own resource instance constrained by
    /// `scope`. Absence is a normal negative outcome.
    async fn find_entry(
        &self,
        subject: &AclSubject,
        tenant_id: TenantId,
        resource_type: &str,
        scope: &AclResourceScope,
        permission: &str,
    ) -> AppResult<Option<AclEntryRecord>>;
}

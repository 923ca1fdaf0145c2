use async_trait::async_trait;
use veridex_core::{AppResult, TenantId};
use veridex_domain::PolicyDefinition;

/// Repository port for tenant policy sets.
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    /// Lists a tenant's active policies with their rules and referenced
    /// attribute names resolved, ordered by priority descending with ties
    /// in insertion order. The engine re-sorts stably, so adapters only
    /// need to preserve insertion order within equal priorities.
    async fn list_active_policies(&self, tenant_id: TenantId) -> AppResult<Vec<PolicyDefinition>>;
}

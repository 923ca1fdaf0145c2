use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use veridex_application::{
    AclEntryRecord, AclRepository, AttributeRepository, PolicyRepository, RoleAssignmentRecord,
    RoleRepository,
};
use veridex_core::{AppError, AppResult, TenantId};
use veridex_domain::{
    AclResourceScope, AclSubject, AttributeValue, PermissionCode, PolicyDefinition, RoleId, UserId,
};


#[derive(Debug, Clone)]
struct StoredPermission {
    resource: Option<String>,
    action: Option<String>,
    is_active: bool,
}

#[derive(Debug, Clone)]
struct StoredRole {
    tenant_id: TenantId,
    name: String,
    is_active: bool,
    permission_codes: Vec<String>,
}

#[derive(Debug, Clone)]
struct StoredAssignment {
    role_id: RoleId,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct StoredAclEntry {
    entry_id: Uuid,
    tenant_id: TenantId,
    subject_type: String,
    subject_id: Uuid,
    resource_type: String,
    resource_id: Option<String>,
    permission: String,
}

/// In-memory access-control store implementing every decision port.
///
/// Attribute and rule payloads are stored as raw JSON so the adapter
/// exercises the same storage-boundary conversions as the Postgres
/// adapter.
#[derive(Debug, Default)]
pub struct InMemoryAccessRepository {
    permissions: RwLock<HashMap<String, StoredPermission>>,
    roles: RwLock<HashMap<RoleId, StoredRole>>,
    assignments: RwLock<HashMap<(UserId, TenantId), Vec<StoredAssignment>>>,
    attribute_values: RwLock<HashMap<UserId, BTreeMap<String, Value>>>,
    policies: RwLock<HashMap<TenantId, Vec<PolicyDefinition>>>,
    acl_entries: RwLock<Vec<StoredAclEntry>>,
}

impl InMemoryAccessRepository {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a permission catalog entry.
    pub async fn insert_permission(
        &self,
        code: &str,
        resource: Option<&str>,
        action: Option<&str>,
        is_active: bool,
    ) {
        self.permissions.write().await.insert(
            code.to_owned(),
            StoredPermission {
                resource: resource.map(str::to_owned),
                action: action.map(str::to_owned),
                is_active,
            },
        );
    }

    /// Creates a role holding the given permission codes. System-role
    /// immutability is an administrative concern and not modeled here.
    pub async fn insert_role(
        &self,
        tenant_id: TenantId,
        name: &str,
        is_active: bool,
        permission_codes: &[&str],
    ) -> RoleId {
        let role_id = RoleId::new();
        self.roles.write().await.insert(
            role_id,
            StoredRole {
                tenant_id,
                name: name.to_owned(),
                is_active,
                permission_codes: permission_codes
                    .iter()
                    .map(|code| (*code).to_owned())
                    .collect(),
            },
        );

        role_id
    }

    /// Assigns a role to a principal, with an optional expiry.
    pub async fn assign_role(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
        role_id: RoleId,
        expires_at: Option<DateTime<Utc>>,
    ) {
        self.assignments
            .write()
            .await
            .entry((user_id, tenant_id))
            .or_default()
            .push(StoredAssignment {
                role_id,
                expires_at,
            });
    }

    /// Sets one raw attribute value for a principal.
    pub async fn set_attribute_value(&self, user_id: UserId, name: &str, value: Value) {
        self.attribute_values
            .write()
            .await
            .entry(user_id)
            .or_default()
            .insert(name.to_owned(), value);
    }

    /// Appends a policy to the tenant's set. Insertion order is the
    /// tie-break order for equal priorities.
    pub async fn insert_policy(&self, tenant_id: TenantId, policy: PolicyDefinition) {
        self.policies
            .write()
            .await
            .entry(tenant_id)
            .or_default()
            .push(policy);
    }

    /// Creates an ACL entry and returns its identifier.
    pub async fn insert_acl_entry(
        &self,
        subject: &AclSubject,
        tenant_id: TenantId,
        resource_type: &str,
        resource_id: Option<&str>,
        permission: &str,
    ) -> String {
        let entry_id = Uuid::new_v4();
        self.acl_entries.write().await.push(StoredAclEntry {
            entry_id,
            tenant_id,
            subject_type: subject.type_as_str().to_owned(),
            subject_id: subject.id_as_uuid(),
            resource_type: resource_type.to_owned(),
            resource_id: resource_id.map(str::to_owned),
            permission: permission.to_owned(),
        });

        entry_id.to_string()
    }

    /// Returns the catalog tags of a permission code, for hosts mapping
    /// resource/action pairs onto codes.
    pub async fn find_permission_tags(
        &self,
        code: &str,
    ) -> Option<(Option<String>, Option<String>)> {
        self.permissions
            .read()
            .await
            .get(code)
            .map(|permission| (permission.resource.clone(), permission.action.clone()))
    }
}

#[async_trait]
impl AttributeRepository for InMemoryAccessRepository {
    async fn list_attribute_values(
        &self,
        user_id: UserId,
    ) -> AppResult<BTreeMap<String, AttributeValue>> {
        let values = self.attribute_values.read().await;
        let Some(stored) = values.get(&user_id) else {
            return Ok(BTreeMap::new());
        };

        stored
            .iter()
            .map(|(name, value)| {
                AttributeValue::try_from(value.clone())
                    .map(|converted| (name.clone(), converted))
                    .map_err(|error| {
                        AppError::Internal(format!(
                            "malformed stored attribute '{name}' for user '{user_id}': {error}"
                        ))
                    })
            })
            .collect()
    }
}

#[async_trait]
impl RoleRepository for InMemoryAccessRepository {
    async fn list_active_role_assignments(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> AppResult<Vec<RoleAssignmentRecord>> {
        let assignments = self.assignments.read().await;
        let roles = self.roles.read().await;

        Ok(assignments
            .get(&(user_id, tenant_id))
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|assignment| {
                let role = roles.get(&assignment.role_id)?;
                (role.tenant_id == tenant_id && role.is_active).then(|| RoleAssignmentRecord {
                    role_id: assignment.role_id,
                    role_name: role.name.clone(),
                    expires_at: assignment.expires_at,
                })
            })
            .collect())
    }

    async fn list_active_permissions(&self, role_id: RoleId) -> AppResult<Vec<PermissionCode>> {
        let roles = self.roles.read().await;
        let permissions = self.permissions.read().await;
        let Some(role) = roles.get(&role_id) else {
            return Ok(Vec::new());
        };

        role.permission_codes
            .iter()
            .filter(|code| {
                permissions
                    .get(code.as_str())
                    .is_some_and(|permission| permission.is_active)
            })
            .map(|code| {
                PermissionCode::new(code.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "malformed stored permission code '{code}': {error}"
                    ))
                })
            })
            .collect()
    }
}

#[async_trait]
impl PolicyRepository for InMemoryAccessRepository {
    async fn list_active_policies(&self, tenant_id: TenantId) -> AppResult<Vec<PolicyDefinition>> {
        let policies = self.policies.read().await;
        let mut listed: Vec<PolicyDefinition> = policies
            .get(&tenant_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter(|policy| policy.is_active())
            .cloned()
            .collect();
        listed.sort_by(|left, right| right.priority().cmp(&left.priority()));

        Ok(listed)
    }
}

#[async_trait]
impl AclRepository for InMemoryAccessRepository {
    async fn find_entry(
        &self,
        subject: &AclSubject,
        tenant_id: TenantId,
        resource_type: &str,
        scope: &AclResourceScope,
        permission: &str,
    ) -> AppResult<Option<AclEntryRecord>> {
        let entries = self.acl_entries.read().await;

        Ok(entries
            .iter()
            .find(|entry| {
                entry.tenant_id == tenant_id
                    && entry.subject_type == subject.type_as_str()
                    && entry.subject_id == subject.id_as_uuid()
                    && entry.resource_type == resource_type
                    && entry.permission == permission
                    && scope.covers(entry.resource_id.as_deref())
            })
            .map(|entry| AclEntryRecord {
                entry_id: entry.entry_id.to_string(),
                resource_id: entry.resource_id.clone(),
            }))
    }
}

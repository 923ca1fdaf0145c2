use std::str::FromStr;

use serde_json::Value;
use sqlx::FromRow;
use veridex_core::{AppError, AppResult, TenantId};
use veridex_domain::{AttributeValue, PolicyDefinition, PolicyEffect, PolicyRule};

use super::PostgresAccessRepository;

#[derive(Debug, FromRow)]
struct PolicyRow {
    policy_id: uuid::Uuid,
    name: String,
    effect: String,
    priority: i32,
    attribute_name: Option<String>,
    operator: Option<String>,
    expected_value: Option<Value>,
}

impl PostgresAccessRepository {
    pub(super) async fn list_active_policies_impl(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<PolicyDefinition>> {
        let rows = sqlx::query_as::<_, PolicyRow>(
            r#"
            SELECT
                policies.id AS policy_id,
                policies.name,
                policies.effect,
                policies.priority,
                attributes.name AS attribute_name,
                rules.operator,
                rules.expected_value
            FROM pbac_policies AS policies
            LEFT JOIN pbac_policy_rules AS rules
                ON rules.policy_id = policies.id
            LEFT JOIN abac_attributes AS attributes
                ON attributes.id = rules.attribute_id
            WHERE policies.tenant_id = $1
                AND policies.is_active = TRUE
            ORDER BY policies.priority DESC, policies.created_at, policies.id, rules.position
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load policies: {error}")))?;

        aggregate_policies(rows, tenant_id)
    }
}

fn aggregate_policies(rows: Vec<PolicyRow>, tenant_id: TenantId) -> AppResult<Vec<PolicyDefinition>> {
    let mut policies = Vec::new();
    let mut current: Option<(uuid::Uuid, String, PolicyEffect, i32, Vec<PolicyRule>)> = None;

    for row in rows {
        let effect = PolicyEffect::from_str(row.effect.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode effect '{}' for policy '{}' in tenant '{tenant_id}': {error}",
                row.effect, row.name
            ))
        })?;

        let changed = current
            .as_ref()
            .is_none_or(|(policy_id, ..)| *policy_id != row.policy_id);
        if changed {
            if let Some(finished) = current.take() {
                policies.push(build_policy(finished, tenant_id)?);
            }
            current = Some((row.policy_id, row.name.clone(), effect, row.priority, Vec::new()));
        }

        if let (Some(attribute_name), Some(operator), Some(expected_value)) =
            (row.attribute_name, row.operator, row.expected_value)
        {
            let expected = AttributeValue::try_from(expected_value).map_err(|error| {
                AppError::Internal(format!(
                    "malformed rule value on policy '{}' in tenant '{tenant_id}': {error}",
                    row.name
                ))
            })?;
            let rule = PolicyRule::new(attribute_name, operator, expected).map_err(|error| {
                AppError::Internal(format!(
                    "malformed rule on policy '{}' in tenant '{tenant_id}': {error}",
                    row.name
                ))
            })?;
            if let Some((.., rules)) = current.as_mut() {
                rules.push(rule);
            }
        }
    }

    if let Some(finished) = current {
        policies.push(build_policy(finished, tenant_id)?);
    }

    Ok(policies)
}

fn build_policy(
    parts: (uuid::Uuid, String, PolicyEffect, i32, Vec<PolicyRule>),
    tenant_id: TenantId,
) -> AppResult<PolicyDefinition> {
    let (_, name, effect, priority, rules) = parts;
    PolicyDefinition::new(name.as_str(), effect, priority, true, rules).map_err(|error| {
        AppError::Internal(format!(
            "failed to rebuild policy '{name}' in tenant '{tenant_id}': {error}"
        ))
    })
}

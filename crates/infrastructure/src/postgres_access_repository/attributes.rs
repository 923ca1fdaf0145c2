use std::collections::BTreeMap;

use serde_json::Value;
use sqlx::FromRow;
use veridex_core::{AppError, AppResult};
use veridex_domain::{AttributeValue, UserId};

use super::PostgresAccessRepository;

#[derive(Debug, FromRow)]
struct AttributeValueRow {
    name: String,
    value: Value,
}

impl PostgresAccessRepository {
    pub(super) async fn list_attribute_values_impl(
        &self,
        user_id: UserId,
    ) -> AppResult<BTreeMap<String, AttributeValue>> {
        let rows = sqlx::query_as::<_, AttributeValueRow>(
            r#"
            SELECT
                attributes.name,
                attribute_values.value
            FROM abac_user_attribute_values AS attribute_values
            INNER JOIN abac_attributes AS attributes
                ON attributes.id = attribute_values.attribute_id
            WHERE attribute_values.user_id = $1
            ORDER BY attributes.name
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load attribute values: {error}"))
        })?;

        rows.into_iter()
            .map(|row| {
                AttributeValue::try_from(row.value)
                    .map(|value| (row.name.clone(), value))
                    .map_err(|error| {
                        AppError::Internal(format!(
                            "malformed stored attribute '{}' for user '{user_id}': {error}",
                            row.name
                        ))
                    })
            })
            .collect()
    }
}

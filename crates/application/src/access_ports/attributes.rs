use std::collections::BTreeMap;

use async_trait::async_trait;
use veridex_core::AppResult;
use veridex_domain::{AttributeValue, UserId};

/// Repository port for principal attribute values.
#[async_trait]
pub trait AttributeRepository: Send + Sync {
    /// Returns the named attribute values currently assigned to a
    /// principal. Principals without values yield an empty map.
    async fn list_attribute_values(
        &self,
        user_id: UserId,
    ) -> AppResult<BTreeMap<String, AttributeValue>>;
}

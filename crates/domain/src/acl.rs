use serde::{Deserialize, Serialize};

use crate::{RoleId, UserId};

/// Subject of an ACL entry: one user or one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "subject_type", content = "subject_id")]
pub enum AclSubject {
    /// Entry granted directly to a user.
    User(UserId),
    /// Entry granted to every holder of a role.
    Role(RoleId),
}

impl AclSubject {
    /// Returns a stable storage value for the subject type.
    #[must_use]
    pub fn type_as_str(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Role(_) => "role",
        }
    }

    /// Returns the subject identifier as a UUID.
    #[must_use]
    pub fn id_as_uuid(&self) -> uuid::Uuid {
        match self {
            Self::User(user_id) => user_id.as_uuid(),
            Self::Role(role_id) => role_id.as_uuid(),
        }
    }
}

/// Resource-instance scope of an ACL lookup.
///
/// An instance-less check can be read two ways: a standing grant for the
/// resource type matches entries created for any specific instance
/// (`Any`), or only entries created without an instance of their own
/// (`UnscopedOnly`). Which reading instance-less requests use is an
/// engine configuration choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclResourceScope {
    /// Match entries for this instance, or type-wide entries with no
    /// instance of their own.
    Instance(String),
    /// Match entries regardless of their own resource instance.
    Any,
    /// Match only entries with no resource instance of their own.
    UnscopedOnly,
}

impl AclResourceScope {
    /// Returns whether an entry's stored `resource_id` falls inside this
    /// scope.
    #[must_use]
    pub fn covers(&self, entry_resource_id: Option<&str>) -> bool {
        match self {
            Self::Instance(resource_id) => {
                entry_resource_id.is_none() || entry_resource_id == Some(resource_id.as_str())
            }
            Self::Any => true,
            Self::UnscopedOnly => entry_resource_id.is_none(),
        }
    }
}

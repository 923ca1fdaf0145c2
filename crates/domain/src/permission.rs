use serde::{Deserialize, Serialize};
use veridex_core::{AppResult, NonEmptyString};

/// Unique code identifying one abstract capability, e.g. `"user:read"`.
///
/// The permission catalog is tenant-administered data, so codes are open
/// strings rather than a compile-time enum. Inactive catalog entries are
/// filtered out by the repositories and never reach evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionCode(NonEmptyString);

impl PermissionCode {
    /// Creates a validated permission code.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        Ok(Self(NonEmptyString::new(value)?))
    }

    /// Returns the underlying code string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for PermissionCode {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0.as_str())
    }
}

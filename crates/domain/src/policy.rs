use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use veridex_core::{AppError, AppResult, NonEmptyString};

use crate::{AttributeValue, condition};

/// Outcome of a matched policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyEffect {
    /// Grants the evaluated request.
    Allow,
    /// Blocks the evaluated request.
    Deny,
}

impl PolicyEffect {
    /// Returns a stable storage value for this effect.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

impl FromStr for PolicyEffect {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            _ => Err(AppError::Validation(format!(
                "unknown policy effect '{value}'"
            ))),
        }
    }
}

/// Result of evaluating a tenant's policy set against attributes.
///
/// `NoMatch` means the policy layer holds no opinion; it is not a deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// The first fully matching policy allows.
    Allow,
    /// The first fully matching policy denies.
    Deny,
    /// No policy matched in full.
    NoMatch,
}

impl From<PolicyEffect> for PolicyDecision {
    fn from(effect: PolicyEffect) -> Self {
        match effect {
            PolicyEffect::Allow => Self::Allow,
            PolicyEffect::Deny => Self::Deny,
        }
    }
}

/// One attribute condition inside a policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRule {
    attribute_name: NonEmptyString,
    operator: String,
    expected: AttributeValue,
}

impl PolicyRule {
    /// Creates a policy rule.
    ///
    /// The operator is kept as stored text: an operator that no longer
    /// parses must fail its one condition at evaluation time, not fail the
    /// policy load.
    pub fn new(
        attribute_name: impl Into<String>,
        operator: impl Into<String>,
        expected: AttributeValue,
    ) -> AppResult<Self> {
        Ok(Self {
            attribute_name: NonEmptyString::new(attribute_name)?,
            operator: operator.into(),
            expected,
        })
    }

    /// Returns the referenced attribute name.
    #[must_use]
    pub fn attribute_name(&self) -> &NonEmptyString {
        &self.attribute_name
    }

    /// Returns the raw operator text.
    #[must_use]
    pub fn operator(&self) -> &str {
        self.operator.as_str()
    }

    /// Returns the expected comparison value.
    #[must_use]
    pub fn expected(&self) -> &AttributeValue {
        &self.expected
    }

    /// Evaluates this rule against a principal's attribute map.
    ///
    /// A missing attribute key is a non-match.
    #[must_use]
    pub fn matches(&self, attributes: &BTreeMap<String, AttributeValue>) -> bool {
        attributes
            .get(self.attribute_name.as_str())
            .is_some_and(|actual| condition::evaluate(actual, self.operator.as_str(), &self.expected))
    }
}

/// A tenant policy: an effect guarded by AND-ed attribute rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDefinition {
    name: NonEmptyString,
    effect: PolicyEffect,
    priority: i32,
    is_active: bool,
    rules: Vec<PolicyRule>,
}

impl PolicyDefinition {
    /// Creates a validated policy definition.
    pub fn new(
        name: impl Into<String>,
        effect: PolicyEffect,
        priority: i32,
        is_active: bool,
        rules: Vec<PolicyRule>,
    ) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            effect,
            priority,
            is_active,
            rules,
        })
    }

    /// Returns the policy name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the policy effect.
    #[must_use]
    pub fn effect(&self) -> PolicyEffect {
        self.effect
    }

    /// Returns the evaluation priority. Higher priorities evaluate first.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns the active flag.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the rule list.
    #[must_use]
    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    /// Returns whether every rule matches the attribute map.
    ///
    /// A policy without rules matches vacuously and acts as an
    /// unconditional tenant-wide effect.
    #[must_use]
    pub fn matches(&self, attributes: &BTreeMap<String, AttributeValue>) -> bool {
        self.rules.iter().all(|rule| rule.matches(attributes))
    }
}

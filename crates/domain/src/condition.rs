//! Pure evaluation of one condition operator against attribute values.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use veridex_core::AppError;

use crate::AttributeValue;

/// Supported condition operators for policy rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    /// Structural equality.
    Eq,
    /// Negation of structural equality.
    Ne,
    /// Expected sequence contains the actual value.
    In,
    /// Actual sequence contains the expected value.
    Contains,
    /// Numeric greater-than-or-equal comparison.
    Gte,
    /// Numeric less-than-or-equal comparison.
    Lte,
}

impl ConditionOperator {
    /// Returns a stable storage value for this operator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::In => "in",
            Self::Contains => "contains",
            Self::Gte => "gte",
            Self::Lte => "lte",
        }
    }

    /// Applies this operator to an actual and an expected value.
    ///
    /// Type mismatches are a non-match, not an error: `gte`/`lte` require
    /// both operands numeric, `in` requires a sequence on the expected side,
    /// `contains` a sequence on the actual side.
    #[must_use]
    pub fn apply(&self, actual: &AttributeValue, expected: &AttributeValue) -> bool {
        match self {
            Self::Eq => actual == expected,
            Self::Ne => actual != expected,
            Self::In => expected
                .as_array()
                .is_some_and(|items| items.contains(actual)),
            Self::Contains => actual
                .as_array()
                .is_some_and(|items| items.contains(expected)),
            Self::Gte => match (actual.as_number(), expected.as_number()) {
                (Some(left), Some(right)) => left >= right,
                _ => false,
            },
            Self::Lte => match (actual.as_number(), expected.as_number()) {
                (Some(left), Some(right)) => left <= right,
                _ => false,
            },
        }
    }
}

impl FromStr for ConditionOperator {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "eq" => Ok(Self::Eq),
            "ne" => Ok(Self::Ne),
            "in" => Ok(Self::In),
            "contains" => Ok(Self::Contains),
            "gte" => Ok(Self::Gte),
            "lte" => Ok(Self::Lte),
            _ => Err(AppError::Validation(format!(
                "unknown condition operator '{value}'"
            ))),
        }
    }
}

/// Evaluates one raw condition.
///
/// Rules arrive with their operator as stored text; an operator that does
/// not parse fails this one condition to `false` instead of failing the
/// whole evaluation.
#[must_use]
pub fn evaluate(actual: &AttributeValue, operator: &str, expected: &AttributeValue) -> bool {
    ConditionOperator::from_str(operator)
        .map(|operator| operator.apply(actual, expected))
        .unwrap_or(false)
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use veridex_core::{AppError, AppResult};

/// A principal attribute value.
///
/// Stored attribute values are loosely-typed JSON; this tagged variant is
/// what the condition evaluator pattern-matches against. Nulls and objects
/// are rejected at the storage boundary rather than being smuggled into
/// evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// UTF-8 string value.
    String(String),
    /// Numeric value. Integers and floats share one representation, so
    /// `1` and `1.0` compare equal, matching their JSON source forms.
    Number(f64),
    /// Boolean value.
    Bool(bool),
    /// Ordered sequence of values.
    Array(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Returns the numeric form of this value, without coercion.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::String(_) | Self::Bool(_) | Self::Array(_) => None,
        }
    }

    /// Returns the sequence form of this value, without coercion.
    #[must_use]
    pub fn as_array(&self) -> Option<&[AttributeValue]> {
        match self {
            Self::Array(items) => Some(items.as_slice()),
            Self::String(_) | Self::Number(_) | Self::Bool(_) => None,
        }
    }
}

impl TryFrom<Value> for AttributeValue {
    type Error = AppError;

    fn try_from(value: Value) -> AppResult<Self> {
        match value {
            Value::Bool(flag) => Ok(Self::Bool(flag)),
            Value::Number(number) => number.as_f64().map(Self::Number).ok_or_else(|| {
                AppError::Validation(format!("attribute number '{number}' is out of range"))
            }),
            Value::String(content) => Ok(Self::String(content)),
            Value::Array(items) => items
                .into_iter()
                .map(Self::try_from)
                .collect::<AppResult<Vec<Self>>>()
                .map(Self::Array),
            Value::Null => Err(AppError::Validation(
                "attribute values must not be null".to_owned(),
            )),
            Value::Object(_) => Err(AppError::Validation(
                "attribute values must not be objects".to_owned(),
            )),
        }
    }
}

impl From<AttributeValue> for Value {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::String(content) => Value::String(content),
            AttributeValue::Number(number) => serde_json::Number::from_f64(number)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            AttributeValue::Bool(flag) => Value::Bool(flag),
            AttributeValue::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for AttributeValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(value: Vec<AttributeValue>) -> Self {
        Self::Array(value)
    }
}

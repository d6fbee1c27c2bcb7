//! Values produced by expression evaluation

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::EvaluationError;
use crate::ast::{IntegerType, TypeName};

/// Integer together with its declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawIntegerValue")]
pub struct IntegerValue {
    #[serde(with = "decimal")]
    value: i128,
    #[serde(rename = "type")]
    ty: IntegerType,
}

/// Unchecked wire form of `IntegerValue`
#[derive(Deserialize)]
struct RawIntegerValue {
    #[serde(with = "decimal")]
    value: i128,
    #[serde(rename = "type")]
    ty: IntegerType,
}

impl TryFrom<RawIntegerValue> for IntegerValue {
    type Error = String;

    fn try_from(raw: RawIntegerValue) -> Result<Self, Self::Error> {
        IntegerValue::new(raw.value, raw.ty)
            .ok_or_else(|| format!("value {} out of range for {}", raw.value, raw.ty))
    }
}

impl IntegerValue {
    /// Returns `None` when `value` lies outside the range of `ty`
    pub fn new(value: i128, ty: IntegerType) -> Option<Self> {
        ty.contains(value).then_some(Self { value, ty })
    }

    pub fn value(&self) -> i128 {
        self.value
    }

    pub fn ty(&self) -> IntegerType {
        self.ty
    }
}

/// Immutable, tagged result of evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    Integer(IntegerValue),
    Bool(bool),
    /// Multiple return values; the empty tuple is the result of a bare `return;`
    Tuple(Vec<Value>),
}

impl Value {
    pub fn integer(value: i128, ty: IntegerType) -> Result<Self, EvaluationError> {
        IntegerValue::new(value, ty)
            .map(Value::Integer)
            .ok_or(EvaluationError::OutOfRange { value, ty })
    }

    /// `uint256` value
    pub fn uint(value: u64) -> Self {
        Value::Integer(IntegerValue {
            value: i128::from(value),
            ty: IntegerType::UINT256,
        })
    }

    pub fn unit() -> Self {
        Value::Tuple(Vec::new())
    }

    pub fn as_integer(&self) -> Option<&IntegerValue> {
        match self {
            Value::Integer(integer) => Some(integer),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Name of the value's type, as it would be written in source
    pub fn type_label(&self) -> String {
        match self {
            Value::Integer(integer) => integer.ty.to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Tuple(items) => {
                let labels: Vec<String> = items.iter().map(Value::type_label).collect();
                format!("tuple({})", labels.join(","))
            }
        }
    }

    /// Whether the value can be bound to a variable of the given type
    pub fn matches_type(&self, type_name: &TypeName) -> bool {
        match (self, type_name) {
            (Value::Integer(integer), TypeName::Integer(ty)) => {
                integer.ty == *ty && ty.contains(integer.value)
            }
            (Value::Bool(_), TypeName::Bool) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(integer) => write!(f, "{}", integer.value),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Serde adapter for `i128` payloads: plain JSON numbers where they fit,
/// decimal strings otherwise
mod decimal {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i128, serializer: S) -> Result<S::Ok, S::Error> {
        match i64::try_from(*value) {
            Ok(small) => serializer.serialize_i64(small),
            Err(_) => serializer.serialize_str(&value.to_string()),
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Signed(i64),
        Unsigned(u64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i128, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Signed(value) => Ok(i128::from(value)),
            Repr::Unsigned(value) => Ok(i128::from(value)),
            Repr::Text(text) => text
                .parse::<i128>()
                .map_err(|_| de::Error::custom(format!("invalid integer literal: {}", text))),
        }
    }
}

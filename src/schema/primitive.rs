//! Primitive property types and text-to-value coercion
//!
//! Supported primitives:
//! - long: 64-bit signed integer
//! - int: 32-bit signed integer
//! - short: 16-bit signed integer
//! - byte: 8-bit signed integer
//! - float / double: IEEE 754, "C" representation only
//! - boolean: `true` / `false`, case-insensitive
//! - enum(A|B|C): exact member name
//! - string (also `object`): text, the fallback
//!
//! Any other declared type name is a nested type reference and is never coerced.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::errors::{StoreError, StoreResult};

/// A primitive type from the fixed vocabulary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveType {
    Long,
    Int,
    Short,
    Byte,
    Float,
    Double,
    Boolean,
    /// Enumeration with its declared members
    Enum(Vec<String>),
    Text,
}

impl PrimitiveType {
    /// Resolves a declared type name against the primitive vocabulary.
    ///
    /// Returns `Ok(None)` when the name is not primitive, and an error for
    /// an `enum(...)` declaration without usable members.
    pub fn from_name(name: &str) -> StoreResult<Option<Self>> {
        let primitive = match name {
            "long" | "Long" | "java.lang.Long" => PrimitiveType::Long,
            "int" | "integer" | "Integer" | "java.lang.Integer" => PrimitiveType::Int,
            "short" | "Short" | "java.lang.Short" => PrimitiveType::Short,
            "byte" | "Byte" | "java.lang.Byte" => PrimitiveType::Byte,
            "float" | "Float" | "java.lang.Float" => PrimitiveType::Float,
            "double" | "Double" | "java.lang.Double" => PrimitiveType::Double,
            "boolean" | "Boolean" | "java.lang.Boolean" => PrimitiveType::Boolean,
            "string" | "String" | "java.lang.String" | "object" | "Object"
            | "java.lang.Object" => PrimitiveType::Text,
            _ => return parse_enum(name),
        };
        Ok(Some(primitive))
    }

    /// Returns the canonical type name
    pub fn type_name(&self) -> String {
        match self {
            PrimitiveType::Long => "long".into(),
            PrimitiveType::Int => "int".into(),
            PrimitiveType::Short => "short".into(),
            PrimitiveType::Byte => "byte".into(),
            PrimitiveType::Float => "float".into(),
            PrimitiveType::Double => "double".into(),
            PrimitiveType::Boolean => "boolean".into(),
            PrimitiveType::Enum(members) => format!("enum({})", members.join("|")),
            PrimitiveType::Text => "string".into(),
        }
    }

    /// Converts text into a value of this type.
    ///
    /// `property` is used for diagnostics only.
    pub fn parse_value(&self, text: &str, property: &str) -> StoreResult<PrimitiveValue> {
        let value = match self {
            PrimitiveType::Long => PrimitiveValue::Long(parse_number(text, property, "long")?),
            PrimitiveType::Int => PrimitiveValue::Int(parse_number(text, property, "int")?),
            PrimitiveType::Short => PrimitiveValue::Short(parse_number(text, property, "short")?),
            PrimitiveType::Byte => PrimitiveValue::Byte(parse_number(text, property, "byte")?),
            PrimitiveType::Float => PrimitiveValue::Float(parse_number(text, property, "float")?),
            PrimitiveType::Double => {
                PrimitiveValue::Double(parse_number(text, property, "double")?)
            }
            PrimitiveType::Boolean => {
                if text.eq_ignore_ascii_case("true") {
                    PrimitiveValue::Boolean(true)
                } else if text.eq_ignore_ascii_case("false") {
                    PrimitiveValue::Boolean(false)
                } else {
                    return Err(StoreError::coercion_failure(
                        property,
                        format!("'{}' is not a boolean", text),
                    ));
                }
            }
            PrimitiveType::Enum(members) => {
                if !members.iter().any(|m| m == text) {
                    return Err(StoreError::coercion_failure(
                        property,
                        format!("'{}' is not a member of {}", text, self.type_name()),
                    ));
                }
                PrimitiveValue::Enum(text.to_string())
            }
            PrimitiveType::Text => PrimitiveValue::Text(text.to_string()),
        };
        Ok(value)
    }
}

fn parse_enum(name: &str) -> StoreResult<Option<PrimitiveType>> {
    let Some(body) = name.strip_prefix("enum(").and_then(|rest| rest.strip_suffix(')')) else {
        return Ok(None);
    };
    let members: Vec<String> = body.split('|').map(|m| m.trim().to_string()).collect();
    if members.iter().any(|m| m.is_empty()) {
        return Err(StoreError::schema_validation(format!(
            "Illegal enumeration type '{}': members cannot be empty",
            name
        )));
    }
    Ok(Some(PrimitiveType::Enum(members)))
}

fn parse_number<T>(text: &str, property: &str, target: &str) -> StoreResult<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    text.parse::<T>().map_err(|e| {
        StoreError::coercion_failure(property, format!("'{}' is not a valid {}: {}", text, target, e))
    })
}

/// Declared type of a fixed property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PropertyType {
    Primitive(PrimitiveType),
    /// Reference to another registered type, resolved lazily at marshalling time
    Nested(String),
}

impl PropertyType {
    /// Resolves a declared type name: primitive vocabulary first, nested reference otherwise
    pub fn resolve(name: &str) -> StoreResult<Self> {
        Ok(match PrimitiveType::from_name(name)? {
            Some(primitive) => PropertyType::Primitive(primitive),
            None => PropertyType::Nested(name.to_string()),
        })
    }

    /// Returns the declared type name
    pub fn type_name(&self) -> String {
        match self {
            PropertyType::Primitive(p) => p.type_name(),
            PropertyType::Nested(name) => name.clone(),
        }
    }

    /// Returns whether this is a primitive type
    pub fn is_primitive(&self) -> bool {
        matches!(self, PropertyType::Primitive(_))
    }
}

impl From<PropertyType> for String {
    fn from(t: PropertyType) -> Self {
        t.type_name()
    }
}

impl TryFrom<String> for PropertyType {
    type Error = StoreError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        PropertyType::resolve(&name)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// A typed primitive value
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    Long(i64),
    Int(i32),
    Short(i16),
    Byte(i8),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Enum(String),
    Text(String),
}

impl PrimitiveValue {
    /// Exports the value as JSON.
    ///
    /// Floats are written in their shortest decimal form. Non-finite floats
    /// have no JSON number representation and export as text.
    pub fn to_json(&self) -> Value {
        match self {
            PrimitiveValue::Long(v) => Value::from(*v),
            PrimitiveValue::Int(v) => Value::from(*v),
            PrimitiveValue::Short(v) => Value::from(*v),
            PrimitiveValue::Byte(v) => Value::from(*v),
            PrimitiveValue::Float(v) => v
                .to_string()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(v.to_string())),
            PrimitiveValue::Double(v) => Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(v.to_string())),
            PrimitiveValue::Boolean(v) => Value::Bool(*v),
            PrimitiveValue::Enum(v) | PrimitiveValue::Text(v) => Value::String(v.clone()),
        }
    }
}

/// Coerces text into the declared property type.
///
/// Fails with `UnsupportedPrimitiveType` for nested type references, which the
/// caller must marshal as nested documents instead.
pub fn coerce(text: &str, target: &PropertyType, property: &str) -> StoreResult<PrimitiveValue> {
    match target {
        PropertyType::Primitive(primitive) => primitive.parse_value(text, property),
        PropertyType::Nested(name) => Err(StoreError::unsupported_primitive(name.as_str(), property)),
    }
}

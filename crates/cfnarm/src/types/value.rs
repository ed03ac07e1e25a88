use std::fmt::{Display, Formatter, Result as FmtResult};

use indexmap::IndexMap;
use serde_json::{Map, Number, Value as Json};

use crate::arm;

/// A fully resolved value produced by evaluating a template node.
///
/// Resolution is structure preserving: lists and maps keep their shape and
/// only function leaves are replaced. A resolved value is either a literal
/// known at translation time or an ARM template expression (`Expr`) that the
/// target deployment engine evaluates later, such as
/// `resourceId('Microsoft.Network/networkInterfaces', variables('nic'))`.
///
/// # Example
///
/// ```
/// use cfnarm::Value;
///
/// let literal = Value::from("m1.small");
/// assert_eq!(literal.to_json(), serde_json::json!("m1.small"));
///
/// let expr = Value::expr("variables('location')");
/// assert_eq!(expr.to_json(), serde_json::json!("[variables('location')]"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    /// A literal string.
    String(String),
    /// An ARM expression body, without the surrounding brackets.
    Expr(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Create an expression value from its body.
    pub fn expr(body: impl Into<String>) -> Self {
        Value::Expr(body.into())
    }

    /// Get this value as a literal string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as an integer, accepting numeric strings.
    ///
    /// Source templates routinely quote numbers (`"MinSize": "1"`), so both
    /// forms are accepted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get an entry of a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Textual form of a scalar literal, used for concatenation and keys.
    ///
    /// Returns `None` for null, expressions, lists and maps.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Short name of the value's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Expr(_) => "expression",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Convert a plain JSON value. Strings are always literals.
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.clone()),
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            Json::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render into the target document's JSON form.
    ///
    /// Expressions are wrapped in brackets; literal strings that would be
    /// mistaken for expressions are escaped with a second opening bracket.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => Json::Number(n.clone()),
            Value::String(s) => Json::String(arm::escape_literal(s)),
            Value::Expr(body) => Json::String(arm::wrap(body)),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Value::String(s) => write!(f, "{s}"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        Value::from_json(&json)
    }
}

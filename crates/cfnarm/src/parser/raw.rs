//! A JSON tree that keeps duplicate object keys.
//!
//! `serde_json::Value` silently keeps the last of two equal keys, which
//! would hide a resource declared twice. `RawNode` keeps every entry in
//! document order so the reader can reject duplicates.

use std::fmt::{Formatter, Result as FmtResult};

use serde::de::{Deserialize, Deserializer, Error, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Number, Value as Json};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawNode {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<RawNode>),
    Object(Vec<(String, RawNode)>),
}

impl RawNode {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            RawNode::Null => "null",
            RawNode::Bool(_) => "boolean",
            RawNode::Number(_) => "number",
            RawNode::String(_) => "string",
            RawNode::List(_) => "list",
            RawNode::Object(_) => "object",
        }
    }

    /// Convert into a plain JSON value; later duplicates win.
    pub(crate) fn into_json(self) -> Json {
        match self {
            RawNode::Null => Json::Null,
            RawNode::Bool(b) => Json::Bool(b),
            RawNode::Number(n) => Json::Number(n),
            RawNode::String(s) => Json::String(s),
            RawNode::List(items) => Json::Array(items.into_iter().map(RawNode::into_json).collect()),
            RawNode::Object(entries) => Json::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.into_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }

    /// Textual form of a scalar, accepting numbers and booleans.
    pub(crate) fn into_text(self) -> Option<String> {
        match self {
            RawNode::String(s) => Some(s),
            RawNode::Number(n) => Some(n.to_string()),
            RawNode::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

struct RawNodeVisitor;

impl<'de> Visitor<'de> for RawNodeVisitor {
    type Value = RawNode;

    fn expecting(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "any JSON value")
    }

    fn visit_unit<E: Error>(self) -> Result<RawNode, E> {
        Ok(RawNode::Null)
    }

    fn visit_none<E: Error>(self) -> Result<RawNode, E> {
        Ok(RawNode::Null)
    }

    fn visit_bool<E: Error>(self, v: bool) -> Result<RawNode, E> {
        Ok(RawNode::Bool(v))
    }

    fn visit_i64<E: Error>(self, v: i64) -> Result<RawNode, E> {
        Ok(RawNode::Number(v.into()))
    }

    fn visit_u64<E: Error>(self, v: u64) -> Result<RawNode, E> {
        Ok(RawNode::Number(v.into()))
    }

    fn visit_f64<E: Error>(self, v: f64) -> Result<RawNode, E> {
        Ok(Number::from_f64(v).map_or(RawNode::Null, RawNode::Number))
    }

    fn visit_str<E: Error>(self, v: &str) -> Result<RawNode, E> {
        Ok(RawNode::String(v.to_string()))
    }

    fn visit_string<E: Error>(self, v: String) -> Result<RawNode, E> {
        Ok(RawNode::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawNode, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(RawNode::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawNode, A::Error> {
        let mut entries = Vec::new();
        while let Some(entry) = map.next_entry::<String, RawNode>()? {
            entries.push(entry);
        }
        Ok(RawNode::Object(entries))
    }
}

impl<'de> Deserialize<'de> for RawNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawNodeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_duplicate_keys_in_order() {
        let raw: RawNode = serde_json::from_str(r#"{"a": 1, "b": 2, "a": 3}"#).unwrap();
        let RawNode::Object(entries) = raw else {
            panic!("expected object");
        };
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "a"]);
    }

    #[test]
    fn into_json_keeps_last_duplicate() {
        let raw: RawNode = serde_json::from_str(r#"{"a": 1, "a": [true, null]}"#).unwrap();
        assert_eq!(raw.into_json(), serde_json::json!({ "a": [true, null] }));
    }
}

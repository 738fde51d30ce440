//! Raw namespace types matching the JSON file.
//!
//! A node is either an array (pattern-matched variants) or an object with
//! any of `query`, `params`, `role`, `children`.

use serde::de::value::{MapAccessDeserializer, SeqAccessDeserializer};
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fmt;

#[derive(Clone, Debug)]
pub enum RawNode {
    Variants(Vec<RawQuery>),
    Object(RawQuery),
}

impl<'de> Deserialize<'de> for RawNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RawNodeVisitor)
    }
}

struct RawNodeVisitor;

impl<'de> Visitor<'de> for RawNodeVisitor {
    type Value = RawNode;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a namespace node (object) or a list of query variants (array)")
    }

    fn visit_seq<A>(self, seq: A) -> Result<RawNode, A::Error>
    where
        A: SeqAccess<'de>,
    {
        Vec::<RawQuery>::deserialize(SeqAccessDeserializer::new(seq)).map(RawNode::Variants)
    }

    fn visit_map<A>(self, map: A) -> Result<RawNode, A::Error>
    where
        A: MapAccess<'de>,
    {
        RawQuery::deserialize(MapAccessDeserializer::new(map)).map(RawNode::Object)
    }
}

/// Object-shaped node. Leaves, variant alternatives and directories all use it.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawQuery {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub params: Option<Vec<String>>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub children: Option<RawChildren>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Children in declaration order. Duplicate keys are a parse error instead of last-wins.
#[derive(Clone, Debug, Default)]
pub struct RawChildren(pub Vec<(String, RawNode)>);

impl<'de> Deserialize<'de> for RawChildren {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RawChildrenVisitor)
    }
}

struct RawChildrenVisitor;

impl<'de> Visitor<'de> for RawChildrenVisitor {
    type Value = RawChildren;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of child name to namespace node")
    }

    fn visit_map<A>(self, mut map: A) -> Result<RawChildren, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, node)) = map.next_entry::<String, RawNode>()? {
            if !seen.insert(key.clone()) {
                return Err(de::Error::custom(format!("duplicate child key '{}'", key)));
            }
            out.push((key, node));
        }
        Ok(RawChildren(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrays_parse_as_variants_and_objects_as_nodes() {
        let node: RawNode = serde_json::from_str(
            r#"[{"query": "SELECT 1"}, {"query": "SELECT ?", "params": ["a"]}]"#,
        )
        .unwrap();
        match node {
            RawNode::Variants(v) => {
                assert_eq!(v.len(), 2);
                assert!(v[0].params.is_none());
                assert_eq!(v[1].params.as_deref(), Some(&["a".to_string()][..]));
            }
            other => panic!("expected variants, got {:?}", other),
        }
    }

    #[test]
    fn children_keep_declaration_order() {
        let node: RawNode = serde_json::from_str(
            r#"{"role": "reader", "children": {"b": {"query": "B"}, "a": {"query": "A"}}}"#,
        )
        .unwrap();
        let RawNode::Object(obj) = node else {
            panic!("expected object");
        };
        let keys: Vec<_> = obj.children.unwrap().0.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn duplicate_children_are_rejected() {
        let err = serde_json::from_str::<RawNode>(
            r#"{"children": {"a": {"query": "A"}, "a": {"query": "B"}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate child key 'a'"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<RawNode>(r#"{"query": "A", "param": ["x"]}"#).is_err());
    }

    #[test]
    fn scalars_are_not_nodes() {
        assert!(serde_json::from_str::<RawNode>(r#""SELECT 1""#).is_err());
    }
}

//! Namespace validation on the raw tree: shape, parameter declarations, variant disjointness.

use crate::config::resolved::CONTEXT_PARAM_MARKER;
use crate::config::types::{RawNode, RawQuery};
use crate::error::ConfigError;
use std::collections::{BTreeSet, HashSet};

/// First-segment prefix kept for built-in routes (`_register`, `_sessions`, `_health`, ...).
pub const RESERVED_PREFIX: char = '_';

/// Display form of a path for error messages.
pub fn display_path(path: &[String]) -> String {
    format!("/{}", path.join("/"))
}

/// Validate the whole raw tree. The root must be a directory.
pub fn validate(root: &RawNode) -> Result<(), ConfigError> {
    match root {
        RawNode::Object(obj) if obj.children.is_some() => {
            let reserved = obj
                .children
                .iter()
                .flat_map(|c| c.0.iter())
                .find(|(key, _)| key.starts_with(RESERVED_PREFIX));
            if let Some((key, _)) = reserved {
                return Err(ConfigError::ReservedName(key.clone()));
            }
            let mut path = Vec::new();
            validate_object(obj, &mut path)
        }
        _ => Err(ConfigError::RootNotDirectory),
    }
}

fn validate_node(node: &RawNode, path: &mut Vec<String>) -> Result<(), ConfigError> {
    match node {
        RawNode::Object(obj) => validate_object(obj, path),
        RawNode::Variants(variants) => validate_variants(variants, path),
    }
}

fn validate_object(obj: &RawQuery, path: &mut Vec<String>) -> Result<(), ConfigError> {
    if obj.query.is_none() && obj.children.is_none() {
        return Err(ConfigError::EmptyNode {
            path: display_path(path),
        });
    }
    validate_params(obj.params.as_deref().unwrap_or(&[]), path)?;
    validate_role(obj.role.as_deref(), path)?;
    if let Some(children) = &obj.children {
        for (key, child) in &children.0 {
            if key.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "empty child key under {}",
                    display_path(path)
                )));
            }
            path.push(key.clone());
            validate_node(child, path)?;
            path.pop();
        }
    }
    Ok(())
}

fn validate_variants(variants: &[RawQuery], path: &[String]) -> Result<(), ConfigError> {
    if variants.is_empty() {
        return Err(ConfigError::EmptyVariantList {
            path: display_path(path),
        });
    }
    let mut seen: Vec<BTreeSet<&str>> = Vec::with_capacity(variants.len());
    for (index, variant) in variants.iter().enumerate() {
        if variant.children.is_some() {
            return Err(ConfigError::VariantWithChildren {
                path: display_path(path),
                index,
            });
        }
        if variant.query.is_none() {
            return Err(ConfigError::EmptyNode {
                path: format!("{}[{}]", display_path(path), index),
            });
        }
        let params = variant.params.as_deref().unwrap_or(&[]);
        validate_params(params, path)?;
        validate_role(variant.role.as_deref(), path)?;

        let set: BTreeSet<&str> = params
            .iter()
            .map(String::as_str)
            .filter(|p| !p.starts_with(CONTEXT_PARAM_MARKER))
            .collect();
        if let Some(first) = seen.iter().position(|s| *s == set) {
            return Err(ConfigError::AmbiguousVariants {
                path: display_path(path),
                first,
                second: index,
                params: set.into_iter().map(String::from).collect(),
            });
        }
        seen.push(set);
    }
    Ok(())
}

fn validate_params(params: &[String], path: &[String]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for p in params {
        let bare = p.strip_prefix(CONTEXT_PARAM_MARKER).unwrap_or(p);
        if bare.is_empty() {
            return Err(ConfigError::EmptyParamName {
                path: display_path(path),
            });
        }
        if !names.insert(p.as_str()) {
            return Err(ConfigError::DuplicateParam {
                path: display_path(path),
                name: p.clone(),
            });
        }
    }
    Ok(())
}

fn validate_role(role: Option<&str>, path: &[String]) -> Result<(), ConfigError> {
    match role {
        Some(r) if r.trim().is_empty() => Err(ConfigError::Validation(format!(
            "empty role at {}",
            display_path(path)
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawNode {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn accepts_a_well_formed_tree() {
        let tree = raw(
            r#"{"role": "reader", "children": {
                "posts": [
                    {"query": "SELECT * FROM posts"},
                    {"query": "SELECT * FROM posts WHERE thread_id = ?", "params": ["thread_id"]}
                ],
                "threads": {"query": "SELECT * FROM threads", "children": {
                    "mine": {"query": "SELECT * FROM threads WHERE owner = ?", "params": ["?users_id"]}
                }}
            }}"#,
        );
        validate(&tree).unwrap();
    }

    #[test]
    fn root_must_be_a_directory() {
        assert!(matches!(
            validate(&raw(r#"{"query": "SELECT 1", "role": "r"}"#)),
            Err(ConfigError::RootNotDirectory)
        ));
        assert!(matches!(
            validate(&raw(r#"[{"query": "SELECT 1"}]"#)),
            Err(ConfigError::RootNotDirectory)
        ));
    }

    #[test]
    fn variants_cannot_have_children() {
        let err = validate(&raw(
            r#"{"children": {"p": [{"query": "A", "children": {"x": {"query": "X"}}}]}}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::VariantWithChildren { index: 0, .. }));
    }

    #[test]
    fn variants_with_same_caller_set_are_ambiguous() {
        // Context parameters do not count toward the set.
        let err = validate(&raw(
            r#"{"children": {"p": [
                {"query": "A", "params": ["a"]},
                {"query": "B", "params": ["?users_id", "a"]}
            ]}}"#,
        ))
        .unwrap_err();
        match err {
            ConfigError::AmbiguousVariants {
                path,
                first,
                second,
                params,
            } => {
                assert_eq!(path, "/p");
                assert_eq!((first, second), (0, 1));
                assert_eq!(params, vec!["a".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn node_needs_query_or_children() {
        let err = validate(&raw(r#"{"children": {"p": {"role": "r"}}}"#)).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyNode { ref path } if path == "/p"));
    }

    #[test]
    fn duplicate_and_empty_params_are_rejected() {
        assert!(matches!(
            validate(&raw(r#"{"children": {"p": {"query": "A", "params": ["a", "a"]}}}"#)),
            Err(ConfigError::DuplicateParam { .. })
        ));
        assert!(matches!(
            validate(&raw(r#"{"children": {"p": {"query": "A", "params": ["?"]}}}"#)),
            Err(ConfigError::EmptyParamName { .. })
        ));
    }

    #[test]
    fn top_level_underscore_keys_are_reserved() {
        let err = validate(&raw(r#"{"role": "r", "children": {"_health": {"query": "A"}}}"#)).unwrap_err();
        assert!(matches!(err, ConfigError::ReservedName(ref key) if key == "_health"));
        // Only the first segment is shared with built-ins.
        validate(&raw(
            r#"{"role": "r", "children": {"health": {"query": "A", "children": {"_x": {"query": "B"}}}}}"#,
        ))
        .unwrap();
    }

    #[test]
    fn empty_variant_list_is_rejected() {
        assert!(matches!(
            validate(&raw(r#"{"children": {"p": []}}"#)),
            Err(ConfigError::EmptyVariantList { .. })
        ));
    }
}

//! Load the namespace from a file, string or JSON value into an immutable tree.

use crate::config::resolved::{
    ContextKey, DeclaredParam, Directory, Leaf, NamespaceTree, Node, CONTEXT_PARAM_MARKER,
};
use crate::config::types::{RawNode, RawQuery};
use crate::config::validator::{display_path, validate};
use crate::error::ConfigError;
use std::collections::HashMap;
use std::path::Path;

/// Read and resolve a namespace JSON file.
pub async fn load_namespace_file(path: impl AsRef<Path>) -> Result<NamespaceTree, ConfigError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    load_namespace_str(&text)
}

pub fn load_namespace_str(text: &str) -> Result<NamespaceTree, ConfigError> {
    let raw: RawNode = serde_json::from_str(text)?;
    resolve_namespace(&raw)
}

pub fn load_namespace_value(value: serde_json::Value) -> Result<NamespaceTree, ConfigError> {
    let raw: RawNode = serde_json::from_value(value)?;
    resolve_namespace(&raw)
}

/// Validate, then normalize every node once: explicit params, explicit role, typed context params.
pub fn resolve_namespace(raw: &RawNode) -> Result<NamespaceTree, ConfigError> {
    validate(raw)?;
    let RawNode::Object(root) = raw else {
        return Err(ConfigError::RootNotDirectory);
    };
    let mut path = Vec::new();
    let root = resolve_directory(root, None, &mut path)?;
    let tree = NamespaceTree { root };
    tracing::debug!(endpoints = tree.endpoints().len(), "namespace resolved");
    Ok(tree)
}

fn resolve_node(
    node: &RawNode,
    inherited_role: Option<&str>,
    path: &mut Vec<String>,
) -> Result<Node, ConfigError> {
    match node {
        RawNode::Object(obj) if obj.children.is_some() => {
            Ok(Node::Directory(resolve_directory(obj, inherited_role, path)?))
        }
        RawNode::Object(obj) => Ok(Node::Leaf(resolve_leaf(obj, inherited_role, path)?)),
        RawNode::Variants(variants) => variants
            .iter()
            .map(|v| resolve_leaf(v, inherited_role, path))
            .collect::<Result<Vec<_>, _>>()
            .map(Node::Variants),
    }
}

fn resolve_directory(
    obj: &RawQuery,
    inherited_role: Option<&str>,
    path: &mut Vec<String>,
) -> Result<Directory, ConfigError> {
    // The root is never addressed itself, so it only needs a role to hand down.
    let role = if path.is_empty() {
        obj.role.clone().unwrap_or_default()
    } else {
        effective_role(obj, inherited_role, path)?
    };
    let child_role = obj.role.as_deref().or(inherited_role);
    let params = resolve_params(obj.params.as_deref().unwrap_or(&[]), path)?;
    let raw_children = obj.children.as_ref().map(|c| c.0.as_slice()).unwrap_or(&[]);
    let mut children = HashMap::with_capacity(raw_children.len());
    let mut order = Vec::with_capacity(raw_children.len());
    for (key, child) in raw_children {
        path.push(key.clone());
        let node = resolve_node(child, child_role, path)?;
        path.pop();
        if children.insert(key.clone(), node).is_some() {
            return Err(ConfigError::DuplicateChild(key.clone()));
        }
        order.push(key.clone());
    }
    Ok(Directory {
        query: obj.query.clone(),
        params,
        role,
        children,
        order,
    })
}

fn resolve_leaf(
    obj: &RawQuery,
    inherited_role: Option<&str>,
    path: &[String],
) -> Result<Leaf, ConfigError> {
    let query = obj.query.clone().ok_or_else(|| ConfigError::EmptyNode {
        path: display_path(path),
    })?;
    Ok(Leaf {
        query,
        params: resolve_params(obj.params.as_deref().unwrap_or(&[]), path)?,
        role: effective_role(obj, inherited_role, path)?,
    })
}

fn effective_role(
    obj: &RawQuery,
    inherited_role: Option<&str>,
    path: &[String],
) -> Result<String, ConfigError> {
    obj.role
        .as_deref()
        .or(inherited_role)
        .map(String::from)
        .ok_or_else(|| ConfigError::MissingRole {
            path: display_path(path),
        })
}

fn resolve_params(params: &[String], path: &[String]) -> Result<Vec<DeclaredParam>, ConfigError> {
    params
        .iter()
        .map(|p| match p.strip_prefix(CONTEXT_PARAM_MARKER) {
            Some(name) => ContextKey::from_name(name).map(DeclaredParam::Context).ok_or_else(|| {
                ConfigError::UnknownContextParam {
                    path: display_path(path),
                    name: name.to_string(),
                }
            }),
            None => Ok(DeclaredParam::Caller(p.clone())),
        })
        .collect()
}

//! Resolved namespace: validated, normalized and immutable for the process lifetime.

use std::collections::{BTreeSet, HashMap};

/// Marker prefix for parameters filled from request context rather than the caller.
pub const CONTEXT_PARAM_MARKER: char = '?';

/// Request-context values a query may declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextKey {
    /// The authenticated caller's id, or NULL for anonymous requests.
    CallerIdentity,
}

impl ContextKey {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "users_id" => Some(ContextKey::CallerIdentity),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ContextKey::CallerIdentity => "users_id",
        }
    }
}

/// One slot in a query template's positional parameter list.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclaredParam {
    /// Supplied by the caller under this name.
    Caller(String),
    /// Filled from request context; never matched against caller parameters.
    Context(ContextKey),
}

impl DeclaredParam {
    pub fn caller_name(&self) -> Option<&str> {
        match self {
            DeclaredParam::Caller(name) => Some(name),
            DeclaredParam::Context(_) => None,
        }
    }
}

/// Names of caller-supplied parameters in a declaration, as a set.
pub fn caller_param_set(params: &[DeclaredParam]) -> BTreeSet<&str> {
    params.iter().filter_map(DeclaredParam::caller_name).collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct Leaf {
    pub query: String,
    pub params: Vec<DeclaredParam>,
    pub role: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Directory {
    /// Absent means direct requests return an empty record set.
    pub query: Option<String>,
    pub params: Vec<DeclaredParam>,
    pub role: String,
    pub children: HashMap<String, Node>,
    /// Child keys in declaration order, for listing.
    pub order: Vec<String>,
}

impl Directory {
    pub fn child(&self, key: &str) -> Option<&Node> {
        self.children.get(key)
    }

    pub fn children_in_order(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.order
            .iter()
            .filter_map(|k| self.children.get(k).map(|n| (k.as_str(), n)))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Leaf(Leaf),
    /// Alternatives selected by exact caller-parameter set; first match wins.
    Variants(Vec<Leaf>),
    Directory(Directory),
}

/// One resolvable endpoint: canonical path, caller parameter names and role.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub path: Vec<String>,
    pub params: Vec<String>,
    pub role: String,
    pub has_query: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NamespaceTree {
    pub root: Directory,
}

impl NamespaceTree {
    /// Every endpoint reachable from the root, depth-first in declaration order.
    /// The root itself is not addressable (an empty path is never resolved).
    pub fn endpoints(&self) -> Vec<Endpoint> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        collect_children(&self.root, &mut path, &mut out);
        out
    }
}

fn collect_children(dir: &Directory, path: &mut Vec<String>, out: &mut Vec<Endpoint>) {
    for (key, node) in dir.children_in_order() {
        path.push(key.to_string());
        collect_node(node, path, out);
        path.pop();
    }
}

fn collect_node(node: &Node, path: &mut Vec<String>, out: &mut Vec<Endpoint>) {
    let endpoint = |params: &[DeclaredParam], role: &str, has_query: bool| Endpoint {
        path: path.clone(),
        params: params
            .iter()
            .filter_map(DeclaredParam::caller_name)
            .map(String::from)
            .collect(),
        role: role.to_string(),
        has_query,
    };
    match node {
        Node::Leaf(leaf) => out.push(endpoint(&leaf.params, &leaf.role, true)),
        Node::Variants(variants) => {
            for leaf in variants {
                out.push(endpoint(&leaf.params, &leaf.role, true));
            }
        }
        Node::Directory(dir) => {
            out.push(endpoint(&dir.params, &dir.role, dir.query.is_some()));
            collect_children(dir, path, out);
        }
    }
}

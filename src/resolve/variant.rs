//! Pick the single query definition whose caller parameters match the request exactly.

use crate::config::{caller_param_set, DeclaredParam, Leaf, Node};
use crate::error::ResolveError;
use std::collections::BTreeSet;

/// A selected query definition, borrowed from the tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate<'t> {
    /// `None` for a directory without its own query: an empty record set.
    pub query: Option<&'t str>,
    pub params: &'t [DeclaredParam],
    pub role: &'t str,
}

impl<'t> From<&'t Leaf> for Candidate<'t> {
    fn from(leaf: &'t Leaf) -> Self {
        Candidate {
            query: Some(&leaf.query),
            params: &leaf.params,
            role: &leaf.role,
        }
    }
}

fn matches(params: &[DeclaredParam], supplied: &BTreeSet<&str>) -> bool {
    caller_param_set(params) == *supplied
}

/// Exact set equality on caller parameters; context parameters are ignored.
/// Variants are tried in declaration order and the first match wins.
pub fn select_variant<'t>(
    node: &'t Node,
    supplied: &BTreeSet<&str>,
    path: &str,
) -> Result<Candidate<'t>, ResolveError> {
    let selected = match node {
        Node::Leaf(leaf) => matches(&leaf.params, supplied).then(|| Candidate::from(leaf)),
        Node::Variants(variants) => variants
            .iter()
            .find(|leaf| matches(&leaf.params, supplied))
            .map(Candidate::from),
        Node::Directory(dir) => matches(&dir.params, supplied).then(|| Candidate {
            query: dir.query.as_deref(),
            params: &dir.params,
            role: &dir.role,
        }),
    };
    selected.ok_or_else(|| ResolveError::BadParams {
        path: path.to_string(),
        supplied: supplied.iter().map(|s| s.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_namespace_str, NamespaceTree};

    fn tree() -> NamespaceTree {
        load_namespace_str(
            r#"{"role": "reader", "children": {
                "posts": {"query": "SELECT * FROM posts WHERE thread_id = ?", "params": ["thread_id"]},
                "filtered": [
                    {"query": "SELECT * FROM t"},
                    {"query": "SELECT * FROM t WHERE col1 = ?", "params": ["col1_filter"]},
                    {"query": "SELECT * FROM t WHERE col1 = ? AND col2 = ?", "params": ["col1_filter", "col2_filter"]}
                ],
                "mine": {"query": "SELECT * FROM t WHERE owner = ?", "params": ["?users_id"]},
                "dir": {"children": {"x": {"query": "X"}}}
            }}"#,
        )
        .unwrap()
    }

    fn set<'a>(names: &[&'a str]) -> BTreeSet<&'a str> {
        names.iter().copied().collect()
    }

    fn node<'t>(tree: &'t NamespaceTree, key: &str) -> &'t Node {
        tree.root.child(key).unwrap()
    }

    #[test]
    fn leaf_requires_exact_parameter_set() {
        let tree = tree();
        let posts = node(&tree, "posts");
        assert!(select_variant(posts, &set(&["thread_id"]), "posts").is_ok());
        assert!(matches!(
            select_variant(posts, &set(&[]), "posts"),
            Err(ResolveError::BadParams { .. })
        ));
        assert_eq!(
            select_variant(posts, &set(&["thread_id", "extra"]), "posts"),
            Err(ResolveError::BadParams {
                path: "posts".into(),
                supplied: vec!["extra".into(), "thread_id".into()]
            })
        );
    }

    #[test]
    fn variants_are_disambiguated_by_parameter_names() {
        let tree = tree();
        let filtered = node(&tree, "filtered");
        let none = select_variant(filtered, &set(&[]), "filtered").unwrap();
        assert_eq!(none.query, Some("SELECT * FROM t"));
        let one = select_variant(filtered, &set(&["col1_filter"]), "filtered").unwrap();
        assert_eq!(one.query, Some("SELECT * FROM t WHERE col1 = ?"));
        let two = select_variant(filtered, &set(&["col2_filter", "col1_filter"]), "filtered").unwrap();
        assert_eq!(two.params.len(), 2);
        assert!(select_variant(filtered, &set(&["col2_filter"]), "filtered").is_err());
    }

    #[test]
    fn context_params_are_excluded_from_matching() {
        let tree = tree();
        let mine = node(&tree, "mine");
        assert!(select_variant(mine, &set(&[]), "mine").is_ok());
        assert!(select_variant(mine, &set(&["users_id"]), "mine").is_err());
    }

    #[test]
    fn directory_without_query_selects_an_empty_candidate() {
        let tree = tree();
        let dir = node(&tree, "dir");
        let candidate = select_variant(dir, &set(&[]), "dir").unwrap();
        assert_eq!(candidate.query, None);
        assert_eq!(candidate.role, "reader");
        assert!(select_variant(dir, &set(&["x"]), "dir").is_err());
    }
}

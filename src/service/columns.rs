//! Startup check that every alternative in a variant list yields the same columns.

use crate::config::{Leaf, NamespaceTree, Node};
use crate::error::AppError;
use sqlx::{Column, Executor, SqlitePool, Statement};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VariantColumnIssue {
    /// Alternative `index` reports different column names than alternative 0.
    Mismatch {
        path: String,
        index: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },
    /// The template could not be prepared against the current schema.
    Unpreparable {
        path: String,
        index: usize,
        error: String,
    },
}

impl std::fmt::Display for VariantColumnIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariantColumnIssue::Mismatch {
                path,
                index,
                expected,
                found,
            } => write!(
                f,
                "/{} variant {} returns {:?}, variant 0 returns {:?}",
                path, index, found, expected
            ),
            VariantColumnIssue::Unpreparable { path, index, error } => {
                write!(f, "/{} variant {} cannot be prepared: {}", path, index, error)
            }
        }
    }
}

/// Prepare each alternative of each variant list and compare column names.
pub async fn check_variant_columns(
    pool: &SqlitePool,
    tree: &NamespaceTree,
) -> Result<Vec<VariantColumnIssue>, AppError> {
    let mut lists = Vec::new();
    let mut path = Vec::new();
    for (key, node) in tree.root.children_in_order() {
        collect_variant_lists(key, node, &mut path, &mut lists);
    }

    let mut issues = Vec::new();
    for (path, variants) in lists {
        let mut expected: Option<Vec<String>> = None;
        for (index, leaf) in variants.iter().enumerate() {
            let found = match pool.prepare(leaf.query.as_str()).await {
                Ok(stmt) => stmt
                    .columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect::<Vec<_>>(),
                Err(e) => {
                    issues.push(VariantColumnIssue::Unpreparable {
                        path: path.clone(),
                        index,
                        error: e.to_string(),
                    });
                    continue;
                }
            };
            match &expected {
                None => expected = Some(found),
                Some(exp) if *exp != found => issues.push(VariantColumnIssue::Mismatch {
                    path: path.clone(),
                    index,
                    expected: exp.clone(),
                    found,
                }),
                Some(_) => {}
            }
        }
    }
    Ok(issues)
}

fn collect_variant_lists<'t>(
    key: &str,
    node: &'t Node,
    path: &mut Vec<String>,
    out: &mut Vec<(String, &'t [Leaf])>,
) {
    path.push(key.to_string());
    match node {
        Node::Variants(variants) => out.push((path.join("/"), variants.as_slice())),
        Node::Directory(dir) => {
            for (child_key, child) in dir.children_in_order() {
                collect_variant_lists(child_key, child, path, out);
            }
        }
        Node::Leaf(_) => {}
    }
    path.pop();
}

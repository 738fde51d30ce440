//! Resolution pipeline: path -> variant -> bound values -> role check.
//!
//! Pure and synchronous. The tree is shared read-only; everything produced here
//! is request-local. Stages run in a fixed order and a failure stops the pipeline,
//! so a bad path or parameter set is reported before the role is checked.

pub mod access;
pub mod bind;
pub mod path;
pub mod variant;

pub use access::authorize;
pub use bind::bind_params;
pub use path::resolve_path;
pub use variant::{select_variant, Candidate};

use crate::config::NamespaceTree;
use crate::error::ResolveError;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Caller-supplied parameters: strings from the query string (lists for repeated keys)
/// or any JSON value from a request body.
pub type Params = BTreeMap<String, Value>;

/// Request-scoped identity, produced by the session layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Caller {
    pub identity: Option<String>,
    pub roles: HashSet<String>,
}

impl Caller {
    pub fn new<I, S>(identity: Option<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Caller {
            identity,
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn anonymous() -> Self {
        Caller::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// A bound, role-checked query ready for the executor.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedQuery {
    pub path: String,
    /// `None`: the node has no query of its own and yields an empty record set.
    pub query: Option<String>,
    pub values: Vec<Value>,
    pub role: String,
}

/// Run the whole pipeline for one request.
pub fn resolve<S: AsRef<str>>(
    tree: &NamespaceTree,
    segments: &[S],
    params: &Params,
    caller: &Caller,
) -> Result<ResolvedQuery, ResolveError> {
    let path = segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("/");

    let node = resolve_path(tree, segments)?;
    tracing::debug!(path = %path, "path resolved");

    let supplied: BTreeSet<&str> = params.keys().map(String::as_str).collect();
    let candidate = select_variant(node, &supplied, &path)?;
    tracing::debug!(path = %path, params = ?supplied, "variant selected");

    let values = bind_params(&candidate, params, caller, &path)?;
    tracing::debug!(path = %path, bound = values.len(), "params bound");

    authorize(candidate.role, &caller.roles, &path)?;
    tracing::debug!(path = %path, role = candidate.role, "authorized");

    Ok(ResolvedQuery {
        path,
        query: candidate.query.map(String::from),
        values,
        role: candidate.role.to_string(),
    })
}

//! Order parameter values to match the template's positional markers.

use crate::config::{ContextKey, DeclaredParam};
use crate::error::ResolveError;
use crate::resolve::variant::Candidate;
use crate::resolve::{Caller, Params};
use serde_json::Value;

/// One value per declared parameter, in declaration order. Context parameters come
/// from `caller`, never from `supplied`. Values are never spliced into the template.
pub fn bind_params(
    candidate: &Candidate<'_>,
    supplied: &Params,
    caller: &Caller,
    path: &str,
) -> Result<Vec<Value>, ResolveError> {
    candidate
        .params
        .iter()
        .map(|param| match param {
            DeclaredParam::Context(key) => Ok(context_value(*key, caller)),
            DeclaredParam::Caller(name) => supplied.get(name).cloned().ok_or_else(|| {
                // Selection already checked the name set; reaching here is a bug.
                tracing::error!(path, param = %name, "declared parameter missing after selection");
                ResolveError::Binding {
                    path: path.to_string(),
                    name: name.clone(),
                }
            }),
        })
        .collect()
}

fn context_value(key: ContextKey, caller: &Caller) -> Value {
    match key {
        ContextKey::CallerIdentity => caller
            .identity
            .as_ref()
            .map(|id| Value::String(id.clone()))
            .unwrap_or(Value::Null),
    }
}

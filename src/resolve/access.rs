//! Role gate, evaluated after the query has been resolved and bound.

use crate::error::ResolveError;
use std::collections::HashSet;

pub fn authorize(required: &str, roles: &HashSet<String>, path: &str) -> Result<(), ResolveError> {
    if roles.contains(required) {
        Ok(())
    } else {
        Err(ResolveError::Unauthorized {
            path: path.to_string(),
            required: required.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn member_role_is_allowed() {
        assert!(authorize("reader", &roles(&["reader", "poster"]), "posts").is_ok());
    }

    #[test]
    fn missing_role_is_rejected() {
        assert_eq!(
            authorize("poster", &roles(&["reader"]), "posts"),
            Err(ResolveError::Unauthorized {
                path: "posts".into(),
                required: "poster".into()
            })
        );
        assert!(authorize("reader", &HashSet::new(), "posts").is_err());
    }
}

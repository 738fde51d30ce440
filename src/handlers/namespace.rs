//! Fallback handler: every method and path lands here.
//! Path segments after the proxy prefix pick a built-in or a namespace node; query
//! string and JSON body are merged into one parameter map.

use crate::error::{AppError, ResolveError};
use crate::extractors::SessionCookie;
use crate::handlers::{session, Rejection};
use crate::resolve::{resolve, Caller, Params};
use crate::response::{json_response, session_cookie, CookieUpdate};
use crate::service::QueryService;
use crate::session::SessionId;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::Response,
};
use serde_json::Value;

pub const REGISTER_SEGMENT: &str = "_register";
pub const SESSIONS_SEGMENT: &str = "_sessions";

pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    SessionCookie(cookie): SessionCookie,
    body: Bytes,
) -> Result<Response, Rejection> {
    let segments = path_segments(uri.path(), state.settings.skip);
    let mut params = query_params(&uri)?;
    merge_body(&mut params, &body)?;

    let Some(first) = segments.first() else {
        return Err(ResolveError::EmptyPath.into());
    };

    let session_id = cookie.as_deref().and_then(|raw| raw.parse::<SessionId>().ok());
    let caller = match session_id {
        Some(id) => state.sessions.lookup(id).await?,
        None => None,
    };
    if cookie.is_some() && caller.is_none() && first != SESSIONS_SEGMENT {
        let cleared = session_cookie(
            CookieUpdate::Clear,
            &state.settings.domain,
            state.settings.session_hours,
        );
        return Err(
            Rejection::new(AppError::Unauthenticated("no such valid session".into()))
                .with_cookie(cleared),
        );
    }
    let caller = caller.unwrap_or_else(Caller::anonymous);

    match first.as_str() {
        REGISTER_SEGMENT => session::register(&state, &method, &params).await,
        SESSIONS_SEGMENT => session::sessions(&state, &method, &headers, session_id, &caller).await,
        _ => run_query(&state, &method, &segments, &params, &caller).await,
    }
}

async fn run_query(
    state: &AppState,
    method: &Method,
    segments: &[String],
    params: &Params,
    caller: &Caller,
) -> Result<Response, Rejection> {
    match *method {
        Method::GET | Method::POST => {
            let resolved = resolve(&state.namespace, segments, params, caller)?;
            let outcome = QueryService::execute(&state.pool, &resolved).await?;
            Ok(json_response(StatusCode::OK, &outcome, None))
        }
        Method::DELETE => Err(AppError::NotImplemented("DELETE only supported for sessions".into()).into()),
        _ => Err(AppError::NotImplemented(format!("method {} not supported", method)).into()),
    }
}

/// Non-empty path segments with the first `skip` dropped.
pub fn path_segments(path: &str, skip: usize) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .skip(skip)
        .map(str::to_string)
        .collect()
}

/// Query-string parameters; a repeated key becomes a list of strings.
pub fn query_params(uri: &Uri) -> Result<Params, AppError> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri)
        .map_err(|e| AppError::BadParams(format!("query string: {}", e)))?;
    let mut params = Params::new();
    for (key, value) in pairs {
        match params.get_mut(&key) {
            None => {
                params.insert(key, Value::String(value));
            }
            Some(Value::Array(list)) => list.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
        }
    }
    Ok(params)
}

/// Merge a JSON object body into `params`. A name supplied by both sources is rejected.
pub fn merge_body(params: &mut Params, body: &[u8]) -> Result<(), AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::BadParams(format!("request body is not valid JSON: {}", e)))?;
    let Value::Object(fields) = value else {
        return Err(AppError::BadParams("request body must be a JSON object".into()));
    };
    let mut twice: Vec<&str> = fields
        .keys()
        .filter(|k| params.contains_key(k.as_str()))
        .map(String::as_str)
        .collect();
    if !twice.is_empty() {
        twice.sort_unstable();
        return Err(AppError::BadParams(format!(
            "parameters defined twice: {}",
            twice.join(", ")
        )));
    }
    params.extend(fields);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn segments_drop_empty_parts_and_prefix() {
        assert_eq!(path_segments("/api//threads/mine/", 1), vec!["threads", "mine"]);
        assert_eq!(path_segments("/threads", 0), vec!["threads"]);
        assert!(path_segments("/api/", 1).is_empty());
        assert!(path_segments("/", 0).is_empty());
    }

    #[test]
    fn repeated_query_keys_become_lists() {
        let uri: Uri = "/api/posts?a=1&b=x&a=2&a=3".parse().unwrap();
        let params = query_params(&uri).unwrap();
        assert_eq!(params["a"], json!(["1", "2", "3"]));
        assert_eq!(params["b"], json!("x"));
    }

    #[test]
    fn query_values_are_percent_decoded() {
        let uri: Uri = "/api/posts?text=hello%20world&n=a+b".parse().unwrap();
        let params = query_params(&uri).unwrap();
        assert_eq!(params["text"], json!("hello world"));
        assert_eq!(params["n"], json!("a b"));
    }

    #[test]
    fn body_merges_with_query() {
        let mut params = Params::new();
        params.insert("a".into(), json!("1"));
        merge_body(&mut params, br#"{"b": 2, "c": [1, 2]}"#).unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(params["b"], json!(2));
    }

    #[test]
    fn blank_body_is_ignored() {
        let mut params = Params::new();
        merge_body(&mut params, b"").unwrap();
        merge_body(&mut params, b"  \n").unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn body_rejects_duplicates_and_non_objects() {
        let mut params = Params::new();
        params.insert("a".into(), json!("1"));
        let err = merge_body(&mut params, br#"{"a": 2}"#).unwrap_err();
        assert!(matches!(err, AppError::BadParams(ref m) if m.contains("a")));
        assert!(matches!(merge_body(&mut params, b"[1]"), Err(AppError::BadParams(_))));
        assert!(matches!(merge_body(&mut params, b"{nope"), Err(AppError::BadParams(_))));
    }
}

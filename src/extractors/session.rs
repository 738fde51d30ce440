//! Extract the session cookie and Basic credentials from request headers.

use crate::response::SESSION_COOKIE;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use base64::Engine;

/// Raw value of the `sessions_id` cookie, if present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionCookie(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for SessionCookie
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SessionCookie(cookie_value(&parts.headers, SESSION_COOKIE)))
    }
}

/// First value of the named cookie across all `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim().trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
}

/// Outcome of reading an `Authorization` header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BasicAuth {
    Missing,
    Malformed,
    Credentials { user: String, password: String },
}

/// Parse `Authorization: Basic base64(user:password)`. Other schemes count as missing.
pub fn basic_auth(headers: &HeaderMap) -> BasicAuth {
    let Some(value) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        return BasicAuth::Missing;
    };
    let Some((scheme, encoded)) = value.trim().split_once(' ') else {
        return BasicAuth::Missing;
    };
    if !scheme.eq_ignore_ascii_case("basic") {
        return BasicAuth::Missing;
    }
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok());
    match decoded.as_deref().and_then(|s| s.split_once(':')) {
        Some((user, password)) => BasicAuth::Credentials {
            user: user.to_string(),
            password: password.to_string(),
        },
        None => BasicAuth::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(name, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn finds_session_cookie_among_others() {
        let h = headers(header::COOKIE, "theme=dark; sessions_id=12345; x=y");
        assert_eq!(cookie_value(&h, SESSION_COOKIE).as_deref(), Some("12345"));
        assert_eq!(cookie_value(&h, "missing"), None);
    }

    #[test]
    fn empty_cookie_counts_as_absent() {
        let h = headers(header::COOKIE, "sessions_id=");
        assert_eq!(cookie_value(&h, SESSION_COOKIE), None);
    }

    #[test]
    fn parses_basic_credentials() {
        // "alice:pa:ss" keeps everything after the first colon as the password.
        let h = headers(header::AUTHORIZATION, "Basic YWxpY2U6cGE6c3M=");
        assert_eq!(
            basic_auth(&h),
            BasicAuth::Credentials {
                user: "alice".into(),
                password: "pa:ss".into()
            }
        );
    }

    #[test]
    fn other_schemes_and_garbage() {
        assert_eq!(basic_auth(&HeaderMap::new()), BasicAuth::Missing);
        assert_eq!(basic_auth(&headers(header::AUTHORIZATION, "Bearer abc")), BasicAuth::Missing);
        assert_eq!(basic_auth(&headers(header::AUTHORIZATION, "basic !!!")), BasicAuth::Malformed);
        // base64("nocolon")
        assert_eq!(
            basic_auth(&headers(header::AUTHORIZATION, "Basic bm9jb2xvbg==")),
            BasicAuth::Malformed
        );
    }
}

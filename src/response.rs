//! Response helpers: bare JSON bodies, no-cache headers and the session cookie.

use crate::session::SessionId;
use axum::http::header::{CACHE_CONTROL, SET_COOKIE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub const SESSION_COOKIE: &str = "sessions_id";

/// Cookie change to send with a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CookieUpdate {
    Set(SessionId),
    Clear,
}

/// `Set-Cookie` value for the session cookie.
pub fn session_cookie(update: CookieUpdate, domain: &str, session_hours: u32) -> String {
    let (value, max_age) = match update {
        CookieUpdate::Set(id) => (id.to_string(), u64::from(session_hours) * 60 * 60),
        CookieUpdate::Clear => (String::new(), 0),
    };
    format!(
        "{}={}; HttpOnly; Secure; Path=/; Domain={}; Max-Age={}",
        SESSION_COOKIE, value, domain, max_age
    )
}

/// JSON body with private, cookie-aware cache headers and an optional cookie.
pub fn json_response<T: Serialize>(status: StatusCode, body: &T, cookie: Option<String>) -> Response {
    let mut resp = (status, Json(body)).into_response();
    with_cache_headers(&mut resp, cookie);
    resp
}

/// Adds `Cache-Control` and, when valid, `Set-Cookie` to an existing response.
pub fn with_cache_headers(resp: &mut Response, cookie: Option<String>) {
    let headers = resp.headers_mut();
    headers.append(CACHE_CONTROL, HeaderValue::from_static("no-cache=\"set-cookie\""));
    headers.append(CACHE_CONTROL, HeaderValue::from_static("private"));
    if let Some(cookie) = cookie {
        match HeaderValue::from_str(&cookie) {
            Ok(v) => {
                headers.append(SET_COOKIE, v);
            }
            Err(_) => tracing::warn!("session cookie is not a valid header value; check --domain"),
        }
    }
}

//! HTTP handlers: namespace dispatch plus the `_register` and `_sessions` built-ins.

pub mod namespace;
pub mod session;

pub use namespace::dispatch;

use crate::error::{AppError, ResolveError};
use crate::response::with_cache_headers;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};

const BASIC_CHALLENGE: &str = "Basic realm=\"namespace-backend\"";

/// Handler failure together with the headers that must accompany it.
#[derive(Debug)]
pub struct Rejection {
    pub error: AppError,
    cookie: Option<String>,
    challenge: bool,
}

impl Rejection {
    pub fn new(error: AppError) -> Self {
        Rejection {
            error,
            cookie: None,
            challenge: false,
        }
    }

    pub fn with_cookie(mut self, cookie: String) -> Self {
        self.cookie = Some(cookie);
        self
    }

    /// Ask the client for Basic credentials.
    pub fn with_challenge(mut self) -> Self {
        self.challenge = true;
        self
    }
}

impl From<AppError> for Rejection {
    fn from(error: AppError) -> Self {
        Rejection::new(error)
    }
}

impl From<ResolveError> for Rejection {
    fn from(error: ResolveError) -> Self {
        Rejection::new(error.into())
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let mut resp = self.error.into_response();
        with_cache_headers(&mut resp, self.cookie);
        if self.challenge {
            resp.headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static(BASIC_CHALLENGE));
        }
        resp
    }
}

//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Namespace file problems. Fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config load: {0}")]
    Load(String),
    #[error("parse: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("root node must be a directory with children")]
    RootNotDirectory,
    #[error("node at {path} has neither 'query' nor 'children'")]
    EmptyNode { path: String },
    #[error("variant {index} at {path} cannot have children")]
    VariantWithChildren { path: String, index: usize },
    #[error("variant list at {path} is empty")]
    EmptyVariantList { path: String },
    #[error("variants {first} and {second} at {path} declare the same parameter set {params:?}")]
    AmbiguousVariants {
        path: String,
        first: usize,
        second: usize,
        params: Vec<String>,
    },
    #[error("node at {path} declares parameter '{name}' more than once")]
    DuplicateParam { path: String, name: String },
    #[error("node at {path} has an empty parameter name")]
    EmptyParamName { path: String },
    #[error("unknown context parameter '?{name}' at {path}")]
    UnknownContextParam { path: String, name: String },
    #[error("no role declared for {path} or any enclosing node")]
    MissingRole { path: String },
    #[error("top-level key '{0}' is reserved: names starting with '_' belong to built-in routes")]
    ReservedName(String),
    #[error("duplicate child key '{0}'")]
    DuplicateChild(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Failures raised by the resolution pipeline. None of them are retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no path specified")]
    EmptyPath,
    #[error("couldn't find '{segment}' in namespace (unmatched: /{remaining})")]
    NotFound { segment: String, remaining: String },
    #[error("parameters {supplied:?} do not match any query at /{path}")]
    BadParams { path: String, supplied: Vec<String> },
    #[error("no value bound for declared parameter '{name}' at /{path}")]
    Binding { path: String, name: String },
    #[error("role '{required}' required for /{path}")]
    Unauthorized { path: String, required: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("authentication: {0}")]
    Unauthenticated(String),
    #[error("bad parameters: {0}")]
    BadParams(String),
    #[error("not implemented: {0}")]
    NotImplemented(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

impl AppError {
    /// Status code and machine-readable kind for the error body.
    pub fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Resolve(e) => match e {
                ResolveError::EmptyPath | ResolveError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "not_found")
                }
                ResolveError::BadParams { .. } => (StatusCode::BAD_REQUEST, "bad_params"),
                ResolveError::Binding { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "binding_error")
                }
                ResolveError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "unauthorized"),
            },
            AppError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "authentication_error"),
            AppError::BadParams(_) => (StatusCode::BAD_REQUEST, "bad_params"),
            AppError::NotImplemented(_) => (StatusCode::NOT_IMPLEMENTED, "not_implemented"),
            AppError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "execution_error"),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            tracing::error!(error = %self, kind, "request failed");
        } else {
            tracing::debug!(error = %self, kind, "request rejected");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                kind: kind.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

//! Route assembly.

pub mod common;
pub mod namespace;

pub use common::common_routes;
pub use namespace::namespace_routes;

use crate::state::AppState;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

/// The full application router with the body size limit applied.
pub fn app(state: AppState) -> Router {
    let limit = state.settings.max_body_bytes;
    common_routes(state.clone())
        .merge(namespace_routes(state))
        .layer(RequestBodyLimitLayer::new(limit))
}

//! Everything that is not a common route goes through namespace dispatch.

use crate::handlers::dispatch;
use crate::state::AppState;
use axum::Router;

pub fn namespace_routes(state: AppState) -> Router {
    Router::new().fallback(dispatch).with_state(state)
}

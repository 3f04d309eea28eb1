//! Route definitions for the public `/config` reference data.

use axum::routing::get;
use axum::Router;

use crate::handlers::config;
use crate::state::AppState;

/// Routes mounted at `/config`.
///
/// ```text
/// GET    /channels          -> list_channels
/// GET    /opt-out-reasons   -> list_opt_out_reasons
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/channels", get(config::list_channels))
        .route("/opt-out-reasons", get(config::list_opt_out_reasons))
}

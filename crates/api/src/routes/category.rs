//! Route definitions for the public `/notification-categories` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::category;
use crate::state::AppState;

/// Routes mounted at `/notification-categories`.
///
/// ```text
/// GET    /        -> list_active
/// GET    /{id}    -> get_category
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(category::list_active))
        .route("/{id}", get(category::get_category))
}

//! Route definitions for the `/admin` resource.
//!
//! All endpoints require the admin role (enforced by the handlers'
//! `RequireAdmin` extractor).

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{category, quarantine};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// POST   /notification-categories          -> create_category
/// PUT    /notification-categories/{id}     -> update_category
/// DELETE /notification-categories/{id}     -> delete_category
///
/// GET    /phone/quarantined                -> list_quarantined
/// GET    /phone/quarantine/stats           -> stats
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        // Category management
        .route("/notification-categories", post(category::create_category))
        .route(
            "/notification-categories/{id}",
            put(category::update_category).delete(category::delete_category),
        )
        // Quarantine reporting
        .route("/phone/quarantined", get(quarantine::list_quarantined))
        .route("/phone/quarantine/stats", get(quarantine::stats))
}

//! Route definitions for the `/citizen` resource.
//!
//! All endpoints require authentication; the caller must own the CPF or be
//! an admin.

use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::citizen;
use crate::state::AppState;

/// Routes mounted at `/citizen`.
///
/// ```text
/// GET    /{cpf}/notification-preferences                  -> get_preferences
/// PUT    /{cpf}/notification-preferences                  -> update_preferences
/// PATCH  /{cpf}/notification-preferences/categories/{id}  -> update_category_preference
/// GET    /{cpf}/opt-in-history                            -> opt_in_history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{cpf}/notification-preferences",
            get(citizen::get_preferences).put(citizen::update_preferences),
        )
        .route(
            "/{cpf}/notification-preferences/categories/{category_id}",
            patch(citizen::update_category_preference),
        )
        .route("/{cpf}/opt-in-history", get(citizen::opt_in_history))
}

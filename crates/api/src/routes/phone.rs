//! Route definitions for the `/phone` resource.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::phone;
use crate::state::AppState;

/// Routes mounted at `/phone`.
///
/// ```text
/// GET    /{phone}/status                                    -> get_phone_status
/// GET    /{phone}/citizen                                   -> find_citizen
/// POST   /{phone}/validate-registration                     -> validate_registration
/// POST   /{phone}/opt-in                                    -> opt_in
/// POST   /{phone}/opt-out                                   -> opt_out
/// POST   /{phone}/reject-registration                       -> reject_registration
/// POST   /{phone}/bind                                      -> bind
/// POST   /{phone}/quarantine                                -> quarantine
/// DELETE /{phone}/quarantine                                -> release_quarantine
/// GET    /{phone}/notification-preferences                  -> get_preferences
/// PUT    /{phone}/notification-preferences                  -> update_preferences
/// PATCH  /{phone}/notification-preferences/categories/{id}  -> update_category_preference
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        // Lookups
        .route("/{phone}/status", get(phone::get_phone_status))
        .route("/{phone}/citizen", get(phone::find_citizen))
        .route(
            "/{phone}/validate-registration",
            post(phone::validate_registration),
        )
        // Lifecycle
        .route("/{phone}/opt-in", post(phone::opt_in))
        .route("/{phone}/opt-out", post(phone::opt_out))
        .route(
            "/{phone}/reject-registration",
            post(phone::reject_registration),
        )
        .route("/{phone}/bind", post(phone::bind))
        .route(
            "/{phone}/quarantine",
            post(phone::quarantine).delete(phone::release_quarantine),
        )
        // Preferences
        .route(
            "/{phone}/notification-preferences",
            get(phone::get_preferences).put(phone::update_preferences),
        )
        .route(
            "/{phone}/notification-preferences/categories/{category_id}",
            patch(phone::update_category_preference),
        )
}

pub mod admin;
pub mod category;
pub mod citizen;
pub mod config;
pub mod health;
pub mod phone;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /phone/{phone}/status                                         public
/// /phone/{phone}/citizen                                        masked citizen lookup (auth)
/// /phone/{phone}/validate-registration                          identity check (auth)
/// /phone/{phone}/opt-in                                         opt in (own CPF or admin)
/// /phone/{phone}/opt-out                                        opt out (auth)
/// /phone/{phone}/reject-registration                            reject (own CPF or admin)
/// /phone/{phone}/bind                                           bind to CPF (admin)
/// /phone/{phone}/quarantine                                     quarantine, release (admin)
/// /phone/{phone}/notification-preferences                       get, update (admin)
/// /phone/{phone}/notification-preferences/categories/{id}       toggle one category (admin)
///
/// /citizen/{cpf}/notification-preferences                       get, update (own CPF or admin)
/// /citizen/{cpf}/notification-preferences/categories/{id}       toggle one category
/// /citizen/{cpf}/opt-in-history                                 audit trail
///
/// /notification-categories                                      list active (public)
/// /notification-categories/{id}                                 get (public)
///
/// /admin/notification-categories                                create (admin)
/// /admin/notification-categories/{id}                           update, soft delete (admin)
/// /admin/phone/quarantined                                      paginated listing (admin)
/// /admin/phone/quarantine/stats                                 counters (admin)
///
/// /config/channels                                              channel catalog (public)
/// /config/opt-out-reasons                                       opt-out reasons (public)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Phone lifecycle and phone-side preferences.
        .nest("/phone", phone::router())
        // CPF-side preferences and history.
        .nest("/citizen", citizen::router())
        // Public category catalog.
        .nest("/notification-categories", category::router())
        // Admin-only management.
        .nest("/admin", admin::router())
        // Reference data.
        .nest("/config", config::router())
}

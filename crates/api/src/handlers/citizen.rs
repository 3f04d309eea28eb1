//! Handlers for the `/citizen/{cpf}` resource.
//!
//! A citizen may only reach their own CPF; admins may reach any.

use axum::extract::{Path, State};
use axum::Json;
use citizen_core::cpf::normalize_cpf;
use citizen_db::models::opt_in_history::OptInHistory;
use citizen_db::models::preference_request::{
    UpdateCategoryPreferenceRequest, UpdatePreferencesRequest,
};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::services::preferences::{ChangeOrigin, CitizenPreferences};
use crate::state::AppState;

/// Normalize the path CPF and check the caller may access it.
fn authorize(auth: &AuthUser, raw_cpf: &str) -> AppResult<String> {
    let cpf = normalize_cpf(raw_cpf)?;
    auth.ensure_cpf_access(&cpf)?;
    Ok(cpf)
}

/// GET /api/v1/citizen/{cpf}/notification-preferences
pub async fn get_preferences(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(cpf): Path<String>,
) -> AppResult<Json<DataResponse<CitizenPreferences>>> {
    let cpf = authorize(&auth, &cpf)?;
    let config = state
        .preferences
        .citizen_preferences(&cpf, chrono::Utc::now())
        .await?;
    Ok(Json(DataResponse {
        data: config.into(),
    }))
}

/// PUT /api/v1/citizen/{cpf}/notification-preferences
pub async fn update_preferences(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(cpf): Path<String>,
    Json(input): Json<UpdatePreferencesRequest>,
) -> AppResult<Json<DataResponse<CitizenPreferences>>> {
    let cpf = authorize(&auth, &cpf)?;
    let update = input.update();
    let origin = ChangeOrigin {
        channel: input.channel,
        reason: input.reason,
    };
    let config = state
        .preferences
        .update_citizen_preferences(&cpf, update, origin, chrono::Utc::now())
        .await?;
    Ok(Json(DataResponse {
        data: config.into(),
    }))
}

/// PATCH /api/v1/citizen/{cpf}/notification-preferences/categories/{category_id}
pub async fn update_category_preference(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((cpf, category_id)): Path<(String, String)>,
    Json(input): Json<UpdateCategoryPreferenceRequest>,
) -> AppResult<Json<DataResponse<CitizenPreferences>>> {
    let cpf = authorize(&auth, &cpf)?;
    let origin = ChangeOrigin {
        channel: input.channel,
        reason: input.reason,
    };
    let config = state
        .preferences
        .update_citizen_category(&cpf, &category_id, input.opt_in, origin, chrono::Utc::now())
        .await?;
    Ok(Json(DataResponse {
        data: config.into(),
    }))
}

/// GET /api/v1/citizen/{cpf}/opt-in-history
///
/// Every recorded opt-in change for the citizen, oldest first.
pub async fn opt_in_history(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(cpf): Path<String>,
) -> AppResult<Json<DataResponse<Vec<OptInHistory>>>> {
    let cpf = authorize(&auth, &cpf)?;
    let entries = state.history.list_for_cpf(&cpf).await?;
    Ok(Json(DataResponse { data: entries }))
}

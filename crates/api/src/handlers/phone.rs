//! Handlers for the `/phone/{phone}` resource.
//!
//! The status lookup is public. Citizen actions require authentication and,
//! when they name a CPF, that CPF must be the caller's own unless the caller
//! is an admin. Binding, quarantine and direct preference edits are
//! admin-only.

use axum::extract::{Path, State};
use axum::Json;
use citizen_core::cpf::normalize_cpf;
use citizen_db::models::phone_mapping::{
    BindPhoneRequest, OptInRequest, OptOutRequest, RejectRegistrationRequest,
    ValidateRegistrationRequest,
};
use citizen_db::models::preference_request::{
    UpdateCategoryPreferenceRequest, UpdatePreferencesRequest,
};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::services::phone_mapping::{
    CitizenLookup, PhoneAction, PhoneStatus, RegistrationValidation,
};
use crate::services::preferences::{ChangeOrigin, PhonePreferences};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// GET /api/v1/phone/{phone}/status
pub async fn get_phone_status(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> AppResult<Json<DataResponse<PhoneStatus>>> {
    let status = state
        .phone_mappings
        .phone_status(&phone, chrono::Utc::now())
        .await?;
    Ok(Json(DataResponse { data: status }))
}

/// GET /api/v1/phone/{phone}/citizen
///
/// Masked identity of the citizen linked to the phone.
pub async fn find_citizen(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> AppResult<Json<DataResponse<CitizenLookup>>> {
    let lookup = state
        .phone_mappings
        .find_citizen(&phone, chrono::Utc::now())
        .await?;
    Ok(Json(DataResponse { data: lookup }))
}

/// POST /api/v1/phone/{phone}/validate-registration
pub async fn validate_registration(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(phone): Path<String>,
    Json(input): Json<ValidateRegistrationRequest>,
) -> AppResult<Json<DataResponse<RegistrationValidation>>> {
    let result = state
        .phone_mappings
        .validate_registration(&phone, input)
        .await?;
    Ok(Json(DataResponse { data: result }))
}

// ---------------------------------------------------------------------------
// Citizen actions
// ---------------------------------------------------------------------------

/// POST /api/v1/phone/{phone}/opt-in
pub async fn opt_in(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(phone): Path<String>,
    Json(input): Json<OptInRequest>,
) -> AppResult<Json<DataResponse<PhoneAction>>> {
    auth.ensure_cpf_access(&normalize_cpf(&input.cpf)?)?;
    let action = state
        .phone_mappings
        .opt_in(&phone, input, chrono::Utc::now())
        .await?;
    Ok(Json(DataResponse { data: action }))
}

/// POST /api/v1/phone/{phone}/opt-out
pub async fn opt_out(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(phone): Path<String>,
    Json(input): Json<OptOutRequest>,
) -> AppResult<Json<DataResponse<PhoneAction>>> {
    let action = state
        .phone_mappings
        .opt_out(&phone, input, chrono::Utc::now())
        .await?;
    Ok(Json(DataResponse { data: action }))
}

/// POST /api/v1/phone/{phone}/reject-registration
pub async fn reject_registration(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(phone): Path<String>,
    Json(input): Json<RejectRegistrationRequest>,
) -> AppResult<Json<DataResponse<PhoneAction>>> {
    auth.ensure_cpf_access(&normalize_cpf(&input.cpf)?)?;
    let action = state
        .phone_mappings
        .reject_registration(&phone, input, chrono::Utc::now())
        .await?;
    Ok(Json(DataResponse { data: action }))
}

// ---------------------------------------------------------------------------
// Admin actions
// ---------------------------------------------------------------------------

/// POST /api/v1/phone/{phone}/bind
pub async fn bind(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(phone): Path<String>,
    Json(input): Json<BindPhoneRequest>,
) -> AppResult<Json<DataResponse<PhoneAction>>> {
    tracing::debug!(admin = %admin.cpf, "Admin binding phone");
    let action = state
        .phone_mappings
        .bind(&phone, input, chrono::Utc::now())
        .await?;
    Ok(Json(DataResponse { data: action }))
}

/// POST /api/v1/phone/{phone}/quarantine
pub async fn quarantine(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> AppResult<Json<DataResponse<PhoneAction>>> {
    let action = state
        .phone_mappings
        .quarantine(&phone, chrono::Utc::now())
        .await?;
    Ok(Json(DataResponse { data: action }))
}

/// DELETE /api/v1/phone/{phone}/quarantine
pub async fn release_quarantine(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> AppResult<Json<DataResponse<PhoneAction>>> {
    let action = state
        .phone_mappings
        .release_quarantine(&phone, chrono::Utc::now())
        .await?;
    Ok(Json(DataResponse { data: action }))
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// GET /api/v1/phone/{phone}/notification-preferences
pub async fn get_preferences(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> AppResult<Json<DataResponse<PhonePreferences>>> {
    let mapping = state.preferences.phone_preferences(&phone).await?;
    Ok(Json(DataResponse {
        data: mapping.into(),
    }))
}

/// PUT /api/v1/phone/{phone}/notification-preferences
///
/// Merges the given values into the phone's preferences and mirrors them
/// onto the linked citizen.
pub async fn update_preferences(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(phone): Path<String>,
    Json(input): Json<UpdatePreferencesRequest>,
) -> AppResult<Json<DataResponse<PhonePreferences>>> {
    let update = input.update();
    let origin = ChangeOrigin {
        channel: input.channel,
        reason: input.reason,
    };
    let mapping = state
        .preferences
        .update_phone_preferences(&phone, update, origin, chrono::Utc::now())
        .await?;
    Ok(Json(DataResponse {
        data: mapping.into(),
    }))
}

/// PATCH /api/v1/phone/{phone}/notification-preferences/categories/{category_id}
pub async fn update_category_preference(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path((phone, category_id)): Path<(String, String)>,
    Json(input): Json<UpdateCategoryPreferenceRequest>,
) -> AppResult<Json<DataResponse<PhonePreferences>>> {
    let origin = ChangeOrigin {
        channel: input.channel,
        reason: input.reason,
    };
    let mapping = state
        .preferences
        .update_phone_category(&phone, &category_id, input.opt_in, origin, chrono::Utc::now())
        .await?;
    Ok(Json(DataResponse {
        data: mapping.into(),
    }))
}

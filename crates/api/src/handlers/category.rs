//! Handlers for notification categories.
//!
//! Listing and lookup are public; create, update and delete are mounted
//! under `/admin` and require the admin role.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use citizen_db::models::notification_category::{
    CreateNotificationCategory, NotificationCategory, UpdateNotificationCategory,
};

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/notification-categories
pub async fn list_active(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<NotificationCategory>>>> {
    let categories = state.categories.list_active().await?;
    Ok(Json(DataResponse { data: categories }))
}

/// GET /api/v1/notification-categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<NotificationCategory>>> {
    let category = state.categories.get(&id).await?;
    Ok(Json(DataResponse { data: category }))
}

/// POST /api/v1/admin/notification-categories
pub async fn create_category(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateNotificationCategory>,
) -> AppResult<impl IntoResponse> {
    let category = state
        .categories
        .create(input, chrono::Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// PUT /api/v1/admin/notification-categories/{id}
pub async fn update_category(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateNotificationCategory>,
) -> AppResult<Json<DataResponse<NotificationCategory>>> {
    let category = state
        .categories
        .update(&id, input, chrono::Utc::now())
        .await?;
    Ok(Json(DataResponse { data: category }))
}

/// DELETE /api/v1/admin/notification-categories/{id}
///
/// Soft delete. Returns 204 No Content.
pub async fn delete_category(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.categories.delete(&id, chrono::Utc::now()).await?;
    Ok(StatusCode::NO_CONTENT)
}

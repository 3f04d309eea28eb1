//! Admin handlers for quarantine reporting.

use axum::extract::{Query, State};
use axum::Json;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::query::QuarantinedParams;
use crate::response::DataResponse;
use crate::services::phone_mapping::{QuarantineStats, QuarantinedPage};
use crate::state::AppState;

/// GET /api/v1/admin/phone/quarantined?page=&per_page=&expired=
pub async fn list_quarantined(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<QuarantinedParams>,
) -> AppResult<Json<DataResponse<QuarantinedPage>>> {
    let (page, per_page) = params.page_params().resolve();
    let listing = state
        .phone_mappings
        .quarantined_phones(page, per_page, params.expired, chrono::Utc::now())
        .await?;
    Ok(Json(DataResponse { data: listing }))
}

/// GET /api/v1/admin/phone/quarantine/stats
pub async fn stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<QuarantineStats>>> {
    let stats = state
        .phone_mappings
        .quarantine_stats(chrono::Utc::now())
        .await?;
    Ok(Json(DataResponse { data: stats }))
}

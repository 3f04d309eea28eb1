//! Public reference data.

use axum::Json;
use citizen_core::channels::{ChannelInfo, OptOutReason, CHANNELS, OPT_OUT_REASONS};

use crate::response::DataResponse;

/// GET /api/v1/config/channels
pub async fn list_channels() -> Json<DataResponse<&'static [ChannelInfo]>> {
    Json(DataResponse { data: CHANNELS })
}

/// GET /api/v1/config/opt-out-reasons
pub async fn list_opt_out_reasons() -> Json<DataResponse<&'static [OptOutReason]>> {
    Json(DataResponse {
        data: OPT_OUT_REASONS,
    })
}

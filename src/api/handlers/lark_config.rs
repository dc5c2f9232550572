/*
 * Responsibility
 * - GET /api/lark-config?url=...
 * - Query validation -> JsapiSigner::sign_url -> camelCase config DTO
 */
use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    api::dto::lark_config::{LarkConfigQuery, LarkConfigResponse},
    error::AppError,
    state::AppState,
};

pub async fn lark_config(
    State(state): State<AppState>,
    Query(query): Query<LarkConfigQuery>,
) -> Result<Json<LarkConfigResponse>, AppError> {
    let url = query
        .validate()
        .map_err(|msg| AppError::bad_request("BAD_REQUEST", msg))?;

    let signed = state.signer.sign_url(url).await.map_err(|e| {
        tracing::error!(error = %e, url = %url, "failed to generate jsapi config");
        AppError::from(e)
    })?;

    Ok(Json(signed.into()))
}

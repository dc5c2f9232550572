/*
 * Responsibility
 * - POST /api/login { code }
 * - Returns the Lark user info object as-is
 */
use axum::{Json, extract::State};
use serde_json::Value;

use crate::{api::dto::login::LoginRequest, error::AppError, state::AppState};

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let code = req
        .validate()
        .map_err(|msg| AppError::bad_request("BAD_REQUEST", msg))?;

    let info = state.login.login(code).await.map_err(|e| {
        tracing::error!(error = %e, "login failed");
        AppError::from(e)
    })?;

    Ok(Json(info))
}

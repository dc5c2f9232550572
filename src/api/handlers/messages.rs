/*
 * Responsibility
 * - POST /api/send-message, /api/send-card, /api/send-image
 * - DTO validation -> MessageService::send -> upstream `data` as-is
 */
use axum::{Json, extract::State};
use serde_json::Value;

use crate::{
    api::dto::messages::{SendCardRequest, SendImageRequest, SendMessageRequest},
    error::AppError,
    services::lark::MessageContent,
    state::AppState,
};

pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<Value>, AppError> {
    let validated = req.validate();
    dispatch(&state, validated, req.receive_id_type.as_deref()).await
}

pub async fn send_card(
    State(state): State<AppState>,
    Json(req): Json<SendCardRequest>,
) -> Result<Json<Value>, AppError> {
    let validated = req.validate();
    dispatch(&state, validated, req.receive_id_type.as_deref()).await
}

pub async fn send_image(
    State(state): State<AppState>,
    Json(req): Json<SendImageRequest>,
) -> Result<Json<Value>, AppError> {
    let validated = req.validate();
    dispatch(&state, validated, req.receive_id_type.as_deref()).await
}

async fn dispatch(
    state: &AppState,
    validated: Result<(&str, MessageContent), &'static str>,
    receive_id_type: Option<&str>,
) -> Result<Json<Value>, AppError> {
    let (receive_id, content) =
        validated.map_err(|msg| AppError::bad_request("BAD_REQUEST", msg))?;
    let msg_type = content.msg_type();

    let data = state
        .messages
        .send(receive_id, receive_id_type, content)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, msg_type, "send message failed");
            AppError::from(e)
        })?;

    Ok(Json(data))
}

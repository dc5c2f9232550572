/*
 * Responsibility
 * - URL layout of the /api surface (paths the web client already calls)
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::handlers::{
    lark_config::lark_config,
    login::login,
    messages::{send_card, send_image, send_message},
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/lark-config", get(lark_config))
        .route("/login", post(login))
        .route("/send-message", post(send_message))
        .route("/send-card", post(send_card))
        .route("/send-image", post(send_image))
}

//! Web login: authorization code -> user access token -> user info.
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::services::lark::{
    client::{LarkTransport, UpstreamRequest, is_success},
    error::{LarkError, LarkResult},
    paths,
    token::TokenProvider,
};

#[derive(Clone)]
pub struct LoginService {
    tokens: Arc<TokenProvider>,
    transport: Arc<dyn LarkTransport>,
}

impl LoginService {
    pub fn new(tokens: Arc<TokenProvider>, transport: Arc<dyn LarkTransport>) -> Self {
        Self { tokens, transport }
    }

    /// Returns the `data` object of the user info response.
    pub async fn login(&self, code: &str) -> LarkResult<Value> {
        if code.trim().is_empty() {
            return Err(LarkError::validation("Auth code is required"));
        }

        let app_token = self.tokens.get_access_token().await?;

        let token_payload = self
            .call(
                "user_access_token",
                UpstreamRequest::post(paths::USER_ACCESS_TOKEN)
                    .bearer(app_token.secret())
                    .json(json!({ "grant_type": "authorization_code", "code": code })),
            )
            .await?;

        // Older API versions answer with `user_access_token` instead.
        let data = token_payload.get("data").cloned().unwrap_or(Value::Null);
        let user_token = ["access_token", "user_access_token"]
            .iter()
            .find_map(|k| data.get(*k).and_then(Value::as_str).filter(|t| !t.is_empty()))
            .map(str::to_string)
            .ok_or_else(|| {
                warn!("user access token response has no token");
                LarkError::upstream("user_access_token", data.clone())
            })?;

        let info = self
            .call(
                "user_info",
                UpstreamRequest::get(paths::USER_INFO).bearer(user_token),
            )
            .await?;

        debug!("resolved user info for login");
        Ok(info.get("data").cloned().unwrap_or(Value::Null))
    }

    async fn call(&self, operation: &'static str, request: UpstreamRequest) -> LarkResult<Value> {
        let payload = self.transport.send(request).await.map_err(|e| {
            warn!(operation, error = %e, "lark request failed");
            LarkError::upstream(operation, e.into_payload())
        })?;

        if !is_success(&payload) {
            warn!(operation, %payload, "lark request rejected");
            return Err(LarkError::upstream(operation, payload));
        }
        Ok(payload)
    }
}

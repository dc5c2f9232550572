/*
 * Responsibility
 * - GET /api/lark-config query + response DTO
 * - Response field names are what the client SDK `config()` call expects
 */
use serde::{Deserialize, Serialize};

use crate::services::lark::signature::SignatureResult;

#[derive(Debug, Deserialize)]
pub struct LarkConfigQuery {
    pub url: Option<String>,
}

impl LarkConfigQuery {
    pub fn validate(&self) -> Result<&str, &'static str> {
        self.url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or("URL parameter is required")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LarkConfigResponse {
    pub app_id: String,
    pub timestamp: i64,
    pub nonce_str: String,
    pub signature: String,
    pub url: String,
}

impl From<SignatureResult> for LarkConfigResponse {
    fn from(s: SignatureResult) -> Self {
        Self {
            app_id: s.app_id,
            timestamp: s.timestamp,
            nonce_str: s.nonce_str,
            signature: s.signature,
            url: s.url,
        }
    }
}

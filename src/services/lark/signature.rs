//! JSSDK config signatures.
//!
//! The signing string is a bit-exact contract with the client SDK, which
//! recomputes it and compares digests:
//!
//! `jsapi_ticket=<ticket>&noncestr=<nonce>&timestamp=<seconds>&url=<url>`
//!
//! Field order is fixed and the URL is used exactly as supplied (no encoding).
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use sha1::{Digest, Sha1};
use tracing::{debug, warn};

use crate::services::lark::{
    clock::Clock,
    error::{LarkError, LarkResult},
    ticket::TicketService,
    token::TokenProvider,
};

const NONCE_BYTES: usize = 16;

/// Everything the client SDK needs for `config()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureResult {
    pub app_id: String,
    pub timestamp: i64,
    pub nonce_str: String,
    pub signature: String,
    pub url: String,
}

pub fn canonical_string(ticket: &str, nonce_str: &str, timestamp: i64, url: &str) -> String {
    format!("jsapi_ticket={ticket}&noncestr={nonce_str}&timestamp={timestamp}&url={url}")
}

/// Lowercase hex SHA-1 of the canonical string.
pub fn digest(canonical: &str) -> String {
    hex::encode(Sha1::digest(canonical.as_bytes()))
}

/// 16 random bytes, hex encoded (32 chars).
pub fn generate_nonce() -> LarkResult<String> {
    let mut bytes = [0u8; NONCE_BYTES];
    getrandom::fill(&mut bytes).map_err(|e| LarkError::Internal(format!("getrandom failed: {e}")))?;
    Ok(hex::encode(bytes))
}

#[derive(Clone)]
pub struct JsapiSigner {
    tokens: Arc<TokenProvider>,
    tickets: TicketService,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for JsapiSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsapiSigner")
            .field("tokens", &self.tokens)
            .field("tickets", &self.tickets)
            .finish_non_exhaustive()
    }
}

impl JsapiSigner {
    pub fn new(tokens: Arc<TokenProvider>, tickets: TicketService, clock: Arc<dyn Clock>) -> Self {
        Self {
            tokens,
            tickets,
            clock,
        }
    }

    pub fn tickets(&self) -> &TicketService {
        &self.tickets
    }

    /// Sign `target_url` with a fresh jsapi ticket.
    ///
    /// `target_url` must be the exact page URL the client SDK verifies against
    /// (scheme, host, path, query; no fragment).
    pub async fn sign_url(&self, target_url: &str) -> LarkResult<SignatureResult> {
        if target_url.trim().is_empty() {
            return Err(LarkError::validation("URL parameter is required"));
        }
        let credentials = self.tokens.credentials()?;

        let ticket = self.tickets.get_ticket().await?;
        let now_ms = self.clock.now_ms();
        if !ticket.is_fresh_at(now_ms) {
            warn!(
                ticket = %ticket.redacted(),
                expires_at_ms = ticket.expires_at_ms,
                now_ms,
                "jsapi ticket expired before signing"
            );
            return Err(LarkError::UpstreamTicket {
                payload: json!({
                    "msg": "jsapi ticket expired before signing",
                    "expires_at_ms": ticket.expires_at_ms,
                }),
            });
        }

        let timestamp = now_ms.div_euclid(1000);
        let nonce_str = generate_nonce()?;
        let canonical = canonical_string(&ticket.value, &nonce_str, timestamp, target_url);
        let signature = digest(&canonical);

        debug!(
            url = %target_url,
            ticket = %ticket.redacted(),
            timestamp,
            %signature,
            "signed jsapi config"
        );

        Ok(SignatureResult {
            app_id: credentials.app_id().to_string(),
            timestamp,
            nonce_str,
            signature,
            url: target_url.to_string(),
        })
    }
}

/// Factory: wire the Lark services from application `Config`.
use std::sync::Arc;

use tracing::{error, warn};

use crate::config::LarkConfig;
use crate::error::AppError;
use crate::services::lark::{
    client::{LarkTransport, ReqwestTransport},
    clock::{Clock, SystemClock},
    login::LoginService,
    messages::MessageService,
    signature::JsapiSigner,
    ticket::{TicketCache, TicketService},
    token::TokenProvider,
};

/// Process-level Lark services sharing one transport, token provider and ticket cache.
#[derive(Clone)]
pub struct LarkServices {
    pub signer: Arc<JsapiSigner>,
    pub login: Arc<LoginService>,
    pub messages: Arc<MessageService>,
}

pub fn build_lark_services(config: &LarkConfig) -> Result<LarkServices, AppError> {
    if config.app_id.is_none() || config.app_secret.is_none() {
        // Not fatal: requests fail with a configuration error until this is fixed.
        warn!("LARK_APP_ID and LARK_APP_SECRET must be set; Lark endpoints will fail");
    }

    let transport = ReqwestTransport::new(config.base_url.clone(), config.request_timeout)
        .map_err(|e| {
            error!(error = %e, "failed to build Lark HTTP client");
            AppError::Internal
        })?;

    Ok(LarkServices::with_parts(
        Arc::new(transport),
        Arc::new(SystemClock),
        config.app_id.clone(),
        config.app_secret.clone(),
    ))
}

impl LarkServices {
    pub fn with_parts(
        transport: Arc<dyn LarkTransport>,
        clock: Arc<dyn Clock>,
        app_id: Option<String>,
        app_secret: Option<String>,
    ) -> Self {
        let tokens = Arc::new(TokenProvider::new(transport.clone(), app_id, app_secret));
        let tickets = TicketService::new(
            tokens.clone(),
            transport.clone(),
            clock.clone(),
            Arc::new(TicketCache::new()),
        );

        Self {
            signer: Arc::new(JsapiSigner::new(tokens.clone(), tickets, clock)),
            login: Arc::new(LoginService::new(tokens.clone(), transport.clone())),
            messages: Arc::new(MessageService::new(tokens, transport)),
        }
    }
}

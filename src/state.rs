/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 * - Cheap to Clone (Arc inside); the ticket cache lives behind `signer`
 *   so every request shares one cache
 */
use std::sync::Arc;

use crate::services::lark::{
    LarkServices, login::LoginService, messages::MessageService, signature::JsapiSigner,
};

#[derive(Clone)]
pub struct AppState {
    pub signer: Arc<JsapiSigner>,
    pub login: Arc<LoginService>,
    pub messages: Arc<MessageService>,
}

impl AppState {
    pub fn new(lark: LarkServices) -> Self {
        Self {
            signer: lark.signer,
            login: lark.login,
            messages: lark.messages,
        }
    }
}

//! Outbound IM messages (text, interactive card, image) sent as the app bot.
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{info, warn};

use crate::services::lark::{
    client::{LarkTransport, UpstreamRequest, is_success},
    error::{LarkError, LarkResult},
    paths,
    token::TokenProvider,
};

pub const DEFAULT_RECEIVE_ID_TYPE: &str = "open_id";

#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text(String),
    Card(Value),
    Image { image_key: String },
}

impl MessageContent {
    pub fn msg_type(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Card(_) => "interactive",
            Self::Image { .. } => "image",
        }
    }

    fn validate(&self) -> LarkResult<()> {
        let empty = match self {
            Self::Text(text) => text.is_empty(),
            Self::Card(card) => card.is_null(),
            Self::Image { image_key } => image_key.trim().is_empty(),
        };
        if empty {
            return Err(LarkError::validation(format!(
                "{} content is required",
                self.msg_type()
            )));
        }
        Ok(())
    }

    /// Lark expects `content` as a JSON document encoded into a string.
    fn encoded(&self) -> String {
        match self {
            Self::Text(text) => json!({ "text": text }).to_string(),
            Self::Card(card) => card.to_string(),
            Self::Image { image_key } => json!({ "image_key": image_key }).to_string(),
        }
    }
}

#[derive(Clone)]
pub struct MessageService {
    tokens: Arc<TokenProvider>,
    transport: Arc<dyn LarkTransport>,
}

impl MessageService {
    pub fn new(tokens: Arc<TokenProvider>, transport: Arc<dyn LarkTransport>) -> Self {
        Self { tokens, transport }
    }

    /// Returns the `data` object of the send response.
    pub async fn send(
        &self,
        receive_id: &str,
        receive_id_type: Option<&str>,
        content: MessageContent,
    ) -> LarkResult<Value> {
        if receive_id.trim().is_empty() {
            return Err(LarkError::validation("receive_id is required"));
        }
        content.validate()?;
        let receive_id_type = receive_id_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_RECEIVE_ID_TYPE);

        let app_token = self.tokens.get_access_token().await?;

        let request = UpstreamRequest::post(paths::MESSAGES)
            .bearer(app_token.secret())
            .query("receive_id_type", receive_id_type)
            .json(json!({
                "receive_id": receive_id,
                "msg_type": content.msg_type(),
                "content": content.encoded(),
            }));

        let payload = self.transport.send(request).await.map_err(|e| {
            warn!(error = %e, "send message request failed");
            LarkError::upstream("send_message", e.into_payload())
        })?;

        if !is_success(&payload) {
            warn!(%payload, "send message rejected");
            return Err(LarkError::upstream("send_message", payload));
        }

        info!(msg_type = content.msg_type(), receive_id_type, "message sent");
        Ok(payload.get("data").cloned().unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::lark::testutil::ScriptedTransport;

    fn service(transport: &Arc<ScriptedTransport>) -> MessageService {
        let tokens = Arc::new(TokenProvider::new(
            transport.clone(),
            Some("cli_test".into()),
            Some("secret".into()),
        ));
        MessageService::new(tokens, transport.clone())
    }

    fn script_ok(transport: &ScriptedTransport) {
        transport.push(
            paths::APP_ACCESS_TOKEN,
            json!({ "code": 0, "app_access_token": "app-token" }),
        );
        transport.push(
            paths::MESSAGES,
            json!({ "code": 0, "data": { "message_id": "om_1" } }),
        );
    }

    #[tokio::test]
    async fn text_message_is_json_encoded_with_default_receiver_type() {
        let transport = Arc::new(ScriptedTransport::new());
        script_ok(&transport);

        let data = service(&transport)
            .send("ou_1", None, MessageContent::Text("hi \"there\"".into()))
            .await
            .unwrap();
        assert_eq!(data, json!({ "message_id": "om_1" }));

        let request = &transport.requests()[1];
        assert_eq!(request.bearer.as_deref(), Some("app-token"));
        assert_eq!(request.query, vec![("receive_id_type", "open_id".to_string())]);
        let body = request.body.as_ref().unwrap();
        assert_eq!(body["msg_type"], "text");
        let content: Value = serde_json::from_str(body["content"].as_str().unwrap()).unwrap();
        assert_eq!(content, json!({ "text": "hi \"there\"" }));
    }

    #[tokio::test]
    async fn card_and_image_use_their_message_types() {
        let transport = Arc::new(ScriptedTransport::new());
        script_ok(&transport);
        script_ok(&transport);
        let svc = service(&transport);

        let card = json!({ "elements": [{ "tag": "markdown", "content": "**hi**" }] });
        svc.send("oc_1", Some("chat_id"), MessageContent::Card(card.clone()))
            .await
            .unwrap();
        svc.send(
            "ou_1",
            Some("open_id"),
            MessageContent::Image {
                image_key: "img_v2_1".into(),
            },
        )
        .await
        .unwrap();

        let requests = transport.requests();
        let card_body = requests[1].body.as_ref().unwrap();
        assert_eq!(card_body["msg_type"], "interactive");
        assert_eq!(requests[1].query[0].1, "chat_id");
        let sent_card: Value = serde_json::from_str(card_body["content"].as_str().unwrap()).unwrap();
        assert_eq!(sent_card, card);

        let image_body = requests[3].body.as_ref().unwrap();
        assert_eq!(image_body["msg_type"], "image");
        assert_eq!(image_body["content"], r#"{"image_key":"img_v2_1"}"#);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_without_network() {
        let transport = Arc::new(ScriptedTransport::new());
        let svc = service(&transport);

        assert!(matches!(
            svc.send("", None, MessageContent::Text("x".into())).await,
            Err(LarkError::Validation(_))
        ));
        assert!(matches!(
            svc.send("ou_1", None, MessageContent::Text(String::new())).await,
            Err(LarkError::Validation(_))
        ));
        assert!(matches!(
            svc.send("ou_1", None, MessageContent::Card(Value::Null)).await,
            Err(LarkError::Validation(_))
        ));
        assert_eq!(transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn rejected_send_carries_payload() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(
            paths::APP_ACCESS_TOKEN,
            json!({ "code": 0, "app_access_token": "app-token" }),
        );
        let rejected = json!({ "code": 230002, "msg": "bot not in chat" });
        transport.push(paths::MESSAGES, rejected.clone());

        match service(&transport)
            .send("oc_1", Some("chat_id"), MessageContent::Text("x".into()))
            .await
        {
            Err(LarkError::Upstream { operation, payload }) => {
                assert_eq!(operation, "send_message");
                assert_eq!(payload, rejected);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

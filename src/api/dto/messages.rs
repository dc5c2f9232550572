/*
 * Responsibility
 * - request DTOs for send-message / send-card / send-image
 * - validate() turns a request into the service-level MessageContent
 */
use serde::Deserialize;
use serde_json::Value;

use crate::services::lark::MessageContent;

fn required<'a>(v: &'a Option<String>) -> Option<&'a str> {
    v.as_deref().filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub receive_id: Option<String>,
    pub content: Option<String>,
    pub receive_id_type: Option<String>,
}

impl SendMessageRequest {
    pub fn validate(&self) -> Result<(&str, MessageContent), &'static str> {
        match (required(&self.receive_id), required(&self.content)) {
            (Some(receive_id), Some(text)) => {
                Ok((receive_id, MessageContent::Text(text.to_string())))
            }
            _ => Err("receive_id and content are required"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SendCardRequest {
    pub receive_id: Option<String>,
    pub card_content: Option<Value>,
    pub receive_id_type: Option<String>,
}

impl SendCardRequest {
    pub fn validate(&self) -> Result<(&str, MessageContent), &'static str> {
        let card = self.card_content.as_ref().filter(|c| !c.is_null());
        match (required(&self.receive_id), card) {
            (Some(receive_id), Some(card)) => Ok((receive_id, MessageContent::Card(card.clone()))),
            _ => Err("receive_id and card_content are required"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SendImageRequest {
    pub receive_id: Option<String>,
    pub image_key: Option<String>,
    pub receive_id_type: Option<String>,
}

impl SendImageRequest {
    pub fn validate(&self) -> Result<(&str, MessageContent), &'static str> {
        match (required(&self.receive_id), required(&self.image_key)) {
            (Some(receive_id), Some(image_key)) => Ok((
                receive_id,
                MessageContent::Image {
                    image_key: image_key.to_string(),
                },
            )),
            _ => Err("receive_id and image_key are required"),
        }
    }
}

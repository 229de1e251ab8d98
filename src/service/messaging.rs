// service/messaging.rs
use async_trait::async_trait;
use serde::Serialize;

use crate::{config::Config, service::error::ServiceError, utils::input::CHANNEL_PREFIX};

/// One outbound message: free text, or a pre-approved template with ordered
/// substitution variables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum OutboundMessage {
    Text(String),
    Template {
        template_id: String,
        variables: Vec<(String, String)>,
    },
}

impl OutboundMessage {
    pub fn text(body: impl Into<String>) -> Self {
        OutboundMessage::Text(body.into())
    }
}

#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, to: &str, message: &OutboundMessage) -> Result<(), ServiceError>;
}

pub struct TwilioSender {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioSender {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from_number: config.twilio_from_number.clone(),
        }
    }

    fn channel_address(phone: &str) -> String {
        if phone.starts_with(CHANNEL_PREFIX) {
            phone.to_string()
        } else {
            format!("{}{}", CHANNEL_PREFIX, phone)
        }
    }
}

#[async_trait]
impl MessageSender for TwilioSender {
    async fn send(&self, to: &str, message: &OutboundMessage) -> Result<(), ServiceError> {
        let transport = |reason: String| ServiceError::Transport {
            recipient: to.to_string(),
            reason,
        };

        let mut form = vec![
            ("To".to_string(), Self::channel_address(to)),
            ("From".to_string(), Self::channel_address(&self.from_number)),
        ];

        match message {
            OutboundMessage::Text(body) => form.push(("Body".to_string(), body.clone())),
            OutboundMessage::Template { template_id, variables } => {
                let variables: serde_json::Map<String, serde_json::Value> = variables
                    .iter()
                    .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
                    .collect();
                form.push(("ContentSid".to_string(), template_id.clone()));
                form.push((
                    "ContentVariables".to_string(),
                    serde_json::Value::Object(variables).to_string(),
                ));
            }
        }

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        );

        let response = self
            .client
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            return Err(transport(format!(
                "{}: {}",
                status,
                body["message"].as_str().unwrap_or("unknown error")
            )));
        }

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_address_is_added_once() {
        assert_eq!(TwilioSender::channel_address("+972501112233"), "whatsapp:+972501112233");
        assert_eq!(
            TwilioSender::channel_address("whatsapp:+972501112233"),
            "whatsapp:+972501112233"
        );
    }
}

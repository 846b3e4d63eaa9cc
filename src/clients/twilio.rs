// src/clients/twilio.rs

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    clients::whatsapp::WhatsappProvider,
    common::outcome::Outcome,
    models::whatsapp::{InboundMessage, MessageType, WhatsappMessage},
};

/// Provedor Twilio: POST {api_url}/Messages.json com corpo form-urlencoded e
/// basic auth (ACCOUNT_SID / api key).
pub struct TwilioProvider {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    account_sid: String,
    from_number: String,
}

impl TwilioProvider {
    pub fn new(
        http: reqwest::Client,
        api_url: String,
        api_key: String,
        account_sid: String,
        from_number: String,
    ) -> Self {
        Self {
            http,
            api_url,
            api_key,
            account_sid,
            from_number,
        }
    }

    fn configured(&self) -> bool {
        if self.api_key.is_empty() || self.api_url.is_empty() {
            tracing::warn!("Configuração da API de WhatsApp (Twilio) está incompleta");
            return false;
        }
        true
    }

    async fn post_form(&self, form: &[(&str, String)]) -> Outcome<String> {
        let result = self
            .http
            .post(format!("{}/Messages.json", self.api_url))
            .basic_auth(&self.account_sid, Some(&self.api_key))
            .form(form)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<Value>().await {
                    Ok(body) => match body.get("sid").and_then(Value::as_str) {
                        Some(sid) => Outcome::Done(sid.to_string()),
                        None => {
                            tracing::error!("Resposta da Twilio sem 'sid': {}", body);
                            Outcome::Failed
                        }
                    },
                    Err(err) => {
                        tracing::error!("Erro ao decodificar resposta da Twilio: {}", err);
                        Outcome::Failed
                    }
                }
            }
            Ok(response) => {
                tracing::error!("Twilio respondeu {}", response.status());
                Outcome::Failed
            }
            Err(err) => {
                tracing::error!("Erro ao enviar via Twilio: {}", err);
                Outcome::Failed
            }
        }
    }
}

#[async_trait]
impl WhatsappProvider for TwilioProvider {
    async fn send_text(&self, message: &WhatsappMessage) -> Outcome<String> {
        if !self.configured() {
            return Outcome::Skipped;
        }

        let form = [
            ("To", format!("whatsapp:+{}", message.phone_number)),
            ("From", format!("whatsapp:+{}", self.from_number)),
            ("Body", message.content.clone()),
        ];
        self.post_form(&form).await
    }

    async fn send_template(
        &self,
        message: &WhatsappMessage,
        template_name: &str,
        parameters: &HashMap<String, String>,
    ) -> Outcome<String> {
        if !self.configured() {
            return Outcome::Skipped;
        }

        // A Twilio recebe a plantilla como ContentSid e as variáveis como
        // JSON posicional.
        let variables: Vec<&String> = parameters.values().collect();
        let variables_json = serde_json::to_string(&variables).unwrap_or_else(|_| "[]".into());

        let form = [
            ("To", format!("whatsapp:+{}", message.phone_number)),
            ("From", format!("whatsapp:+{}", self.from_number)),
            ("ContentSid", template_name.to_string()),
            ("ContentVariables", variables_json),
        ];
        self.post_form(&form).await
    }

    fn parse_webhook(&self, payload: &Value) -> Option<InboundMessage> {
        let from = payload.get("From").and_then(Value::as_str)?;
        let body = payload.get("Body").and_then(Value::as_str)?;

        let phone_number = from
            .strip_prefix("whatsapp:+")
            .or_else(|| from.strip_prefix("whatsapp:"))
            .unwrap_or(from)
            .to_string();

        Some(InboundMessage {
            phone_number,
            message_type: MessageType::Text,
            content: body.to_string(),
            external_message_id: payload
                .get("SmsSid")
                .and_then(Value::as_str)
                .map(str::to_string),
            metadata: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider(api_url: String) -> TwilioProvider {
        TwilioProvider::new(
            reqwest::Client::new(),
            api_url,
            "secreto".into(),
            "AC123".into(),
            "56900000000".into(),
        )
    }

    fn outgoing(phone: &str, content: &str) -> WhatsappMessage {
        use crate::models::whatsapp::{MessageDirection, MessageStatus};
        WhatsappMessage {
            id: uuid::Uuid::new_v4(),
            lead_id: None,
            user_id: None,
            direction: MessageDirection::Outgoing,
            phone_number: phone.into(),
            message_type: MessageType::Text,
            content: content.into(),
            template_name: None,
            status: MessageStatus::Pending,
            external_message_id: None,
            metadata: None,
            sent_at: chrono::Utc::now(),
            delivered_at: None,
            read_at: None,
        }
    }

    #[test]
    fn parses_twilio_webhook() {
        let provider = provider("https://api.twilio.example".into());
        let payload = json!({
            "From": "whatsapp:+56912345678",
            "Body": "hola",
            "SmsSid": "SM001"
        });

        let inbound = provider.parse_webhook(&payload).unwrap();
        assert_eq!(inbound.phone_number, "56912345678");
        assert_eq!(inbound.content, "hola");
        assert_eq!(inbound.message_type, MessageType::Text);
        assert_eq!(inbound.external_message_id.as_deref(), Some("SM001"));
    }

    #[test]
    fn webhook_without_body_is_ignored() {
        let provider = provider("https://api.twilio.example".into());
        let payload = json!({ "From": "whatsapp:+56912345678" });
        assert!(provider.parse_webhook(&payload).is_none());
    }

    #[tokio::test]
    async fn send_text_returns_provider_sid() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/Messages.json")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"sid": "SM999"}"#)
            .create_async()
            .await;

        let provider = provider(server.url());
        let outcome = provider.send_text(&outgoing("56912345678", "hola")).await;

        mock.assert_async().await;
        assert_eq!(outcome, Outcome::Done("SM999".into()));
    }

    #[tokio::test]
    async fn provider_error_becomes_failed_not_panic() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/Messages.json")
            .with_status(500)
            .create_async()
            .await;

        let provider = provider(server.url());
        let outcome = provider.send_text(&outgoing("56912345678", "hola")).await;
        assert_eq!(outcome, Outcome::Failed);
    }

    #[tokio::test]
    async fn missing_credentials_skip_the_call() {
        let provider = TwilioProvider::new(
            reqwest::Client::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        );
        let outcome = provider.send_text(&outgoing("56912345678", "hola")).await;
        assert_eq!(outcome, Outcome::Skipped);
    }
}

// src/clients/dialog360.rs

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{
    clients::whatsapp::WhatsappProvider,
    common::outcome::Outcome,
    models::whatsapp::{InboundMessage, MessageType, WhatsappMessage},
};

/// Provedor 360Dialog: POST {api_url}/messages com JSON e header D360-API-KEY.
pub struct Dialog360Provider {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    template_namespace: String,
}

impl Dialog360Provider {
    pub fn new(
        http: reqwest::Client,
        api_url: String,
        api_key: String,
        template_namespace: String,
    ) -> Self {
        Self {
            http,
            api_url,
            api_key,
            template_namespace,
        }
    }

    fn configured(&self) -> bool {
        if self.api_key.is_empty() || self.api_url.is_empty() {
            tracing::warn!("Configuração da API de WhatsApp (360Dialog) está incompleta");
            return false;
        }
        true
    }

    async fn post_message(&self, body: Value) -> Outcome<String> {
        let result = self
            .http
            .post(format!("{}/messages", self.api_url))
            .header("D360-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<Value>().await {
                    Ok(data) => {
                        match data
                            .pointer("/messages/0/id")
                            .and_then(Value::as_str)
                        {
                            Some(id) => Outcome::Done(id.to_string()),
                            None => {
                                tracing::error!("Resposta da 360Dialog sem id de mensagem");
                                Outcome::Failed
                            }
                        }
                    }
                    Err(err) => {
                        tracing::error!("Erro ao decodificar resposta da 360Dialog: {}", err);
                        Outcome::Failed
                    }
                }
            }
            Ok(response) => {
                tracing::error!("360Dialog respondeu {}", response.status());
                Outcome::Failed
            }
            Err(err) => {
                tracing::error!("Erro ao enviar via 360Dialog: {}", err);
                Outcome::Failed
            }
        }
    }
}

#[async_trait]
impl WhatsappProvider for Dialog360Provider {
    async fn send_text(&self, message: &WhatsappMessage) -> Outcome<String> {
        if !self.configured() {
            return Outcome::Skipped;
        }

        self.post_message(json!({
            "to": message.phone_number,
            "type": "text",
            "text": { "body": message.content }
        }))
        .await
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

        // A 360Dialog recebe os parâmetros como componentes de corpo em ordem
        let components = json!([{
            "type": "body",
            "parameters": parameters
                .values()
                .map(|value| json!({ "type": "text", "text": value }))
                .collect::<Vec<_>>()
        }]);

        self.post_message(json!({
            "to": message.phone_number,
            "type": "template",
            "template": {
                "namespace": self.template_namespace,
                "name": template_name,
                "language": { "code": "es", "policy": "deterministic" },
                "components": components
            }
        }))
        .await
    }

    fn parse_webhook(&self, payload: &Value) -> Option<InboundMessage> {
        let message = payload.pointer("/entry/0/changes/0/value/messages/0")?;
        let phone_number = message.get("from").and_then(Value::as_str)?.to_string();

        let provider_type = message.get("type").and_then(Value::as_str).unwrap_or("text");
        let (message_type, content) = match provider_type {
            "text" => (
                MessageType::Text,
                message
                    .pointer("/text/body")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            ),
            "image" => (
                MessageType::Image,
                message
                    .pointer("/image/caption")
                    .and_then(Value::as_str)
                    .unwrap_or("Imagen recibida")
                    .to_string(),
            ),
            "document" => (
                MessageType::Document,
                format!("Mensaje tipo {provider_type} recibido"),
            ),
            other => (MessageType::Other, format!("Mensaje tipo {other} recibido")),
        };

        Some(InboundMessage {
            phone_number,
            message_type,
            content,
            external_message_id: message
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string),
            metadata: Some(message.clone()),
        })
    }
}

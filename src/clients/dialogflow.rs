// src/clients/dialogflow.rs

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{common::outcome::Outcome, models::dialogflow::IntentResult};

// Texto usado quando o agente devolve uma resposta degenerada
const FALLBACK_TEXT: &str = "No pude entenderte. ¿Podrías reformular tu pregunta?";
const FALLBACK_INTENT: &str = "default.fallback";

/// Contrato com o agente de NLU. O serviço de sessões só conhece este trait;
/// os testes injetam um detector roteirizado.
#[async_trait]
pub trait IntentClient: Send + Sync {
    /// Encaminha o texto do usuário e devolve intent + parâmetros.
    async fn detect_intent(&self, session_id: &str, text: &str) -> Outcome<IntentResult>;

    /// Dispara um evento remoto (ex: "WELCOME") para inicializar a sessão.
    async fn trigger_event(&self, session_id: &str, event: &str) -> Outcome<()>;
}

/// Cliente para a API REST v2 do Dialogflow:
/// POST {api_url}/agent/sessions/{id}:detectIntent com bearer token.
pub struct DialogflowClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    language_code: String,
}

impl DialogflowClient {
    pub fn new(http: reqwest::Client, api_url: String, api_key: String) -> Self {
        Self {
            http,
            api_url,
            api_key,
            // Español para Chile
            language_code: "es".to_string(),
        }
    }

    fn configured(&self) -> bool {
        if self.api_key.is_empty() {
            tracing::warn!("DIALOGFLOW_API_KEY não está definida; o agente virtual está inativo");
            return false;
        }
        true
    }

    async fn detect(&self, session_id: &str, query_input: Value) -> Outcome<Value> {
        let result = self
            .http
            .post(format!(
                "{}/agent/sessions/{}:detectIntent",
                self.api_url, session_id
            ))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "queryInput": query_input,
                "queryParams": { "timeZone": "America/Santiago" }
            }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<Value>().await {
                    Ok(body) => Outcome::Done(body),
                    Err(err) => {
                        tracing::error!("Erro ao decodificar resposta do Dialogflow: {}", err);
                        Outcome::Failed
                    }
                }
            }
            Ok(response) => {
                tracing::error!("Dialogflow respondeu {}", response.status());
                Outcome::Failed
            }
            Err(err) => {
                tracing::error!("Erro ao chamar o Dialogflow: {}", err);
                Outcome::Failed
            }
        }
    }
}

#[async_trait]
impl IntentClient for DialogflowClient {
    async fn detect_intent(&self, session_id: &str, text: &str) -> Outcome<IntentResult> {
        if !self.configured() {
            return Outcome::Skipped;
        }

        let query_input = json!({
            "text": { "text": text, "languageCode": self.language_code }
        });

        self.detect(session_id, query_input).await.map(|body| {
            let query_result = body.get("queryResult").cloned().unwrap_or(Value::Null);

            let response_text = query_result
                .get("fulfillmentText")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(FALLBACK_TEXT)
                .to_string();

            let intent = query_result
                .pointer("/intent/displayName")
                .and_then(Value::as_str)
                .unwrap_or(FALLBACK_INTENT)
                .to_string();

            let parameters = query_result
                .get("parameters")
                .cloned()
                .unwrap_or_else(|| json!({}));

            IntentResult {
                response_text,
                intent,
                parameters,
            }
        })
    }

    async fn trigger_event(&self, session_id: &str, event: &str) -> Outcome<()> {
        if !self.configured() {
            return Outcome::Skipped;
        }

        let query_input = json!({
            "event": { "name": event, "languageCode": self.language_code }
        });

        self.detect(session_id, query_input).await.map(|_| ())
    }
}

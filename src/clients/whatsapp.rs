// src/clients/whatsapp.rs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    clients::{dialog360::Dialog360Provider, twilio::TwilioProvider},
    common::outcome::Outcome,
    models::whatsapp::{InboundMessage, WhatsappMessage},
};

/// O contrato que cada provedor de WhatsApp implementa. A escolha entre os
/// provedores acontece uma única vez, na montagem do AppState; nada de
/// re-decidir a cada chamada.
#[async_trait]
pub trait WhatsappProvider: Send + Sync {
    /// Envia texto simples; retorna o ID atribuído pelo provedor.
    async fn send_text(&self, message: &WhatsappMessage) -> Outcome<String>;

    /// Envia uma plantilla pré-aprovada com parâmetros nomeados.
    async fn send_template(
        &self,
        message: &WhatsappMessage,
        template_name: &str,
        parameters: &HashMap<String, String>,
    ) -> Outcome<String>;

    /// Normaliza o payload bruto do webhook no formato único de mensagem
    /// entrante. `None` quando o payload não carrega mensagem nenhuma.
    fn parse_webhook(&self, payload: &Value) -> Option<InboundMessage>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Twilio,
    Dialog360,
}

impl ProviderKind {
    /// Interpreta o valor de WHATSAPP_PROVIDER; qualquer coisa que não seja
    /// "360dialog" cai em Twilio, como na origem.
    pub fn from_env_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "360dialog" => ProviderKind::Dialog360,
            _ => ProviderKind::Twilio,
        }
    }
}

/// Configuração do gateway de WhatsApp, lida do ambiente em `config.rs`.
#[derive(Debug, Clone, Default)]
pub struct WhatsappConfig {
    pub provider: Option<ProviderKind>,
    pub api_key: String,
    pub api_url: String,
    pub from_number: String,
    pub account_sid: String,
    pub template_namespace: String,
}

pub fn build_whatsapp_provider(
    config: &WhatsappConfig,
    http: reqwest::Client,
) -> Arc<dyn WhatsappProvider> {
    match config.provider.unwrap_or(ProviderKind::Twilio) {
        ProviderKind::Twilio => Arc::new(TwilioProvider::new(
            http,
            config.api_url.clone(),
            config.api_key.clone(),
            config.account_sid.clone(),
            config.from_number.clone(),
        )),
        ProviderKind::Dialog360 => Arc::new(Dialog360Provider::new(
            http,
            config.api_url.clone(),
            config.api_key.clone(),
            config.template_namespace.clone(),
        )),
    }
}

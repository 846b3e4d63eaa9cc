// src/services/whatsapp_service.rs

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    clients::WhatsappProvider,
    common::error::AppError,
    db::{LeadStore, MessageStore},
    models::whatsapp::{
        MessageDirection, MessageStatus, MessageType, NewWhatsappMessage, WhatsappMessage,
    },
};

/// Orquestra o gateway de WhatsApp: cada envio vira primeiro um registro
/// `pending` no banco e só depois vai ao provedor. Se o provedor falhar, o
/// registro fica como `pending`, e a falha já foi logada no adaptador.
#[derive(Clone)]
pub struct WhatsappService {
    messages: Arc<dyn MessageStore>,
    leads: Arc<dyn LeadStore>,
    provider: Arc<dyn WhatsappProvider>,
}

impl WhatsappService {
    pub fn new(
        messages: Arc<dyn MessageStore>,
        leads: Arc<dyn LeadStore>,
        provider: Arc<dyn WhatsappProvider>,
    ) -> Self {
        Self {
            messages,
            leads,
            provider,
        }
    }

    /// Envia um texto simples. Devolve o ID externo quando o provedor aceitou.
    pub async fn send_text_message(
        &self,
        phone_number: &str,
        content: &str,
        lead_id: Option<Uuid>,
        user_id: Option<Uuid>,
    ) -> Result<Option<String>, AppError> {
        let message = self
            .messages
            .insert(NewWhatsappMessage {
                lead_id,
                user_id,
                direction: MessageDirection::Outgoing,
                phone_number: phone_number.to_string(),
                message_type: MessageType::Text,
                content: content.to_string(),
                template_name: None,
                status: MessageStatus::Pending,
                external_message_id: None,
                metadata: None,
            })
            .await?;

        match self.provider.send_text(&message).await.value() {
            Some(external_id) => {
                self.messages.mark_sent(message.id, &external_id).await?;
                Ok(Some(external_id))
            }
            None => Ok(None),
        }
    }

    /// Envia uma plantilla pré-aprovada. O conteúdo gravado é o nome da
    /// plantilla; os parâmetros ficam no metadata.
    pub async fn send_template_message(
        &self,
        phone_number: &str,
        template_name: &str,
        parameters: &HashMap<String, String>,
        lead_id: Option<Uuid>,
        user_id: Option<Uuid>,
    ) -> Result<Option<String>, AppError> {
        let message = self
            .messages
            .insert(NewWhatsappMessage {
                lead_id,
                user_id,
                direction: MessageDirection::Outgoing,
                phone_number: phone_number.to_string(),
                message_type: MessageType::Template,
                content: template_name.to_string(),
                template_name: Some(template_name.to_string()),
                status: MessageStatus::Pending,
                external_message_id: None,
                metadata: Some(json!({
                    "templateName": template_name,
                    "parameters": parameters,
                })),
            })
            .await?;

        match self
            .provider
            .send_template(&message, template_name, parameters)
            .await
            .value()
        {
            Some(external_id) => {
                self.messages.mark_sent(message.id, &external_id).await?;
                Ok(Some(external_id))
            }
            None => Ok(None),
        }
    }

    /// Processa o payload bruto de um webhook do provedor. Correlaciona o
    /// número com um lead existente (quando houver) e persiste a mensagem
    /// entrante. `None` quando o payload não traz mensagem.
    pub async fn process_webhook(
        &self,
        payload: &Value,
    ) -> Result<Option<WhatsappMessage>, AppError> {
        let Some(inbound) = self.provider.parse_webhook(payload) else {
            return Ok(None);
        };

        let lead = self.leads.find_by_phone(&inbound.phone_number).await?;

        let message = self
            .messages
            .insert(NewWhatsappMessage {
                lead_id: lead.map(|l| l.id),
                user_id: None,
                direction: MessageDirection::Incoming,
                phone_number: inbound.phone_number,
                message_type: inbound.message_type,
                content: inbound.content,
                template_name: None,
                status: MessageStatus::Received,
                external_message_id: inbound.external_message_id,
                metadata: inbound.metadata,
            })
            .await?;

        Ok(Some(message))
    }
}

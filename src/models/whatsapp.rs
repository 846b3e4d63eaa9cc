// src/models/whatsapp.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "message_direction", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageDirection {
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "message_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Image,
    Document,
    Template,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "message_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Sent,
    Delivered,
    Read,
    Received,
    Failed,
}

// --- MENSAGEM ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WhatsappMessage {
    pub id: Uuid,
    pub lead_id: Option<Uuid>,
    pub user_id: Option<Uuid>,

    pub direction: MessageDirection,
    pub phone_number: String,
    pub message_type: MessageType,
    pub content: String,
    pub template_name: Option<String>,

    pub status: MessageStatus,

    // ID atribuído pelo provedor (Twilio SID / 360Dialog message id)
    pub external_message_id: Option<String>,

    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,

    pub sent_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
}

// Dados para inserir uma nova mensagem
#[derive(Debug, Clone)]
pub struct NewWhatsappMessage {
    pub lead_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub direction: MessageDirection,
    pub phone_number: String,
    pub message_type: MessageType,
    pub content: String,
    pub template_name: Option<String>,
    pub status: MessageStatus,
    pub external_message_id: Option<String>,
    pub metadata: Option<Value>,
}

// Mensagem entrante já normalizada de um webhook de provedor.
// O formato bruto do payload fica preservado em `metadata`.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub phone_number: String,
    pub message_type: MessageType,
    pub content: String,
    pub external_message_id: Option<String>,
    pub metadata: Option<Value>,
}

// Filtros da listagem administrativa
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    pub search: Option<String>,
    pub direction: Option<MessageDirection>,
    pub status: Option<MessageStatus>,
    pub page: i64,
    pub limit: i64,
}

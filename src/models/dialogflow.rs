// src/models/dialogflow.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Intent reservado que marca a sessão para atendimento humano
pub const TRANSFER_INTENT: &str = "transfer.to.human";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "session_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Transferred,
    Closed,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DialogflowSession {
    pub id: Uuid,
    pub lead_id: Option<Uuid>,
    pub user_id: Option<Uuid>,

    // ID opaco que correlaciona com a sessão remota do agente
    pub session_id: String,

    pub intent: Option<String>,

    #[schema(value_type = Option<Object>)]
    pub parameters: Option<Value>,

    // active -> transferred é caminho de mão única
    pub status: SessionStatus,
    pub transferred_to_user_id: Option<Uuid>,

    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_interaction_at: DateTime<Utc>,
}

// Dados para inserir uma nova sessão
#[derive(Debug, Clone)]
pub struct NewDialogflowSession {
    pub lead_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub session_id: String,
}

// Resultado de um turno de conversa com o agente
#[derive(Debug, Clone, PartialEq)]
pub struct IntentResult {
    pub response_text: String,
    pub intent: String,
    pub parameters: Value,
}

// Filtros da listagem administrativa
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub status: Option<SessionStatus>,
    pub page: i64,
    pub limit: i64,
}

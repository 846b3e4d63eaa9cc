// src/models/crm.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- ENUMS ---

// Mapeia o CREATE TYPE lead_status do banco. O pipeline_stage usa o mesmo
// conjunto de valores que o status (herdado da origem do produto).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "lead_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    Initiated,
    DataCompleted,
    PaymentCompleted,
    Certified,
    Incomplete,
    Rejected,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "lead_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Webapp,
    Android,
    Website,
    Whatsapp,
}

// --- LEAD ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CrmLead {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub rut: Option<String>,

    // Título do último documento associado ao lead
    pub document_type: Option<String>,

    pub status: LeadStatus,
    pub source: LeadSource,
    pub pipeline_stage: LeadStatus,

    pub last_contact_date: DateTime<Utc>,
    pub assigned_to_user_id: Option<Uuid>,
    pub notes: Option<String>,

    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,

    // ID no CRM externo. Uma vez definido, nunca é limpo.
    pub crm_external_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para inserir um novo lead
#[derive(Debug, Clone)]
pub struct NewCrmLead {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub rut: Option<String>,
    pub document_type: Option<String>,
    pub status: LeadStatus,
    pub source: LeadSource,
    pub pipeline_stage: LeadStatus,
}

// Alterações parciais aplicadas sobre um lead existente.
// Campos `None` ficam como estão no banco.
#[derive(Debug, Clone, Default)]
pub struct LeadChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub rut: Option<String>,
    pub document_type: Option<String>,
    pub status: Option<LeadStatus>,
    pub pipeline_stage: Option<LeadStatus>,
    pub assigned_to_user_id: Option<Option<Uuid>>,
    pub notes: Option<String>,
    pub last_contact_date: Option<DateTime<Utc>>,
}

// Filtros da listagem administrativa
#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    pub search: Option<String>,
    pub status: Option<LeadStatus>,
    pub pipeline_stage: Option<LeadStatus>,
    pub page: i64,
    pub limit: i64,
}

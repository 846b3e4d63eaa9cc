// src/db/crm_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::crm::{CrmLead, LeadChanges, LeadFilter, NewCrmLead},
};

/// Operações sobre leads. O trait existe para que os serviços recebam o
/// armazenamento injetado (e os testes troquem por uma versão em memória).
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CrmLead>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<CrmLead>, AppError>;
    async fn find_by_phone(&self, phone: &str) -> Result<Option<CrmLead>, AppError>;
    async fn insert(&self, lead: NewCrmLead) -> Result<CrmLead, AppError>;
    /// Aplica alterações parciais; retorna `None` se o lead não existir.
    async fn apply(&self, id: Uuid, changes: LeadChanges) -> Result<Option<CrmLead>, AppError>;
    async fn set_external_id(&self, id: Uuid, external_id: &str) -> Result<(), AppError>;
    async fn list(&self, filter: &LeadFilter) -> Result<(Vec<CrmLead>, i64), AppError>;
}

#[derive(Clone)]
pub struct CrmRepository {
    pool: PgPool,
}

impl CrmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const LEAD_COLUMNS: &str = r#"
    id, full_name, email, phone, rut, document_type, status, source,
    pipeline_stage, last_contact_date, assigned_to_user_id, notes, metadata,
    crm_external_id, created_at, updated_at
"#;

#[async_trait]
impl LeadStore for CrmRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CrmLead>, AppError> {
        let lead = sqlx::query_as::<_, CrmLead>(&format!(
            "SELECT {LEAD_COLUMNS} FROM crm_leads WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lead)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<CrmLead>, AppError> {
        let lead = sqlx::query_as::<_, CrmLead>(&format!(
            "SELECT {LEAD_COLUMNS} FROM crm_leads WHERE email = $1 LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lead)
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<CrmLead>, AppError> {
        let lead = sqlx::query_as::<_, CrmLead>(&format!(
            "SELECT {LEAD_COLUMNS} FROM crm_leads WHERE phone = $1 LIMIT 1"
        ))
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lead)
    }

    async fn insert(&self, lead: NewCrmLead) -> Result<CrmLead, AppError> {
        let created = sqlx::query_as::<_, CrmLead>(&format!(
            r#"
            INSERT INTO crm_leads (
                full_name, email, phone, rut, document_type, status, source, pipeline_stage
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(lead.full_name)
        .bind(lead.email)
        .bind(lead.phone)
        .bind(lead.rut)
        .bind(lead.document_type)
        .bind(lead.status)
        .bind(lead.source)
        .bind(lead.pipeline_stage)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn apply(&self, id: Uuid, changes: LeadChanges) -> Result<Option<CrmLead>, AppError> {
        // `COALESCE` preserva o valor atual quando o campo não foi alterado.
        // `assigned_to_user_id` aceita "definir como NULL", então usa um par
        // flag + valor em vez de COALESCE.
        let reassign = changes.assigned_to_user_id.is_some();
        let assignee = changes.assigned_to_user_id.flatten();

        let lead = sqlx::query_as::<_, CrmLead>(&format!(
            r#"
            UPDATE crm_leads SET
                full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                rut = COALESCE($5, rut),
                document_type = COALESCE($6, document_type),
                status = COALESCE($7, status),
                pipeline_stage = COALESCE($8, pipeline_stage),
                assigned_to_user_id = CASE WHEN $9 THEN $10 ELSE assigned_to_user_id END,
                notes = COALESCE($11, notes),
                last_contact_date = COALESCE($12, last_contact_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.full_name)
        .bind(changes.email)
        .bind(changes.phone)
        .bind(changes.rut)
        .bind(changes.document_type)
        .bind(changes.status)
        .bind(changes.pipeline_stage)
        .bind(reassign)
        .bind(assignee)
        .bind(changes.notes)
        .bind(changes.last_contact_date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lead)
    }

    async fn set_external_id(&self, id: Uuid, external_id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE crm_leads SET crm_external_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(external_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self, filter: &LeadFilter) -> Result<(Vec<CrmLead>, i64), AppError> {
        let search = filter.search.as_ref().map(|s| format!("%{s}%"));
        let offset = (filter.page - 1) * filter.limit;

        const WHERE_CLAUSE: &str = r#"
            WHERE ($1::text IS NULL
                   OR full_name ILIKE $1 OR email ILIKE $1
                   OR phone ILIKE $1 OR rut ILIKE $1)
              AND ($2::lead_status IS NULL OR status = $2)
              AND ($3::lead_status IS NULL OR pipeline_stage = $3)
        "#;

        let leads = sqlx::query_as::<_, CrmLead>(&format!(
            r#"
            SELECT {LEAD_COLUMNS} FROM crm_leads
            {WHERE_CLAUSE}
            ORDER BY updated_at DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(&search)
        .bind(filter.status)
        .bind(filter.pipeline_stage)
        .bind(filter.limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM crm_leads {WHERE_CLAUSE}"
        ))
        .bind(&search)
        .bind(filter.status)
        .bind(filter.pipeline_stage)
        .fetch_one(&self.pool)
        .await?;

        Ok((leads, total))
    }
}

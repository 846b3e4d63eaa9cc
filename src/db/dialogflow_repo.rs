// src/db/dialogflow_repo.rs

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::dialogflow::{DialogflowSession, NewDialogflowSession, SessionFilter},
};

/// Armazenamento das sessões de conversa com o agente.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: NewDialogflowSession)
    -> Result<DialogflowSession, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<DialogflowSession>, AppError>;
    async fn find_active_by_lead(
        &self,
        lead_id: Uuid,
    ) -> Result<Option<DialogflowSession>, AppError>;
    /// Persiste o intent/parâmetros do turno e avança last_interaction_at.
    async fn record_turn(&self, id: Uuid, intent: &str, parameters: &Value)
    -> Result<(), AppError>;
    /// Marca a sessão como transferida (caminho de mão única).
    /// Retorna `None` se a sessão não existir.
    async fn transfer(
        &self,
        id: Uuid,
        transferred_to_user_id: Option<Uuid>,
    ) -> Result<Option<DialogflowSession>, AppError>;
    async fn list(
        &self,
        filter: &SessionFilter,
    ) -> Result<(Vec<DialogflowSession>, i64), AppError>;
    async fn list_by_lead(&self, lead_id: Uuid) -> Result<Vec<DialogflowSession>, AppError>;
}

#[derive(Clone)]
pub struct DialogflowRepository {
    pool: PgPool,
}

impl DialogflowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SESSION_COLUMNS: &str = r#"
    id, lead_id, user_id, session_id, intent, parameters, status,
    transferred_to_user_id, metadata, created_at, updated_at, last_interaction_at
"#;

#[async_trait]
impl SessionStore for DialogflowRepository {
    async fn insert(
        &self,
        session: NewDialogflowSession,
    ) -> Result<DialogflowSession, AppError> {
        let created = sqlx::query_as::<_, DialogflowSession>(&format!(
            r#"
            INSERT INTO dialogflow_sessions (lead_id, user_id, session_id)
            VALUES ($1, $2, $3)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(session.lead_id)
        .bind(session.user_id)
        .bind(session.session_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DialogflowSession>, AppError> {
        let session = sqlx::query_as::<_, DialogflowSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM dialogflow_sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn find_active_by_lead(
        &self,
        lead_id: Uuid,
    ) -> Result<Option<DialogflowSession>, AppError> {
        let session = sqlx::query_as::<_, DialogflowSession>(&format!(
            r#"
            SELECT {SESSION_COLUMNS} FROM dialogflow_sessions
            WHERE lead_id = $1 AND status = 'active'
            ORDER BY last_interaction_at DESC
            LIMIT 1
            "#
        ))
        .bind(lead_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn record_turn(
        &self,
        id: Uuid,
        intent: &str,
        parameters: &Value,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE dialogflow_sessions
            SET intent = $2, parameters = $3,
                last_interaction_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(intent)
        .bind(parameters)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn transfer(
        &self,
        id: Uuid,
        transferred_to_user_id: Option<Uuid>,
    ) -> Result<Option<DialogflowSession>, AppError> {
        let session = sqlx::query_as::<_, DialogflowSession>(&format!(
            r#"
            UPDATE dialogflow_sessions
            SET status = 'transferred', transferred_to_user_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(transferred_to_user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn list(
        &self,
        filter: &SessionFilter,
    ) -> Result<(Vec<DialogflowSession>, i64), AppError> {
        let offset = (filter.page - 1) * filter.limit;

        const WHERE_CLAUSE: &str = "WHERE ($1::session_status IS NULL OR status = $1)";

        let sessions = sqlx::query_as::<_, DialogflowSession>(&format!(
            r#"
            SELECT {SESSION_COLUMNS} FROM dialogflow_sessions
            {WHERE_CLAUSE}
            ORDER BY last_interaction_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(filter.status)
        .bind(filter.limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM dialogflow_sessions {WHERE_CLAUSE}"
        ))
        .bind(filter.status)
        .fetch_one(&self.pool)
        .await?;

        Ok((sessions, total))
    }

    async fn list_by_lead(&self, lead_id: Uuid) -> Result<Vec<DialogflowSession>, AppError> {
        let sessions = sqlx::query_as::<_, DialogflowSession>(&format!(
            r#"
            SELECT {SESSION_COLUMNS} FROM dialogflow_sessions
            WHERE lead_id = $1
            ORDER BY updated_at DESC
            "#
        ))
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }
}

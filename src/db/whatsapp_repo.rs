// src/db/whatsapp_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::whatsapp::{MessageFilter, NewWhatsappMessage, WhatsappMessage},
};

/// Armazenamento das mensagens de WhatsApp (entrantes e saintes).
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert(&self, message: NewWhatsappMessage) -> Result<WhatsappMessage, AppError>;
    /// Avança pending -> sent depois do ack do provedor.
    async fn mark_sent(&self, id: Uuid, external_id: &str) -> Result<(), AppError>;
    async fn list(&self, filter: &MessageFilter) -> Result<(Vec<WhatsappMessage>, i64), AppError>;
    async fn list_by_lead(&self, lead_id: Uuid) -> Result<Vec<WhatsappMessage>, AppError>;
}

#[derive(Clone)]
pub struct WhatsappRepository {
    pool: PgPool,
}

impl WhatsappRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MESSAGE_COLUMNS: &str = r#"
    id, lead_id, user_id, direction, phone_number, message_type, content,
    template_name, status, external_message_id, metadata, sent_at,
    delivered_at, read_at
"#;

#[async_trait]
impl MessageStore for WhatsappRepository {
    async fn insert(&self, message: NewWhatsappMessage) -> Result<WhatsappMessage, AppError> {
        let saved = sqlx::query_as::<_, WhatsappMessage>(&format!(
            r#"
            INSERT INTO whatsapp_messages (
                lead_id, user_id, direction, phone_number, message_type,
                content, template_name, status, external_message_id, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(message.lead_id)
        .bind(message.user_id)
        .bind(message.direction)
        .bind(message.phone_number)
        .bind(message.message_type)
        .bind(message.content)
        .bind(message.template_name)
        .bind(message.status)
        .bind(message.external_message_id)
        .bind(message.metadata)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn mark_sent(&self, id: Uuid, external_id: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE whatsapp_messages
            SET status = 'sent', external_message_id = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(external_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self, filter: &MessageFilter) -> Result<(Vec<WhatsappMessage>, i64), AppError> {
        let search = filter.search.as_ref().map(|s| format!("%{s}%"));
        let offset = (filter.page - 1) * filter.limit;

        const WHERE_CLAUSE: &str = r#"
            WHERE ($1::text IS NULL OR phone_number ILIKE $1 OR content ILIKE $1)
              AND ($2::message_direction IS NULL OR direction = $2)
              AND ($3::message_status IS NULL OR status = $3)
        "#;

        let messages = sqlx::query_as::<_, WhatsappMessage>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS} FROM whatsapp_messages
            {WHERE_CLAUSE}
            ORDER BY sent_at DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(&search)
        .bind(filter.direction)
        .bind(filter.status)
        .bind(filter.limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM whatsapp_messages {WHERE_CLAUSE}"
        ))
        .bind(&search)
        .bind(filter.direction)
        .bind(filter.status)
        .fetch_one(&self.pool)
        .await?;

        Ok((messages, total))
    }

    async fn list_by_lead(&self, lead_id: Uuid) -> Result<Vec<WhatsappMessage>, AppError> {
        let messages = sqlx::query_as::<_, WhatsappMessage>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS} FROM whatsapp_messages
            WHERE lead_id = $1
            ORDER BY sent_at DESC
            "#
        ))
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }
}

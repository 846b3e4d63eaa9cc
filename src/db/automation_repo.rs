// src/db/automation_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{common::error::AppError, models::automation::AutomationRule};

/// Leitura das regras de automação. A gestão das regras acontece fora deste
/// serviço; o dispatcher só consome.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Regras ativas event_based para um evento, na ordem de inserção.
    /// A ordem entre regras não faz parte do contrato do dispatcher.
    async fn find_event_rules(&self, event: &str) -> Result<Vec<AutomationRule>, AppError>;
    async fn list(&self) -> Result<Vec<AutomationRule>, AppError>;
}

#[derive(Clone)]
pub struct AutomationRepository {
    pool: PgPool,
}

impl AutomationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const RULE_COLUMNS: &str = r#"
    id, name, description, trigger_type, trigger_event, trigger_schedule,
    trigger_condition, action_type, action_config, is_active, created_at, updated_at
"#;

#[async_trait]
impl RuleStore for AutomationRepository {
    async fn find_event_rules(&self, event: &str) -> Result<Vec<AutomationRule>, AppError> {
        let rules = sqlx::query_as::<_, AutomationRule>(&format!(
            r#"
            SELECT {RULE_COLUMNS} FROM automation_rules
            WHERE trigger_type = 'event_based'
              AND trigger_event = $1
              AND is_active
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(event)
        .fetch_all(&self.pool)
        .await?;
        Ok(rules)
    }

    async fn list(&self) -> Result<Vec<AutomationRule>, AppError> {
        let rules = sqlx::query_as::<_, AutomationRule>(&format!(
            "SELECT {RULE_COLUMNS} FROM automation_rules ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rules)
    }
}

// src/models/automation.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{crm::CrmLead, crm::LeadStatus, dialogflow::DialogflowSession};

// --- ENUMS ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "trigger_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    EventBased,
    ScheduleBased,
    ConditionBased,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "automation_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    SendWhatsapp,
    CreateLead,
    UpdateLead,
    TransferToHuman,
}

// --- REGRA ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutomationRule {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,

    pub trigger_type: TriggerType,
    // Para event_based: chave do evento (ex: "document.certified")
    pub trigger_event: Option<String>,
    // Campos carregados do schema original; o dispatcher só usa event_based
    pub trigger_schedule: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub trigger_condition: Option<Value>,

    pub action_type: ActionType,
    #[schema(value_type = Object)]
    pub action_config: Value,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- CONFIGURAÇÃO DAS AÇÕES (união etiquetada, sem acesso não checado) ---

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendWhatsappConfig {
    pub template_name: String,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub use_dynamic_phone: bool,
}

// Ponto de extensão: a criação do lead acontece incondicionalmente em
// handle_document_event, não por regra. Mantido como está na origem.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadConfig {}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadConfig {
    pub status: Option<LeadStatus>,
    pub pipeline_stage: Option<LeadStatus>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferToHumanConfig {
    pub assign_to_user_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleAction {
    SendWhatsapp(SendWhatsappConfig),
    CreateLead(CreateLeadConfig),
    UpdateLead(UpdateLeadConfig),
    TransferToHuman(TransferToHumanConfig),
}

impl AutomationRule {
    /// Decodifica `action_config` conforme o `action_type` da regra.
    pub fn action(&self) -> Result<RuleAction, serde_json::Error> {
        let config = self.action_config.clone();
        Ok(match self.action_type {
            ActionType::SendWhatsapp => RuleAction::SendWhatsapp(serde_json::from_value(config)?),
            ActionType::CreateLead => RuleAction::CreateLead(serde_json::from_value(config)?),
            ActionType::UpdateLead => RuleAction::UpdateLead(serde_json::from_value(config)?),
            ActionType::TransferToHuman => {
                RuleAction::TransferToHuman(serde_json::from_value(config)?)
            }
        })
    }
}

// --- EVENTOS ---

// Documento enxuto como chega nos eventos de ciclo de vida.
// O status vem como texto livre: valores desconhecidos caem em Initiated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub title: String,
    #[schema(example = "certified")]
    pub status: String,
}

// Payload que circula entre o dispatcher e as ações
#[derive(Debug, Clone, Default)]
pub struct EventPayload {
    pub document: Option<DocumentInfo>,
    pub lead: Option<CrmLead>,
    pub dialogflow_session: Option<DialogflowSession>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule_with(action_type: ActionType, config: Value) -> AutomationRule {
        AutomationRule {
            id: Uuid::new_v4(),
            name: "regra".into(),
            description: None,
            trigger_type: TriggerType::EventBased,
            trigger_event: Some("document.certified".into()),
            trigger_schedule: None,
            trigger_condition: None,
            action_type,
            action_config: config,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn decodes_send_whatsapp_config() {
        let rule = rule_with(
            ActionType::SendWhatsapp,
            json!({ "templateName": "doc_listo", "useDynamicPhone": true }),
        );

        let action = rule.action().unwrap();
        assert_eq!(
            action,
            RuleAction::SendWhatsapp(SendWhatsappConfig {
                template_name: "doc_listo".into(),
                phone_number: None,
                use_dynamic_phone: true,
            })
        );
    }

    #[test]
    fn decodes_update_lead_config_with_status_override() {
        let rule = rule_with(ActionType::UpdateLead, json!({ "status": "certified" }));

        let action = rule.action().unwrap();
        assert_eq!(
            action,
            RuleAction::UpdateLead(UpdateLeadConfig {
                status: Some(LeadStatus::Certified),
                pipeline_stage: None,
            })
        );
    }

    #[test]
    fn send_whatsapp_without_template_is_rejected() {
        let rule = rule_with(ActionType::SendWhatsapp, json!({}));
        assert!(rule.action().is_err());
    }
}

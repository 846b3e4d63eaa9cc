// src/services/test_support.rs
//
// Dublês em memória para os testes dos serviços: os stores guardam tudo num
// Vec protegido por Mutex e os clientes externos gravam as chamadas recebidas.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    clients::{CrmClient, IntentClient, WhatsappProvider},
    common::{error::AppError, outcome::Outcome},
    db::{LeadStore, MessageStore, RuleStore, SessionStore},
    models::{
        auth::{User, UserRole},
        automation::{ActionType, AutomationRule, TriggerType},
        crm::{CrmLead, LeadChanges, LeadFilter, LeadSource, LeadStatus, NewCrmLead},
        dialogflow::{
            DialogflowSession, IntentResult, NewDialogflowSession, SessionFilter, SessionStatus,
        },
        whatsapp::{
            InboundMessage, MessageDirection, MessageFilter, MessageStatus, MessageType,
            NewWhatsappMessage, WhatsappMessage,
        },
    },
};

// --- HELPERS ---

pub fn admin_user() -> User {
    User {
        id: Uuid::new_v4(),
        full_name: "María Pérez".into(),
        email: "maria@xpres.cl".into(),
        phone: Some("56955556666".into()),
        password_hash: "$2b$12$hash".into(),
        role: UserRole::Admin,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn event_rule(
    name: &str,
    event: &str,
    action_type: ActionType,
    action_config: Value,
    is_active: bool,
) -> AutomationRule {
    AutomationRule {
        id: Uuid::new_v4(),
        name: name.into(),
        description: None,
        trigger_type: TriggerType::EventBased,
        trigger_event: Some(event.into()),
        trigger_schedule: None,
        trigger_condition: None,
        action_type,
        action_config,
        is_active,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn incoming_message(content: &str) -> WhatsappMessage {
    WhatsappMessage {
        id: Uuid::new_v4(),
        lead_id: None,
        user_id: None,
        direction: MessageDirection::Incoming,
        phone_number: "56911112222".into(),
        message_type: MessageType::Text,
        content: content.into(),
        template_name: None,
        status: MessageStatus::Received,
        external_message_id: None,
        metadata: None,
        sent_at: Utc::now(),
        delivered_at: None,
        read_at: None,
    }
}

// --- STORES EM MEMÓRIA ---

#[derive(Default)]
pub struct MemoryLeads {
    rows: Mutex<Vec<CrmLead>>,
}

impl MemoryLeads {
    pub fn seed_with_phone(&self, phone: &str) -> CrmLead {
        self.seed(phone, None)
    }

    pub fn seed_linked(&self, external_id: &str) -> CrmLead {
        self.seed("56911112222", Some(external_id.to_string()))
    }

    fn seed(&self, phone: &str, crm_external_id: Option<String>) -> CrmLead {
        let lead = CrmLead {
            id: Uuid::new_v4(),
            full_name: "Juan Soto".into(),
            email: format!("juan+{}@example.cl", phone),
            phone: phone.into(),
            rut: None,
            document_type: None,
            status: LeadStatus::Initiated,
            source: LeadSource::Whatsapp,
            pipeline_stage: LeadStatus::Initiated,
            last_contact_date: Utc::now(),
            assigned_to_user_id: None,
            notes: None,
            metadata: None,
            crm_external_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(lead.clone());
        lead
    }

    pub fn all(&self) -> Vec<CrmLead> {
        self.rows.lock().unwrap().clone()
    }

    pub fn get(&self, id: Uuid) -> CrmLead {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .unwrap()
    }
}

#[async_trait]
impl LeadStore for MemoryLeads {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CrmLead>, AppError> {
        Ok(self.rows.lock().unwrap().iter().find(|l| l.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<CrmLead>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.email == email)
            .cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<CrmLead>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.phone == phone)
            .cloned())
    }

    async fn insert(&self, lead: NewCrmLead) -> Result<CrmLead, AppError> {
        let row = CrmLead {
            id: Uuid::new_v4(),
            full_name: lead.full_name,
            email: lead.email,
            phone: lead.phone,
            rut: lead.rut,
            document_type: lead.document_type,
            status: lead.status,
            source: lead.source,
            pipeline_stage: lead.pipeline_stage,
            last_contact_date: Utc::now(),
            assigned_to_user_id: None,
            notes: None,
            metadata: None,
            crm_external_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn apply(&self, id: Uuid, changes: LeadChanges) -> Result<Option<CrmLead>, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };
        if let Some(v) = changes.full_name {
            row.full_name = v;
        }
        if let Some(v) = changes.email {
            row.email = v;
        }
        if let Some(v) = changes.phone {
            row.phone = v;
        }
        if let Some(v) = changes.rut {
            row.rut = Some(v);
        }
        if let Some(v) = changes.document_type {
            row.document_type = Some(v);
        }
        if let Some(v) = changes.status {
            row.status = v;
        }
        if let Some(v) = changes.pipeline_stage {
            row.pipeline_stage = v;
        }
        if let Some(v) = changes.assigned_to_user_id {
            row.assigned_to_user_id = v;
        }
        if let Some(v) = changes.notes {
            row.notes = Some(v);
        }
        if let Some(v) = changes.last_contact_date {
            row.last_contact_date = v;
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn set_external_id(&self, id: Uuid, external_id: &str) -> Result<(), AppError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|l| l.id == id) {
            row.crm_external_id = Some(external_id.to_string());
        }
        Ok(())
    }

    async fn list(&self, filter: &LeadFilter) -> Result<(Vec<CrmLead>, i64), AppError> {
        let rows = self.rows.lock().unwrap();
        let matched: Vec<CrmLead> = rows
            .iter()
            .filter(|l| filter.status.is_none_or(|s| l.status == s))
            .filter(|l| filter.pipeline_stage.is_none_or(|s| l.pipeline_stage == s))
            .filter(|l| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|q| l.full_name.contains(q) || l.email.contains(q))
            })
            .cloned()
            .collect();
        let total = matched.len() as i64;
        let offset = ((filter.page - 1) * filter.limit).max(0) as usize;
        let page: Vec<CrmLead> = matched
            .into_iter()
            .skip(offset)
            .take(filter.limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }
}

#[derive(Default)]
pub struct MemoryMessages {
    rows: Mutex<Vec<WhatsappMessage>>,
}

impl MemoryMessages {
    pub fn all(&self) -> Vec<WhatsappMessage> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageStore for MemoryMessages {
    async fn insert(&self, message: NewWhatsappMessage) -> Result<WhatsappMessage, AppError> {
        let row = WhatsappMessage {
            id: Uuid::new_v4(),
            lead_id: message.lead_id,
            user_id: message.user_id,
            direction: message.direction,
            phone_number: message.phone_number,
            message_type: message.message_type,
            content: message.content,
            template_name: message.template_name,
            status: message.status,
            external_message_id: message.external_message_id,
            metadata: message.metadata,
            sent_at: Utc::now(),
            delivered_at: None,
            read_at: None,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn mark_sent(&self, id: Uuid, external_id: &str) -> Result<(), AppError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|m| m.id == id) {
            row.status = MessageStatus::Sent;
            row.external_message_id = Some(external_id.to_string());
        }
        Ok(())
    }

    async fn list(&self, filter: &MessageFilter) -> Result<(Vec<WhatsappMessage>, i64), AppError> {
        let rows = self.rows.lock().unwrap();
        let matched: Vec<WhatsappMessage> = rows
            .iter()
            .filter(|m| filter.direction.is_none_or(|d| m.direction == d))
            .filter(|m| filter.status.is_none_or(|s| m.status == s))
            .filter(|m| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|q| m.phone_number.contains(q) || m.content.contains(q))
            })
            .cloned()
            .collect();
        let total = matched.len() as i64;
        Ok((matched, total))
    }

    async fn list_by_lead(&self, lead_id: Uuid) -> Result<Vec<WhatsappMessage>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.lead_id == Some(lead_id))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemorySessions {
    rows: Mutex<Vec<DialogflowSession>>,
}

impl MemorySessions {
    pub fn seed_active(&self) -> DialogflowSession {
        let session = DialogflowSession {
            id: Uuid::new_v4(),
            lead_id: None,
            user_id: None,
            session_id: format!("{}-test", Utc::now().timestamp_millis()),
            intent: None,
            parameters: None,
            status: SessionStatus::Active,
            transferred_to_user_id: None,
            metadata: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_interaction_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(session.clone());
        session
    }

    pub fn all(&self) -> Vec<DialogflowSession> {
        self.rows.lock().unwrap().clone()
    }

    pub fn get(&self, id: Uuid) -> DialogflowSession {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .unwrap()
    }
}

#[async_trait]
impl SessionStore for MemorySessions {
    async fn insert(
        &self,
        session: NewDialogflowSession,
    ) -> Result<DialogflowSession, AppError> {
        let row = DialogflowSession {
            id: Uuid::new_v4(),
            lead_id: session.lead_id,
            user_id: session.user_id,
            session_id: session.session_id,
            intent: None,
            parameters: None,
            status: SessionStatus::Active,
            transferred_to_user_id: None,
            metadata: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_interaction_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DialogflowSession>, AppError> {
        Ok(self.rows.lock().unwrap().iter().find(|s| s.id == id).cloned())
    }

    async fn find_active_by_lead(
        &self,
        lead_id: Uuid,
    ) -> Result<Option<DialogflowSession>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.lead_id == Some(lead_id) && s.status == SessionStatus::Active)
            .max_by_key(|s| s.last_interaction_at)
            .cloned())
    }

    async fn record_turn(
        &self,
        id: Uuid,
        intent: &str,
        parameters: &Value,
    ) -> Result<(), AppError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|s| s.id == id) {
            row.intent = Some(intent.to_string());
            row.parameters = Some(parameters.clone());
            row.last_interaction_at = Utc::now();
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn transfer(
        &self,
        id: Uuid,
        transferred_to_user_id: Option<Uuid>,
    ) -> Result<Option<DialogflowSession>, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        row.status = SessionStatus::Transferred;
        row.transferred_to_user_id = transferred_to_user_id;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn list(
        &self,
        filter: &SessionFilter,
    ) -> Result<(Vec<DialogflowSession>, i64), AppError> {
        let rows = self.rows.lock().unwrap();
        let matched: Vec<DialogflowSession> = rows
            .iter()
            .filter(|s| filter.status.is_none_or(|st| s.status == st))
            .cloned()
            .collect();
        let total = matched.len() as i64;
        Ok((matched, total))
    }

    async fn list_by_lead(&self, lead_id: Uuid) -> Result<Vec<DialogflowSession>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.lead_id == Some(lead_id))
            .cloned()
            .collect())
    }
}

pub struct MemoryRules {
    rows: Vec<AutomationRule>,
}

impl MemoryRules {
    pub fn with_rules(rows: Vec<AutomationRule>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl RuleStore for MemoryRules {
    async fn find_event_rules(&self, event: &str) -> Result<Vec<AutomationRule>, AppError> {
        Ok(self
            .rows
            .iter()
            .filter(|r| {
                r.trigger_type == TriggerType::EventBased
                    && r.trigger_event.as_deref() == Some(event)
                    && r.is_active
            })
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<AutomationRule>, AppError> {
        Ok(self.rows.clone())
    }
}

// --- CLIENTES EXTERNOS ---

/// Provedor de WhatsApp que grava as chamadas e responde com um roteiro fixo.
pub struct RecordingProvider {
    external_id: Option<String>,
    inbound: Option<InboundMessage>,
    text_calls: Mutex<Vec<String>>,
    template_calls: Mutex<Vec<(String, String, HashMap<String, String>)>>,
}

impl RecordingProvider {
    pub fn succeeding(external_id: &str) -> Self {
        Self {
            external_id: Some(external_id.to_string()),
            inbound: None,
            text_calls: Mutex::new(Vec::new()),
            template_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            external_id: None,
            inbound: None,
            text_calls: Mutex::new(Vec::new()),
            template_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_inbound(mut self, inbound: InboundMessage) -> Self {
        self.inbound = Some(inbound);
        self
    }

    pub fn text_calls(&self) -> Vec<String> {
        self.text_calls.lock().unwrap().clone()
    }

    pub fn template_calls(&self) -> Vec<(String, String, HashMap<String, String>)> {
        self.template_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WhatsappProvider for RecordingProvider {
    async fn send_text(&self, message: &WhatsappMessage) -> Outcome<String> {
        self.text_calls
            .lock()
            .unwrap()
            .push(message.phone_number.clone());
        match &self.external_id {
            Some(id) => Outcome::Done(id.clone()),
            None => Outcome::Failed,
        }
    }

    async fn send_template(
        &self,
        message: &WhatsappMessage,
        template_name: &str,
        parameters: &HashMap<String, String>,
    ) -> Outcome<String> {
        self.template_calls.lock().unwrap().push((
            message.phone_number.clone(),
            template_name.to_string(),
            parameters.clone(),
        ));
        match &self.external_id {
            Some(id) => Outcome::Done(id.clone()),
            None => Outcome::Failed,
        }
    }

    fn parse_webhook(&self, _payload: &Value) -> Option<InboundMessage> {
        self.inbound.clone()
    }
}

/// CRM que conta as chamadas recebidas.
#[derive(Default)]
pub struct RecordingCrm {
    sync_calls: Mutex<u32>,
    update_calls: Mutex<u32>,
}

impl RecordingCrm {
    pub fn sync_calls(&self) -> u32 {
        *self.sync_calls.lock().unwrap()
    }

    pub fn update_calls(&self) -> u32 {
        *self.update_calls.lock().unwrap()
    }
}

#[async_trait]
impl CrmClient for RecordingCrm {
    async fn sync_lead(&self, lead: &CrmLead) -> Outcome<String> {
        *self.sync_calls.lock().unwrap() += 1;
        match &lead.crm_external_id {
            Some(id) => Outcome::Done(id.clone()),
            None => Outcome::Done(format!("crm-{}", lead.id.as_simple())),
        }
    }

    async fn update_lead(&self, _lead: &CrmLead) -> Outcome<()> {
        *self.update_calls.lock().unwrap() += 1;
        Outcome::Done(())
    }
}

/// Detector de intents roteirizado.
pub enum ScriptedIntentClient {
    Replying(IntentResult),
    Skipping,
    Failing,
}

impl ScriptedIntentClient {
    pub fn replying(result: IntentResult) -> Self {
        Self::Replying(result)
    }

    pub fn skipping() -> Self {
        Self::Skipping
    }

    pub fn failing() -> Self {
        Self::Failing
    }
}

#[async_trait]
impl IntentClient for ScriptedIntentClient {
    async fn detect_intent(&self, _session_id: &str, _text: &str) -> Outcome<IntentResult> {
        match self {
            Self::Replying(result) => Outcome::Done(result.clone()),
            Self::Skipping => Outcome::Skipped,
            Self::Failing => Outcome::Failed,
        }
    }

    async fn trigger_event(&self, _session_id: &str, _event: &str) -> Outcome<()> {
        match self {
            Self::Replying(_) => Outcome::Done(()),
            Self::Skipping => Outcome::Skipped,
            Self::Failing => Outcome::Failed,
        }
    }
}

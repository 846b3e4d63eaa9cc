// src/services/automation_service.rs

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::{
    clients::CrmClient,
    common::error::AppError,
    db::{LeadStore, RuleStore, SessionStore},
    models::{
        auth::User,
        automation::{
            AutomationRule, DocumentInfo, EventPayload, RuleAction, SendWhatsappConfig,
            TransferToHumanConfig, UpdateLeadConfig,
        },
        crm::{LeadChanges, LeadSource, LeadStatus, NewCrmLead},
    },
    services::whatsapp_service::WhatsappService,
};

/// Converte o status livre do documento para o status do lead.
/// Valores desconhecidos caem em Initiated.
pub fn map_document_status(document_status: &str) -> LeadStatus {
    match document_status {
        "draft" => LeadStatus::Initiated,
        "pending_payment" | "pending_identity" | "pending_signature" => LeadStatus::DataCompleted,
        "pending_certification" => LeadStatus::PaymentCompleted,
        "certified" => LeadStatus::Certified,
        "rejected" => LeadStatus::Incomplete,
        _ => LeadStatus::Initiated,
    }
}

/// Despacha eventos do sistema para as regras de automação ativas e mantém os
/// leads do CRM em dia com o ciclo de vida dos documentos.
#[derive(Clone)]
pub struct AutomationService {
    rules: Arc<dyn RuleStore>,
    leads: Arc<dyn LeadStore>,
    sessions: Arc<dyn SessionStore>,
    crm: Arc<dyn CrmClient>,
    whatsapp: WhatsappService,
}

impl AutomationService {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        leads: Arc<dyn LeadStore>,
        sessions: Arc<dyn SessionStore>,
        crm: Arc<dyn CrmClient>,
        whatsapp: WhatsappService,
    ) -> Self {
        Self {
            rules,
            leads,
            sessions,
            crm,
            whatsapp,
        }
    }

    /// Executa todas as regras event_based ativas para o evento, na ordem de
    /// criação. Cada regra falha isolada: logamos e seguimos para a próxima.
    pub async fn process_event(
        &self,
        event_type: &str,
        payload: &EventPayload,
        actor: Option<&User>,
    ) -> Result<(), AppError> {
        let rules = self.rules.find_event_rules(event_type).await?;

        for rule in rules {
            if let Err(err) = self.execute_rule(&rule, payload, actor).await {
                tracing::error!("Erro ao executar a regra '{}': {}", rule.name, err);
            }
        }

        Ok(())
    }

    /// Reage a um evento de ciclo de vida de documento: cria ou atualiza o
    /// lead correspondente, sincroniza com o CRM externo e então dispara as
    /// regras de automação com `{document, lead}`.
    pub async fn handle_document_event(
        &self,
        document: &DocumentInfo,
        event_type: &str,
        user: Option<&User>,
    ) -> Result<(), AppError> {
        let Some(user) = user else {
            tracing::warn!("Evento de documento '{}' sem usuário associado", event_type);
            return Ok(());
        };

        let status = map_document_status(&document.status);

        let lead = match self.leads.find_by_email(&user.email).await? {
            None => {
                let created = self
                    .leads
                    .insert(NewCrmLead {
                        full_name: user.full_name.clone(),
                        email: user.email.clone(),
                        phone: user.phone.clone().unwrap_or_default(),
                        rut: None,
                        document_type: Some(document.title.clone()),
                        status,
                        source: LeadSource::Webapp,
                        pipeline_stage: status,
                    })
                    .await?;

                if let Some(external_id) = self.crm.sync_lead(&created).await.value() {
                    self.leads.set_external_id(created.id, &external_id).await?;
                }

                created
            }
            Some(existing) => {
                let updated = self
                    .leads
                    .apply(
                        existing.id,
                        LeadChanges {
                            status: Some(status),
                            pipeline_stage: Some(status),
                            document_type: Some(document.title.clone()),
                            last_contact_date: Some(Utc::now()),
                            ..Default::default()
                        },
                    )
                    .await?
                    .ok_or(AppError::LeadNotFound)?;

                if updated.crm_external_id.is_some() {
                    let _ = self.crm.update_lead(&updated).await;
                }

                updated
            }
        };

        let payload = EventPayload {
            document: Some(document.clone()),
            lead: Some(lead),
            dialogflow_session: None,
        };

        self.process_event(event_type, &payload, Some(user)).await
    }

    async fn execute_rule(
        &self,
        rule: &AutomationRule,
        payload: &EventPayload,
        actor: Option<&User>,
    ) -> Result<(), AppError> {
        let action = rule
            .action()
            .map_err(|e| anyhow::anyhow!("action_config inválido: {}", e))?;

        match action {
            RuleAction::SendWhatsapp(config) => {
                self.execute_send_whatsapp(&config, payload, actor).await
            }
            RuleAction::CreateLead(_) => {
                // A criação do lead acontece incondicionalmente em
                // handle_document_event; a ação é um ponto de extensão.
                tracing::info!("Ação create_lead executada via regra '{}'", rule.name);
                Ok(())
            }
            RuleAction::UpdateLead(config) => self.execute_update_lead(&config, payload).await,
            RuleAction::TransferToHuman(config) => {
                self.execute_transfer_to_human(&config, payload).await
            }
        }
    }

    async fn execute_send_whatsapp(
        &self,
        config: &SendWhatsappConfig,
        payload: &EventPayload,
        actor: Option<&User>,
    ) -> Result<(), AppError> {
        // Resolve o telefone: estático da config ou dinâmico do payload
        let dynamic_lead_phone = payload
            .lead
            .as_ref()
            .map(|l| l.phone.as_str())
            .filter(|p| !p.is_empty());
        // Telefone do autor só vale quando o documento identifica o dono
        let document_has_owner = payload
            .document
            .as_ref()
            .is_some_and(|d| d.user_id.is_some());
        let dynamic_actor_phone = actor
            .filter(|_| document_has_owner)
            .and_then(|u| u.phone.as_deref())
            .filter(|p| !p.is_empty());

        let phone_number = if config.use_dynamic_phone {
            dynamic_lead_phone
                .or(dynamic_actor_phone)
                .or(config.phone_number.as_deref())
        } else {
            config.phone_number.as_deref()
        };

        let Some(phone_number) = phone_number else {
            tracing::warn!("Sem número de telefone disponível para a mensagem de WhatsApp");
            return Ok(());
        };

        let mut parameters = HashMap::new();
        if let Some(document) = &payload.document {
            parameters.insert("document_title".to_string(), document.title.clone());
            parameters.insert("document_status".to_string(), document.status.clone());
        }
        if let Some(actor) = actor {
            parameters.insert("user_name".to_string(), actor.full_name.clone());
        }

        self.whatsapp
            .send_template_message(
                phone_number,
                &config.template_name,
                &parameters,
                payload.lead.as_ref().map(|l| l.id),
                actor.map(|u| u.id),
            )
            .await?;

        Ok(())
    }

    async fn execute_update_lead(
        &self,
        config: &UpdateLeadConfig,
        payload: &EventPayload,
    ) -> Result<(), AppError> {
        let Some(lead) = &payload.lead else {
            tracing::warn!("Sem lead disponível para atualizar");
            return Ok(());
        };

        let updated = self
            .leads
            .apply(
                lead.id,
                LeadChanges {
                    status: config.status,
                    pipeline_stage: config.pipeline_stage,
                    last_contact_date: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?
            .ok_or(AppError::LeadNotFound)?;

        if updated.crm_external_id.is_some() {
            let _ = self.crm.update_lead(&updated).await;
        }

        Ok(())
    }

    async fn execute_transfer_to_human(
        &self,
        config: &TransferToHumanConfig,
        payload: &EventPayload,
    ) -> Result<(), AppError> {
        let Some(session) = &payload.dialogflow_session else {
            tracing::warn!("Sem sessão de Dialogflow disponível para transferir");
            return Ok(());
        };

        self.sessions
            .transfer(session.id, config.assign_to_user_id)
            .await?;

        if let Some(lead) = &payload.lead {
            let note = format!(
                "{}\nTransferido a agente humano el {}",
                lead.notes.as_deref().unwrap_or(""),
                Utc::now().format("%d-%m-%Y %H:%M")
            );

            let updated = self
                .leads
                .apply(
                    lead.id,
                    LeadChanges {
                        assigned_to_user_id: Some(config.assign_to_user_id),
                        notes: Some(note),
                        ..Default::default()
                    },
                )
                .await?
                .ok_or(AppError::LeadNotFound)?;

            if updated.crm_external_id.is_some() {
                let _ = self.crm.update_lead(&updated).await;
            }
        }

        Ok(())
    }
}

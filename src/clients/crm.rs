// src/clients/crm.rs

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{
    common::outcome::Outcome,
    models::crm::{CrmLead, LeadStatus},
};

/// Adaptador para o CRM externo. O formato exato do outro lado é opaco; o que
/// importa aqui é o contrato: sincronizar devolve o ID externo, atualizar é
/// fire-and-forget.
#[async_trait]
pub trait CrmClient: Send + Sync {
    /// Cria (ou atualiza, se já houver ID externo) o lead no CRM.
    /// Devolve o ID externo do lead.
    async fn sync_lead(&self, lead: &CrmLead) -> Outcome<String>;

    /// Empurra o estado atual do lead para o CRM. Requer `crm_external_id`.
    async fn update_lead(&self, lead: &CrmLead) -> Outcome<()>;
}

// Mapeamento dos estados internos para os estados do CRM
fn crm_status(status: LeadStatus) -> &'static str {
    match status {
        LeadStatus::Initiated => "nuevo",
        LeadStatus::DataCompleted => "datos_completos",
        LeadStatus::PaymentCompleted => "pago_realizado",
        LeadStatus::Certified => "certificado",
        LeadStatus::Rejected => "rechazado",
        LeadStatus::Incomplete => "incompleto",
    }
}

// Mapeamento das etapas internas para as etapas do pipeline do CRM
fn crm_pipeline_stage(stage: LeadStatus) -> &'static str {
    match stage {
        LeadStatus::Initiated => "etapa_inicial",
        LeadStatus::DataCompleted => "etapa_datos",
        LeadStatus::PaymentCompleted => "etapa_pago",
        LeadStatus::Certified => "etapa_final",
        LeadStatus::Rejected => "etapa_rechazado",
        LeadStatus::Incomplete => "etapa_abandono",
    }
}

pub struct HttpCrmClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl HttpCrmClient {
    pub fn new(http: reqwest::Client, api_url: String, api_key: String) -> Self {
        Self {
            http,
            api_url,
            api_key,
        }
    }

    fn configured(&self) -> bool {
        if self.api_key.is_empty() || self.api_url.is_empty() {
            tracing::warn!("Configuração da API do CRM está incompleta");
            return false;
        }
        true
    }

    fn map_lead(&self, lead: &CrmLead) -> Value {
        json!({
            "fullName": lead.full_name,
            "email": lead.email,
            "phone": lead.phone,
            "documentType": lead.document_type,
            "status": crm_status(lead.status),
            "pipelineStage": crm_pipeline_stage(lead.pipeline_stage),
            "source": lead.source,
            "rut": lead.rut,
            "notes": lead.notes,
            "assignedTo": lead.assigned_to_user_id.map(|id| id.to_string()),
            "lastContactDate": lead.last_contact_date.to_rfc3339(),
            "additionalData": { "internalId": lead.id }
        })
    }
}

#[async_trait]
impl CrmClient for HttpCrmClient {
    async fn sync_lead(&self, lead: &CrmLead) -> Outcome<String> {
        if !self.configured() {
            return Outcome::Skipped;
        }

        // Se já tem ID externo, atualiza em vez de criar
        if let Some(external_id) = &lead.crm_external_id {
            return self.update_lead(lead).await.map(|_| external_id.clone());
        }

        let result = self
            .http
            .post(format!("{}/leads", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&self.map_lead(lead))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<Value>().await {
                    Ok(body) => match body.get("id").and_then(Value::as_str) {
                        Some(id) => Outcome::Done(id.to_string()),
                        None => {
                            tracing::error!("Resposta do CRM sem 'id': {}", body);
                            Outcome::Failed
                        }
                    },
                    Err(err) => {
                        tracing::error!("Erro ao decodificar resposta do CRM: {}", err);
                        Outcome::Failed
                    }
                }
            }
            Ok(response) => {
                tracing::error!("CRM respondeu {}", response.status());
                Outcome::Failed
            }
            Err(err) => {
                tracing::error!("Erro ao sincronizar lead com o CRM: {}", err);
                Outcome::Failed
            }
        }
    }

    async fn update_lead(&self, lead: &CrmLead) -> Outcome<()> {
        let Some(external_id) = &lead.crm_external_id else {
            tracing::warn!("Lead {} sem crm_external_id; atualização ignorada", lead.id);
            return Outcome::Skipped;
        };
        if !self.configured() {
            return Outcome::Skipped;
        }

        let result = self
            .http
            .patch(format!("{}/leads/{}", self.api_url, external_id))
            .bearer_auth(&self.api_key)
            .json(&self.map_lead(lead))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => Outcome::Done(()),
            Ok(response) => {
                tracing::error!("CRM respondeu {}", response.status());
                Outcome::Failed
            }
            Err(err) => {
                tracing::error!("Erro ao atualizar lead no CRM: {}", err);
                Outcome::Failed
            }
        }
    }
}

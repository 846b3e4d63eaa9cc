// src/services/dialogflow_service.rs

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    clients::IntentClient,
    common::{error::AppError, outcome::Outcome},
    db::SessionStore,
    models::{
        dialogflow::{DialogflowSession, IntentResult, NewDialogflowSession, TRANSFER_INTENT},
        whatsapp::WhatsappMessage,
    },
    services::whatsapp_service::WhatsappService,
};

// Resposta quando a integração com o agente não está configurada
const UNAVAILABLE_TEXT: &str =
    "Lo siento, el sistema de asistencia virtual no está disponible en este momento.";
// Resposta quando o agente falhou ao processar o turno
const ERROR_TEXT: &str =
    "Lo siento, tuve un problema para procesar tu mensaje. Por favor, intenta nuevamente.";

/// Gerencia o ciclo de vida das sessões de conversa: cria a sessão local,
/// encaminha cada turno ao agente, persiste intent/parâmetros e dispara a
/// transferência para humano quando o intent reservado aparece.
#[derive(Clone)]
pub struct DialogflowService {
    sessions: Arc<dyn SessionStore>,
    intent_client: Arc<dyn IntentClient>,
    whatsapp: WhatsappService,
}

impl DialogflowService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        intent_client: Arc<dyn IntentClient>,
        whatsapp: WhatsappService,
    ) -> Self {
        Self {
            sessions,
            intent_client,
            whatsapp,
        }
    }

    /// Processa um turno: manda o texto ao agente e registra o resultado na
    /// sessão. As falhas do agente viram respostas de fallback: o chamador
    /// sempre recebe algo para responder ao usuário.
    pub async fn process_message(
        &self,
        message: &WhatsappMessage,
        session: &DialogflowSession,
    ) -> Result<IntentResult, AppError> {
        let result = match self
            .intent_client
            .detect_intent(&session.session_id, &message.content)
            .await
        {
            Outcome::Done(result) => result,
            Outcome::Skipped => {
                return Ok(IntentResult {
                    response_text: UNAVAILABLE_TEXT.to_string(),
                    intent: "default.fallback".to_string(),
                    parameters: json!({}),
                });
            }
            Outcome::Failed => {
                return Ok(IntentResult {
                    response_text: ERROR_TEXT.to_string(),
                    intent: "error".to_string(),
                    parameters: json!({}),
                });
            }
        };

        self.sessions
            .record_turn(session.id, &result.intent, &result.parameters)
            .await?;

        if result.intent == TRANSFER_INTENT {
            self.sessions.transfer(session.id, None).await?;
        }

        Ok(result)
    }

    /// Cria uma sessão local e dispara o evento WELCOME no agente. O evento é
    /// best-effort: a sessão existe mesmo que o agente não responda.
    pub async fn create_session(
        &self,
        lead_id: Option<Uuid>,
        user_id: Option<Uuid>,
    ) -> Result<DialogflowSession, AppError> {
        let suffix = Uuid::new_v4().as_simple().to_string();
        let session_id = format!("{}-{}", Utc::now().timestamp_millis(), &suffix[..8]);

        let _ = self.intent_client.trigger_event(&session_id, "WELCOME").await;

        self.sessions
            .insert(NewDialogflowSession {
                lead_id,
                user_id,
                session_id,
            })
            .await
    }

    /// Envia a resposta do agente de volta pelo WhatsApp.
    pub async fn send_response(
        &self,
        phone_number: &str,
        response_text: &str,
        lead_id: Option<Uuid>,
    ) -> Result<Option<String>, AppError> {
        self.whatsapp
            .send_text_message(phone_number, response_text, lead_id, None)
            .await
    }

    /// Transferência manual disparada por um administrador.
    pub async fn transfer_session(
        &self,
        id: Uuid,
        transferred_to_user_id: Option<Uuid>,
    ) -> Result<DialogflowSession, AppError> {
        self.sessions
            .transfer(id, transferred_to_user_id)
            .await?
            .ok_or(AppError::SessionNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dialogflow::SessionStatus;
    use crate::services::test_support::{
        MemoryLeads, MemoryMessages, MemorySessions, RecordingProvider, ScriptedIntentClient,
    };

    fn service(client: ScriptedIntentClient) -> (DialogflowService, Arc<MemorySessions>) {
        let sessions = Arc::new(MemorySessions::default());
        let whatsapp = WhatsappService::new(
            Arc::new(MemoryMessages::default()),
            Arc::new(MemoryLeads::default()),
            Arc::new(RecordingProvider::succeeding("SM1")),
        );
        let service = DialogflowService::new(sessions.clone(), Arc::new(client), whatsapp);
        (service, sessions)
    }

    fn incoming(content: &str) -> WhatsappMessage {
        crate::services::test_support::incoming_message(content)
    }

    #[tokio::test]
    async fn successful_turn_records_intent_on_session() {
        let client = ScriptedIntentClient::replying(IntentResult {
            response_text: "Su documento está en revisión.".into(),
            intent: "document.status".into(),
            parameters: json!({ "tipo": "contrato" }),
        });
        let (service, sessions) = service(client);
        let session = sessions.seed_active();

        let result = service
            .process_message(&incoming("¿Cómo va mi trámite?"), &session)
            .await
            .unwrap();

        assert_eq!(result.intent, "document.status");
        let updated = sessions.get(session.id);
        assert_eq!(updated.intent.as_deref(), Some("document.status"));
        assert_eq!(updated.status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn transfer_intent_marks_session_transferred() {
        let client = ScriptedIntentClient::replying(IntentResult {
            response_text: "Te comunico con un agente.".into(),
            intent: TRANSFER_INTENT.into(),
            parameters: json!({}),
        });
        let (service, sessions) = service(client);
        let session = sessions.seed_active();

        service
            .process_message(&incoming("quiero hablar con alguien"), &session)
            .await
            .unwrap();

        assert_eq!(sessions.get(session.id).status, SessionStatus::Transferred);
    }

    #[tokio::test]
    async fn unconfigured_agent_returns_unavailable_fallback() {
        let (service, sessions) = service(ScriptedIntentClient::skipping());
        let session = sessions.seed_active();

        let result = service
            .process_message(&incoming("hola"), &session)
            .await
            .unwrap();

        assert_eq!(result.response_text, UNAVAILABLE_TEXT);
        assert_eq!(result.intent, "default.fallback");
        // Nenhum turno registrado
        assert!(sessions.get(session.id).intent.is_none());
    }

    #[tokio::test]
    async fn agent_failure_returns_error_fallback() {
        let (service, sessions) = service(ScriptedIntentClient::failing());
        let session = sessions.seed_active();

        let result = service
            .process_message(&incoming("hola"), &session)
            .await
            .unwrap();

        assert_eq!(result.intent, "error");
        assert_eq!(result.response_text, ERROR_TEXT);
    }

    #[tokio::test]
    async fn create_session_survives_welcome_failure() {
        let (service, sessions) = service(ScriptedIntentClient::failing());

        let session = service.create_session(None, None).await.unwrap();

        assert_eq!(session.status, SessionStatus::Active);
        assert!(!session.session_id.is_empty());
        assert_eq!(sessions.get(session.id).id, session.id);
    }

    #[tokio::test]
    async fn manual_transfer_of_missing_session_is_not_found() {
        let (service, _) = service(ScriptedIntentClient::skipping());

        let err = service
            .transfer_session(Uuid::new_v4(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SessionNotFound));
    }
}

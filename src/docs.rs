// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,

        // --- CRM ---
        handlers::crm::list_leads,
        handlers::crm::get_lead,
        handlers::crm::update_lead,

        // --- WhatsApp ---
        handlers::whatsapp::list_messages,
        handlers::whatsapp::send_message,
        handlers::whatsapp::webhook,

        // --- Dialogflow ---
        handlers::dialogflow::list_sessions,
        handlers::dialogflow::get_session,
        handlers::dialogflow::transfer_session,

        // --- Automation ---
        handlers::automation::document_event,
        handlers::automation::list_rules,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- CRM ---
            models::crm::LeadStatus,
            models::crm::LeadSource,
            models::crm::CrmLead,
            handlers::crm::UpdateLeadPayload,

            // --- WhatsApp ---
            models::whatsapp::MessageDirection,
            models::whatsapp::MessageType,
            models::whatsapp::MessageStatus,
            models::whatsapp::WhatsappMessage,
            handlers::whatsapp::SendMessagePayload,

            // --- Dialogflow ---
            models::dialogflow::SessionStatus,
            models::dialogflow::DialogflowSession,
            handlers::dialogflow::TransferSessionPayload,

            // --- Automation ---
            models::automation::TriggerType,
            models::automation::ActionType,
            models::automation::AutomationRule,
            models::automation::DocumentInfo,
            handlers::automation::DocumentEventPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação"),
        (name = "CRM", description = "Gestão de Leads"),
        (name = "WhatsApp", description = "Gateway de Mensagens"),
        (name = "Dialogflow", description = "Sessões do Agente Virtual"),
        (name = "Automation", description = "Regras de Automação e Eventos")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

// src/handlers/whatsapp.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::pagination,
    models::whatsapp::{MessageDirection, MessageFilter, MessageStatus},
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MessageListQuery {
    pub search: Option<String>,
    pub direction: Option<MessageDirection>,
    pub status: Option<MessageStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

// GET /api/admin/whatsapp/messages
#[utoipa::path(
    get,
    path = "/api/admin/whatsapp/messages",
    tag = "WhatsApp",
    params(MessageListQuery),
    responses(
        (status = 200, description = "Listagem paginada de mensagens"),
        (status = 403, description = "Requer administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_messages(
    State(app_state): State<AppState>,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<Value>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (messages, total) = app_state
        .messages
        .list(&MessageFilter {
            search: query.search,
            direction: query.direction,
            status: query.status,
            page,
            limit,
        })
        .await?;

    Ok(Json(json!({
        "messages": messages,
        "pagination": pagination(total, page, limit),
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub phone_number: Option<String>,
    pub content: Option<String>,
    pub template_name: Option<String>,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
    pub lead_id: Option<Uuid>,
}

// POST /api/admin/whatsapp/send
#[utoipa::path(
    post,
    path = "/api/admin/whatsapp/send",
    tag = "WhatsApp",
    request_body = SendMessagePayload,
    responses(
        (status = 200, description = "Resultado do envio"),
        (status = 400, description = "Faltam campos obrigatórios")
    ),
    security(("api_jwt" = []))
)]
pub async fn send_message(
    State(app_state): State<AppState>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<Json<Value>, AppError> {
    let phone_number = payload
        .phone_number
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or(AppError::MissingRequiredFields)?;

    if payload.content.is_none() && payload.template_name.is_none() {
        return Err(AppError::MissingRequiredFields);
    }

    let message_id = if let Some(template_name) = &payload.template_name {
        app_state
            .whatsapp_service
            .send_template_message(
                phone_number,
                template_name,
                &payload.parameters,
                payload.lead_id,
                None,
            )
            .await?
    } else {
        let content = payload.content.as_deref().unwrap_or_default();
        app_state
            .whatsapp_service
            .send_text_message(phone_number, content, payload.lead_id, None)
            .await?
    };

    Ok(Json(json!({
        "success": message_id.is_some(),
        "messageId": message_id,
        "phoneNumber": phone_number,
    })))
}

// POST /api/whatsapp/webhook (pública: chamada pelo provedor)
//
// Ingesta a mensagem entrante, roda um turno de conversa contra a sessão
// ativa do lead (criando uma se necessário) e responde automaticamente.
#[utoipa::path(
    post,
    path = "/api/whatsapp/webhook",
    tag = "WhatsApp",
    responses(
        (status = 200, description = "Webhook processado")
    )
)]
pub async fn webhook(
    State(app_state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let Some(message) = app_state.whatsapp_service.process_webhook(&payload).await? else {
        return Ok(Json(json!({ "received": true })));
    };

    if message.direction != MessageDirection::Incoming {
        return Ok(Json(json!({ "received": true })));
    }

    // Sessão ativa do lead, ou uma nova quando não há
    let session = match message.lead_id {
        Some(lead_id) => match app_state.sessions.find_active_by_lead(lead_id).await? {
            Some(session) => session,
            None => {
                app_state
                    .dialogflow_service
                    .create_session(Some(lead_id), None)
                    .await?
            }
        },
        None => {
            app_state
                .dialogflow_service
                .create_session(None, None)
                .await?
        }
    };

    let result = app_state
        .dialogflow_service
        .process_message(&message, &session)
        .await?;

    app_state
        .dialogflow_service
        .send_response(&message.phone_number, &result.response_text, message.lead_id)
        .await?;

    Ok(Json(json!({
        "received": true,
        "intent": result.intent,
    })))
}

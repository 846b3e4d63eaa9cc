// src/handlers/automation.rs

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError, config::AppState, models::automation::DocumentInfo,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEventPayload {
    pub document: DocumentInfo,
    #[schema(example = "document.certified")]
    pub event_type: String,
    pub user_id: Option<Uuid>,
}

// POST /api/admin/automation/events/document
//
// Ponto de entrada para os eventos de ciclo de vida de documento: atualiza o
// lead no CRM e dispara as regras de automação correspondentes.
#[utoipa::path(
    post,
    path = "/api/admin/automation/events/document",
    tag = "Automation",
    request_body = DocumentEventPayload,
    responses(
        (status = 200, description = "Evento processado"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn document_event(
    State(app_state): State<AppState>,
    Json(payload): Json<DocumentEventPayload>,
) -> Result<Json<Value>, AppError> {
    let user = match payload.user_id {
        Some(user_id) => Some(
            app_state
                .user_repo
                .find_by_id(user_id)
                .await?
                .ok_or(AppError::UserNotFound)?,
        ),
        None => None,
    };

    app_state
        .automation_service
        .handle_document_event(&payload.document, &payload.event_type, user.as_ref())
        .await?;

    Ok(Json(json!({ "success": true })))
}

// GET /api/admin/automation/rules
#[utoipa::path(
    get,
    path = "/api/admin/automation/rules",
    tag = "Automation",
    responses(
        (status = 200, description = "Regras de automação cadastradas"),
        (status = 403, description = "Requer administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_rules(State(app_state): State<AppState>) -> Result<Json<Value>, AppError> {
    let rules = app_state.rules.list().await?;
    Ok(Json(json!({ "rules": rules })))
}

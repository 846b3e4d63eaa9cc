// src/handlers/dialogflow.rs

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::pagination,
    models::{
        crm::LeadChanges,
        dialogflow::{DialogflowSession, SessionFilter, SessionStatus},
    },
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SessionListQuery {
    pub status: Option<SessionStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

// GET /api/admin/dialogflow/sessions
#[utoipa::path(
    get,
    path = "/api/admin/dialogflow/sessions",
    tag = "Dialogflow",
    params(SessionListQuery),
    responses(
        (status = 200, description = "Listagem paginada de sessões"),
        (status = 403, description = "Requer administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_sessions(
    State(app_state): State<AppState>,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<Value>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (sessions, total) = app_state
        .sessions
        .list(&SessionFilter {
            status: query.status,
            page,
            limit,
        })
        .await?;

    Ok(Json(json!({
        "sessions": sessions,
        "pagination": pagination(total, page, limit),
    })))
}

// GET /api/admin/dialogflow/sessions/{id}
#[utoipa::path(
    get,
    path = "/api/admin/dialogflow/sessions/{id}",
    tag = "Dialogflow",
    params(("id" = Uuid, Path, description = "ID da sessão")),
    responses(
        (status = 200, description = "Sessão com as mensagens do lead"),
        (status = 404, description = "Sessão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_session(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let session = app_state
        .sessions
        .find_by_id(id)
        .await?
        .ok_or(AppError::SessionNotFound)?;

    let messages = match session.lead_id {
        Some(lead_id) => app_state.messages.list_by_lead(lead_id).await?,
        None => Vec::new(),
    };

    Ok(Json(json!({
        "session": session,
        "messages": messages,
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferSessionPayload {
    pub transferred_to_user_id: Option<Uuid>,
}

// PATCH /api/admin/dialogflow/sessions/{id}/transfer
//
// Caminho manual de transferência, paralelo à ação transfer_to_human das
// regras de automação.
#[utoipa::path(
    patch,
    path = "/api/admin/dialogflow/sessions/{id}/transfer",
    tag = "Dialogflow",
    params(("id" = Uuid, Path, description = "ID da sessão")),
    request_body = TransferSessionPayload,
    responses(
        (status = 200, description = "Sessão transferida", body = DialogflowSession),
        (status = 404, description = "Sessão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn transfer_session(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransferSessionPayload>,
) -> Result<Json<DialogflowSession>, AppError> {
    let session = app_state
        .dialogflow_service
        .transfer_session(id, payload.transferred_to_user_id)
        .await?;

    // Reatribui o lead associado, quando houver
    if let Some(lead_id) = session.lead_id {
        app_state
            .leads
            .apply(
                lead_id,
                LeadChanges {
                    assigned_to_user_id: Some(payload.transferred_to_user_id),
                    ..Default::default()
                },
            )
            .await?;
    }

    Ok(Json(session))
}

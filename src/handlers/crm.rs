// src/handlers/crm.rs

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
    models::crm::{CrmLead, LeadChanges, LeadFilter, LeadStatus},
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LeadListQuery {
    pub search: Option<String>,
    pub status: Option<LeadStatus>,
    pub pipeline_stage: Option<LeadStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

// GET /api/admin/crm/leads
#[utoipa::path(
    get,
    path = "/api/admin/crm/leads",
    tag = "CRM",
    params(LeadListQuery),
    responses(
        (status = 200, description = "Listagem paginada de leads"),
        (status = 403, description = "Requer administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    Query(query): Query<LeadListQuery>,
) -> Result<Json<Value>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (leads, total) = app_state
        .leads
        .list(&LeadFilter {
            search: query.search,
            status: query.status,
            pipeline_stage: query.pipeline_stage,
            page,
            limit,
        })
        .await?;

    Ok(Json(json!({
        "leads": leads,
        "pagination": pagination(total, page, limit),
    })))
}

// GET /api/admin/crm/leads/{id}
#[utoipa::path(
    get,
    path = "/api/admin/crm/leads/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead com mensagens e sessões associadas"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let lead = app_state
        .leads
        .find_by_id(id)
        .await?
        .ok_or(AppError::LeadNotFound)?;

    let messages = app_state.messages.list_by_lead(lead.id).await?;
    let sessions = app_state.sessions.list_by_lead(lead.id).await?;

    Ok(Json(json!({
        "lead": lead,
        "messages": messages,
        "sessions": sessions,
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadPayload {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub rut: Option<String>,
    pub document_type: Option<String>,
    pub status: Option<LeadStatus>,
    pub pipeline_stage: Option<LeadStatus>,
    pub assigned_to_user_id: Option<Uuid>,
    pub notes: Option<String>,
}

// PATCH /api/admin/crm/leads/{id}
#[utoipa::path(
    patch,
    path = "/api/admin/crm/leads/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do lead")),
    request_body = UpdateLeadPayload,
    responses(
        (status = 200, description = "Lead atualizado", body = CrmLead),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadPayload>,
) -> Result<Json<CrmLead>, AppError> {
    let lead = app_state
        .leads
        .apply(
            id,
            LeadChanges {
                full_name: payload.full_name,
                email: payload.email,
                phone: payload.phone,
                rut: payload.rut,
                document_type: payload.document_type,
                status: payload.status,
                pipeline_stage: payload.pipeline_stage,
                // O responsável é sempre sobrescrito, inclusive para remover
                assigned_to_user_id: Some(payload.assigned_to_user_id),
                notes: payload.notes,
                last_contact_date: None,
            },
        )
        .await?
        .ok_or(AppError::LeadNotFound)?;

    // Sincroniza com o CRM externo quando o lead já está vinculado
    if lead.crm_external_id.is_some() {
        let _ = app_state.crm.update_lead(&lead).await;
    }

    Ok(Json(lead))
}

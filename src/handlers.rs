// src/handlers.rs

pub mod auth;
pub mod automation;
pub mod crm;
pub mod dialogflow;
pub mod whatsapp;

use serde_json::{Value, json};

// Envelope de paginação compartilhado pelas listagens administrativas
pub(crate) fn pagination(total: i64, page: i64, limit: i64) -> Value {
    let pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
    json!({
        "total": total,
        "page": page,
        "limit": limit,
        "pages": pages,
    })
}

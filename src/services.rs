// src/services.rs

pub mod auth;
pub mod automation_service;
pub mod dialogflow_service;
pub mod whatsapp_service;

#[cfg(test)]
pub mod test_support;

pub use auth::AuthService;
pub use automation_service::AutomationService;
pub use dialogflow_service::DialogflowService;
pub use whatsapp_service::WhatsappService;

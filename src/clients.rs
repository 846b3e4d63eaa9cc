pub mod crm;
pub mod dialog360;
pub mod dialogflow;
pub mod twilio;
pub mod whatsapp;

pub use crm::{CrmClient, HttpCrmClient};
pub use dialogflow::{DialogflowClient, IntentClient};
pub use whatsapp::{ProviderKind, WhatsappConfig, WhatsappProvider, build_whatsapp_provider};

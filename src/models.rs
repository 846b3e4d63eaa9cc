pub mod auth;
pub mod automation;
pub mod crm;
pub mod dialogflow;
pub mod whatsapp;

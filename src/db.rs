pub mod user_repo;
pub use user_repo::UserRepository;
pub mod crm_repo;
pub use crm_repo::{CrmRepository, LeadStore};
pub mod whatsapp_repo;
pub use whatsapp_repo::{MessageStore, WhatsappRepository};
pub mod dialogflow_repo;
pub use dialogflow_repo::{DialogflowRepository, SessionStore};
pub mod automation_repo;
pub use automation_repo::{AutomationRepository, RuleStore};

// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    clients::{
        CrmClient, DialogflowClient, HttpCrmClient, ProviderKind, WhatsappConfig,
        build_whatsapp_provider,
    },
    db::{
        AutomationRepository, CrmRepository, DialogflowRepository, LeadStore, MessageStore,
        RuleStore, SessionStore, UserRepository, WhatsappRepository,
    },
    services::{AuthService, AutomationService, DialogflowService, WhatsappService},
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,

    pub user_repo: UserRepository,
    pub leads: Arc<dyn LeadStore>,
    pub messages: Arc<dyn MessageStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub rules: Arc<dyn RuleStore>,
    pub crm: Arc<dyn CrmClient>,

    pub auth_service: AuthService,
    pub whatsapp_service: WhatsappService,
    pub dialogflow_service: DialogflowService,
    pub automation_service: AutomationService,
}

impl AppState {
    // A assinatura retorna um Result: se a configuração falhar, a aplicação
    // não deve iniciar.
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let http = reqwest::Client::new();

        // --- Repositórios (acesso ao banco) ---
        let user_repo = UserRepository::new(db_pool.clone());
        let leads: Arc<dyn LeadStore> = Arc::new(CrmRepository::new(db_pool.clone()));
        let messages: Arc<dyn MessageStore> = Arc::new(WhatsappRepository::new(db_pool.clone()));
        let sessions: Arc<dyn SessionStore> =
            Arc::new(DialogflowRepository::new(db_pool.clone()));
        let rules: Arc<dyn RuleStore> = Arc::new(AutomationRepository::new(db_pool.clone()));

        // --- Clientes das integrações externas ---
        let provider = build_whatsapp_provider(&whatsapp_config_from_env(), http.clone());
        let crm: Arc<dyn CrmClient> = Arc::new(HttpCrmClient::new(
            http.clone(),
            env::var("CRM_API_URL").unwrap_or_default(),
            env::var("CRM_API_KEY").unwrap_or_default(),
        ));
        let intent_client = Arc::new(dialogflow_client_from_env(http));

        // --- Serviços ---
        let auth_service = AuthService::new(user_repo.clone(), jwt_secret.clone());
        let whatsapp_service = WhatsappService::new(messages.clone(), leads.clone(), provider);
        let dialogflow_service = DialogflowService::new(
            sessions.clone(),
            intent_client,
            whatsapp_service.clone(),
        );
        let automation_service = AutomationService::new(
            rules.clone(),
            leads.clone(),
            sessions.clone(),
            crm.clone(),
            whatsapp_service.clone(),
        );

        Ok(Self {
            db_pool,
            jwt_secret,
            user_repo,
            leads,
            messages,
            sessions,
            rules,
            crm,
            auth_service,
            whatsapp_service,
            dialogflow_service,
            automation_service,
        })
    }
}

// Lê a configuração do gateway de WhatsApp do ambiente. Chaves ausentes não
// derrubam o servidor: a integração fica inativa e os envios viram no-op.
fn whatsapp_config_from_env() -> WhatsappConfig {
    let api_key = env::var("WHATSAPP_API_KEY").unwrap_or_default();
    let api_url = env::var("WHATSAPP_API_URL").unwrap_or_default();

    if api_key.is_empty() || api_url.is_empty() {
        tracing::warn!(
            "WHATSAPP_API_KEY ou WHATSAPP_API_URL não definidas; a integração com o WhatsApp está inativa"
        );
    }

    WhatsappConfig {
        provider: env::var("WHATSAPP_PROVIDER")
            .ok()
            .map(|v| ProviderKind::from_env_value(&v)),
        api_key,
        api_url,
        from_number: env::var("WHATSAPP_FROM_NUMBER").unwrap_or_default(),
        account_sid: env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
        template_namespace: env::var("WHATSAPP_TEMPLATE_NAMESPACE").unwrap_or_default(),
    }
}

fn dialogflow_client_from_env(http: reqwest::Client) -> DialogflowClient {
    let api_key = env::var("DIALOGFLOW_API_KEY").unwrap_or_default();
    let project_id = env::var("DIALOGFLOW_PROJECT_ID").unwrap_or_default();
    let api_url = env::var("DIALOGFLOW_API_URL").unwrap_or_else(|_| {
        format!("https://dialogflow.googleapis.com/v2/projects/{project_id}")
    });

    if api_key.is_empty() {
        tracing::warn!("DIALOGFLOW_API_KEY não definida; o agente virtual está inativo");
    }

    DialogflowClient::new(http, api_url, api_key)
}

//src/main.rs

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, patch, post},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod clients;
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::auth::{admin_middleware, auth_middleware};

#[tokio::main]
async fn main() {
    // Inicializa o logger
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas de autenticação (públicas)
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    // Rotas de usuário (protegidas)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    // Rotas administrativas das integrações: exigem token + papel de admin
    let admin_routes = Router::new()
        .route("/crm/leads", get(handlers::crm::list_leads))
        .route(
            "/crm/leads/{id}",
            get(handlers::crm::get_lead).patch(handlers::crm::update_lead),
        )
        .route("/whatsapp/messages", get(handlers::whatsapp::list_messages))
        .route("/whatsapp/send", post(handlers::whatsapp::send_message))
        .route(
            "/dialogflow/sessions",
            get(handlers::dialogflow::list_sessions),
        )
        .route(
            "/dialogflow/sessions/{id}",
            get(handlers::dialogflow::get_session),
        )
        .route(
            "/dialogflow/sessions/{id}/transfer",
            patch(handlers::dialogflow::transfer_session),
        )
        .route(
            "/automation/events/document",
            post(handlers::automation::document_event),
        )
        .route("/automation/rules", get(handlers::automation::list_rules))
        .layer(axum_middleware::from_fn(admin_middleware))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    // Webhook público chamado pelo provedor de WhatsApp
    let webhook_routes =
        Router::new().route("/webhook", post(handlers::whatsapp::webhook));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/whatsapp", webhook_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", addr);
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod ai;
mod auth;
mod config;
mod controllers;
mod integrations;

use ai::multi_agent::{self, AgentDependencies, LlmClassifier, Orchestrator};
use ai::{LanguageModel, OpenAIClient};
use auth::{CachedTokenProvider, PasswordGrant, StaticTokenProvider, TokenProvider};
use config::Config;
use integrations::{CsvSampleReader, FsSampleOpener, ReqwestAgentClient};

pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

fn startup_error(message: String) -> std::io::Error {
    log::error!("{}", message);
    std::io::Error::other(message)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    log::info!("Initializing language model client");
    let model: Arc<dyn LanguageModel> = Arc::new(OpenAIClient::new(&config.openai).map_err(startup_error)?);

    let tokens: Arc<dyn TokenProvider> = match &config.agent_access_token {
        Some(token) => {
            log::info!("Using static agent access token from AGENT_ACCESS_TOKEN");
            Arc::new(StaticTokenProvider::new(token.clone()))
        }
        None => {
            log::info!("Using password grant with {:?}", config.token_config_path);
            let grant = PasswordGrant::new(&config.token_config_path).map_err(startup_error)?;
            Arc::new(CachedTokenProvider::new(grant))
        }
    };

    if config.agent_tls_insecure {
        log::warn!("Agent service TLS certificates are not verified (AGENT_TLS_INSECURE)");
    }
    let http = Arc::new(ReqwestAgentClient::new(config.agent_tls_insecure).map_err(startup_error)?);

    let deps = AgentDependencies {
        model: Arc::clone(&model),
        tokens,
        http,
        opener: Arc::new(FsSampleOpener),
        reader: Arc::new(CsvSampleReader),
    };

    log::info!("Initializing agent registry");
    let registry = Arc::new(multi_agent::create_default_registry(&config, &deps));
    if registry.is_empty() {
        return Err(startup_error("No agents registered".to_string()));
    }
    log::info!("Registered {} agents", registry.len());

    let orchestrator = Arc::new(
        Orchestrator::new(registry, Arc::new(LlmClassifier::new(model)))
            .with_executor_timeout(config.executor_timeout),
    );

    let bind_address = config.bind_address.clone();
    let port = config.port;
    let origins = config.cors_allowed_origins.clone();

    log::info!("Starting multi-agent server on {}:{}", bind_address, port);
    log::info!("Allowed CORS origins: {}", origins.join(", "));

    HttpServer::new(move || {
        let cors = origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                orchestrator: Arc::clone(&orchestrator),
            }))
            .app_data(controllers::chat::json_config())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config_routes)
            .configure(controllers::chat::config)
    })
    .bind((bind_address.as_str(), port))?
    .run()
    .await
}

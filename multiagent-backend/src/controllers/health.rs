use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::ai::multi_agent::AgentEndpoint;
use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/api/version").route(web::get().to(get_version)));
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let registry = state.orchestrator.registry();
    let agents: Vec<serde_json::Value> = registry
        .describe_all()
        .into_iter()
        .map(|(id, _)| {
            let endpoint = match registry.resolve(id) {
                Ok(AgentEndpoint::Http(url)) => url.as_str(),
                Ok(AgentEndpoint::LanguageModel) => "language-model",
                Err(_) => "unknown",
            };
            json!({ "id": id, "endpoint": endpoint })
        })
        .collect();

    HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": VERSION,
        "agents": agents
    }))
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "version": VERSION
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::multi_agent::testing::{StubClassifier, StubExecutor};
    use crate::ai::multi_agent::types::{AgentKind, AgentResult};
    use crate::ai::multi_agent::{AgentRegistry, Orchestrator};
    use actix_web::{test, App};
    use serde_json::Value;
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_health_lists_agents() {
        let mut registry = AgentRegistry::new();
        registry.register(
            AgentEndpoint::Http("https://svc.test/recon".into()),
            "reconciles",
            StubExecutor::arc(AgentKind::Reconciliation, AgentResult::success("ok")),
        );
        registry.register(
            AgentEndpoint::LanguageModel,
            "answers",
            StubExecutor::arc(AgentKind::Fallback, AgentResult::success("ok")),
        );
        let state = AppState {
            orchestrator: Arc::new(Orchestrator::new(
                Arc::new(registry),
                StubClassifier::tasks(vec![]),
            )),
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(config_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "ok");
        assert_eq!(
            body["agents"],
            json!([
                {"id": "reconciliation", "endpoint": "https://svc.test/recon"},
                {"id": "fallback", "endpoint": "language-model"}
            ])
        );
    }
}

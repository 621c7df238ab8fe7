//! Multi-agent chat endpoint

use actix_web::{error, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/multiagentchat").route(web::post().to(multiagent_chat)));
}

/// Malformed bodies answer in the same `{"result": "Error: ..."}` shape as run failures
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        log::warn!("[CHAT] Rejected request body: {}", message);
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(error_body(&message)),
        )
        .into()
    })
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    input: String,
}

fn error_body(message: &str) -> serde_json::Value {
    json!({ "result": format!("Error: {}", message) })
}

async fn multiagent_chat(state: web::Data<AppState>, body: web::Json<ChatRequest>) -> impl Responder {
    match state.orchestrator.run(&body.input).await {
        Ok(run) => HttpResponse::Ok().json(run.into_outputs()),
        Err(e) => {
            log::error!("[CHAT] Run failed: {}", e);
            HttpResponse::Ok().json(error_body(&e.to_string()))
        }
    }
}

/**
 * API HTTP LANWAKE TRIGGER - Pont HTTP -> MQTT
 *
 * RÔLE :
 * Permet de déclencher l'agent depuis un raccourci mobile, un webhook ou curl.
 *
 * ROUTES :
 * - GET /health : toujours "ok"
 * - GET /wol    : publie la commande wol sur le topic de commandes
 * - GET /ping   : vérifie que le broker accepte une session (aucune publication)
 *
 * Les réponses de l'agent (wol_sent, wol_ok...) ne transitent pas par ce pont.
 */

use crate::broker::CommandPublisher;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use lanwake_agent::command::Command;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub publisher: Arc<dyn CommandPublisher>,
    pub token_prefix: String,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/wol", get(wol))
        .route("/ping", get(ping))
        .with_state(app_state)
}

// GET /wol
async fn wol(State(app): State<AppState>) -> (StatusCode, Json<Value>) {
    let message = format!("{}{}", app.token_prefix, Command::Wol.token());
    match app.publisher.publish_command(message.clone()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "topic": app.publisher.topic(), "message": message })),
        ),
        Err(e) => {
            error!("Failed to publish {}: {}", message, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": format!("MQTT Error: {e}") })),
            )
        }
    }
}

// GET /ping
async fn ping(State(app): State<AppState>) -> (StatusCode, Json<Value>) {
    match app.publisher.check_broker().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "message": "server and MQTT broker awake" })),
        ),
        Err(e) => {
            error!("Broker check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": format!("MQTT broker unreachable: {e}") })),
            )
        }
    }
}

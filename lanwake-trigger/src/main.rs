/**
 * LANWAKE TRIGGER - Point d'entrée du pont HTTP
 *
 * RÔLE : expose /wol et /ping en HTTP et les relaie vers le broker MQTT
 * que l'agent écoute. Sessions MQTT courtes, une par requête.
 */

mod broker;
mod config;
mod http;

use crate::broker::MqttPublisher;
use crate::config::TriggerConfig;
use crate::http::{build_router, AppState};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lanwake_trigger=info")),
        )
        .init();

    let config = TriggerConfig::load().context("Failed to load trigger configuration")?;

    let publisher = MqttPublisher::new(config.broker.clone(), config.topics.commands.clone());
    let app = build_router(AppState {
        publisher: Arc::new(publisher),
        token_prefix: config.topics.token_prefix.clone(),
    });

    let addr = config.http.bind;
    info!("[trigger] listening on http://{addr}");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}

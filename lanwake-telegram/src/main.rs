/**
 * LANWAKE TELEGRAM - Bot de chat pour l'agent LanWake
 *
 * RÔLE : /wol, /ping et /status depuis Telegram sont publiés sur le topic
 * de commandes; les réponses de l'agent sont traduites en messages lisibles.
 * Seul l'utilisateur configuré (allowed_id) est servi.
 */

mod bot;
mod bridge;
mod config;
mod replies;

use crate::bot::{relay_responses, serve, BotState};
use crate::bridge::ResponseBridge;
use crate::config::BotConfig;
use anyhow::{Context, Result};
use lanwake_agent::link::mqtt_options;
use std::sync::Arc;
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lanwake_telegram=info")),
        )
        .init();

    let config = BotConfig::load().context("Failed to load Telegram bridge configuration")?;

    let (bridge, responses) = ResponseBridge::start(
        mqtt_options(&config.broker, "lanwake-telegram"),
        &config.topics,
    );
    info!(
        "[telegram] broker {}:{}, commands on {}, responses from {}",
        config.broker.host, config.broker.port, config.topics.commands, config.topics.responses
    );

    let bot = Bot::new(config.telegram.token.clone());
    tokio::spawn(relay_responses(
        bot.clone(),
        config.telegram.chat(),
        responses,
        config.topics.token_prefix.clone(),
    ));

    let state = Arc::new(BotState::new(
        Arc::new(bridge),
        config.telegram.allowed_user(),
        config.topics.token_prefix.clone(),
    ));
    serve(bot, state).await;
    Ok(())
}

//! Telegram side of the bridge
//!
//! Chat commands from the allowed user become agent commands on the
//! broker; agent responses are relayed to that user's chat.

use crate::bridge::CommandSink;
use crate::replies::{describe, WELCOME};
use lanwake_agent::command::Command;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(BotCommands, Clone, Copy, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum ChatCommand {
    #[command(description = "show the welcome message")]
    Start,
    #[command(description = "turn on the PC using a Magic Packet")]
    Wol,
    #[command(description = "check if the PC is on")]
    Ping,
    #[command(description = "show bot status")]
    Status,
}

impl ChatCommand {
    /// Agent command relayed over the broker; `/start` stays local
    pub fn agent_command(self) -> Option<Command> {
        match self {
            ChatCommand::Start => None,
            ChatCommand::Wol => Some(Command::Wol),
            ChatCommand::Ping => Some(Command::Ping),
            ChatCommand::Status => Some(Command::Status),
        }
    }

    /// Immediate chat answer, before the agent replies
    pub fn ack(self) -> &'static str {
        match self {
            ChatCommand::Start => WELCOME,
            ChatCommand::Wol => "⚡ Sending Magic Packet to turn on PC...",
            ChatCommand::Ping => "⏱ Checking PC status...",
            ChatCommand::Status => "📊 Fetching PC status...",
        }
    }
}

pub struct BotState {
    sink: Arc<dyn CommandSink>,
    allowed: UserId,
    token_prefix: String,
}

impl BotState {
    pub fn new(sink: Arc<dyn CommandSink>, allowed: UserId, token_prefix: impl Into<String>) -> Self {
        Self {
            sink,
            allowed,
            token_prefix: token_prefix.into(),
        }
    }

    /// Chat answer for `cmd`, or `None` when the sender is not allowed.
    /// A publish failure is logged; the user still gets the answer.
    pub async fn respond(&self, cmd: ChatCommand, sender: Option<UserId>) -> Option<&'static str> {
        if sender != Some(self.allowed) {
            debug!("Ignoring {:?} from {:?}", cmd, sender);
            return None;
        }
        if let Some(command) = cmd.agent_command() {
            let payload = format!("{}{}", self.token_prefix, command.token());
            match self.sink.publish_command(payload.clone()).await {
                Ok(()) => info!("Published command {}", payload),
                Err(e) => warn!("Cannot publish command '{}': {}", payload, e),
            }
        }
        Some(cmd.ack())
    }
}

async fn handle_command(bot: Bot, msg: Message, cmd: ChatCommand, state: Arc<BotState>) -> ResponseResult<()> {
    let sender = msg.from.as_ref().map(|user| user.id);
    if let Some(reply) = state.respond(cmd, sender).await {
        bot.send_message(msg.chat.id, reply).await?;
    }
    Ok(())
}

/// Runs until the process is interrupted
pub async fn serve(bot: Bot, state: Arc<BotState>) {
    if let Err(e) = bot.set_my_commands(ChatCommand::bot_commands()).await {
        warn!("Failed to register the command menu: {}", e);
    }

    let handler = Update::filter_message()
        .filter_command::<ChatCommand>()
        .endpoint(handle_command);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

/// Forward agent responses to `chat` until the broker side stops
pub async fn relay_responses(bot: Bot, chat: ChatId, mut responses: mpsc::Receiver<String>, token_prefix: String) {
    while let Some(payload) = responses.recv().await {
        let Some(text) = describe(&payload, &token_prefix) else {
            debug!("Ignoring unknown response {:?}", payload);
            continue;
        };
        if let Err(e) = bot.send_message(chat, text).await {
            warn!("Failed to forward response to Telegram: {}", e);
        }
    }
}

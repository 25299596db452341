//! Chat texts
//!
//! Turns agent status payloads into readable chat messages. Pure
//! functions, no Telegram or broker I/O.

use lanwake_agent::status::StatusMessage;
use serde_json::{Map, Value};

pub const WELCOME: &str = "👋🏻 Hi, I'm WoL, your personal Wake-on-LAN bot!\n\n\
    Available commands:\n\
    🚀 /wol - Turn on your PC using Magic Packet\n\
    💖 /ping - Check if the PC is on\n\
    📊 /status - Show bot status\n\
    ✨ /start - Show this welcome message";

fn simple_reply(token: &str) -> Option<&'static str> {
    [
        (StatusMessage::AlreadyOn, "💡 The PC is already on"),
        (StatusMessage::WolSent, "⚡ Magic Packet has been sent"),
        (StatusMessage::WolOk, "✅ The PC turned on successfully"),
        (StatusMessage::WolFail, "❌ The PC failed to turn on, please retry"),
        (StatusMessage::PingOk, "💖 The PC is online"),
        (StatusMessage::PingFail, "❌ The PC is offline or unreachable"),
    ]
    .into_iter()
    .find(|(message, _)| message.token() == token)
    .map(|(_, text)| text)
}

fn stat_info_reply(body: &str) -> String {
    match serde_json::from_str::<Map<String, Value>>(body) {
        Ok(fields) => {
            let mut text = String::from("📊 Bot info:\n");
            for (key, value) in &fields {
                match value {
                    Value::String(s) => text.push_str(&format!("{key}: {s}\n")),
                    other => text.push_str(&format!("{key}: {other}\n")),
                }
            }
            text
        }
        Err(e) => format!("⚠️ Error parsing status info: {e}"),
    }
}

/// Chat text for one payload from the responses topic; `None` when it is
/// not a known status token
pub fn describe(payload: &str, prefix: &str) -> Option<String> {
    let token = payload.strip_prefix(prefix)?;
    if let Some(text) = simple_reply(token) {
        return Some(text.to_string());
    }
    let body = token.strip_prefix("stat_info")?;
    Some(stat_info_reply(body.trim_start()))
}

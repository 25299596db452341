//! Outbound status messages
//!
//! Closed set of response tokens published on the responses topic.
//! `stat_info` carries a JSON object after the token.

use serde::Serialize;
use tracing::warn;

/// Agent status report (keys match what existing chat bots parse)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatInfo {
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Local IP")]
    pub local_ip: String,
    #[serde(rename = "SSID")]
    pub ssid: String,
    #[serde(rename = "Uptime")]
    pub uptime: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    AlreadyOn,
    WolSent,
    WolOk,
    WolFail,
    PingOk,
    PingFail,
    StatInfo(StatInfo),
}

impl StatusMessage {
    pub fn token(&self) -> &'static str {
        match self {
            StatusMessage::AlreadyOn => "al_on",
            StatusMessage::WolSent => "wol_sent",
            StatusMessage::WolOk => "wol_ok",
            StatusMessage::WolFail => "wol_fail",
            StatusMessage::PingOk => "ping_ok",
            StatusMessage::PingFail => "ping_fail",
            StatusMessage::StatInfo(_) => "stat_info",
        }
    }

    /// Wire payload with the configured token prefix
    pub fn render(&self, prefix: &str) -> String {
        match self {
            StatusMessage::StatInfo(info) => {
                let body = serde_json::to_string(info).unwrap_or_else(|e| {
                    warn!("Failed to serialize stat_info: {}", e);
                    "{}".to_string()
                });
                format!("{prefix}stat_info {body}")
            }
            other => format!("{prefix}{}", other.token()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_tokens() {
        assert_eq!(StatusMessage::AlreadyOn.render(""), "al_on");
        assert_eq!(StatusMessage::WolSent.render(""), "wol_sent");
        assert_eq!(StatusMessage::PingFail.render("/"), "/ping_fail");
    }

    #[test]
    fn test_stat_info_layout() {
        let msg = StatusMessage::StatInfo(StatInfo {
            status: "Online".into(),
            local_ip: "192.168.1.50".into(),
            ssid: "home".into(),
            uptime: "1h 1m 1s".into(),
        });
        assert_eq!(
            msg.render("/"),
            r#"/stat_info {"Status":"Online","Local IP":"192.168.1.50","SSID":"home","Uptime":"1h 1m 1s"}"#
        );
    }

    #[test]
    fn test_stat_info_escapes_network_name() {
        let msg = StatusMessage::StatInfo(StatInfo {
            status: "Online".into(),
            local_ip: "10.0.0.2".into(),
            ssid: "my \"lab\"".into(),
            uptime: "0h 0m 1s".into(),
        });
        let rendered = msg.render("");
        let json: serde_json::Value =
            serde_json::from_str(rendered.strip_prefix("stat_info ").unwrap()).unwrap();
        assert_eq!(json["SSID"], "my \"lab\"");
    }
}

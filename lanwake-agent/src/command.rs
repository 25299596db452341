//! Inbound command tokens
//!
//! Matching is exact: no trimming, no case folding. The configured token
//! prefix is stripped first (empty by default).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Wol,
    Ping,
    Status,
}

impl Command {
    /// `None` for anything that is not exactly one of the known tokens
    pub fn parse(payload: &[u8], prefix: &str) -> Option<Self> {
        let text = std::str::from_utf8(payload).ok()?;
        match text.strip_prefix(prefix)? {
            "wol" => Some(Command::Wol),
            "ping" => Some(Command::Ping),
            "status" => Some(Command::Status),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Command::Wol => "wol",
            Command::Ping => "ping",
            Command::Status => "status",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_tokens() {
        assert_eq!(Command::parse(b"wol", ""), Some(Command::Wol));
        assert_eq!(Command::parse(b"ping", ""), Some(Command::Ping));
        assert_eq!(Command::parse(b"status", ""), Some(Command::Status));
    }

    #[test]
    fn test_no_trimming_or_case_folding() {
        assert_eq!(Command::parse(b" wol", ""), None);
        assert_eq!(Command::parse(b"wol\n", ""), None);
        assert_eq!(Command::parse(b"WOL", ""), None);
        assert_eq!(Command::parse(b"", ""), None);
        assert_eq!(Command::parse(b"reboot", ""), None);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(Command::parse(b"/ping", "/"), Some(Command::Ping));
        assert_eq!(Command::parse(b"ping", "/"), None);
        assert_eq!(Command::parse(b"/ping", ""), None);
    }

    #[test]
    fn test_invalid_utf8_ignored() {
        assert_eq!(Command::parse(&[0xff, 0xfe], ""), None);
    }
}

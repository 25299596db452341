use tokio::time::Instant;

/// Process start instant, captured once by the entry point
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    started: Instant,
}

impl SessionClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Whole seconds elapsed since start (truncated)
    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.started).as_secs()
    }
}

/// `"{h}h {m}m {s}s"`
pub fn format_uptime(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    format!("{h}h {m}m {s}s")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "0h 0m 0s");
        assert_eq!(format_uptime(59), "0h 0m 59s");
        assert_eq!(format_uptime(60), "0h 1m 0s");
        assert_eq!(format_uptime(3661), "1h 1m 1s");
        assert_eq!(format_uptime(90_000), "25h 0m 0s");
    }

    #[test]
    fn test_format_uptime_decomposes_exactly() {
        for secs in [1u64, 599, 3599, 3600, 86_399, 123_456, 9_999_999] {
            let text = format_uptime(secs);
            let parts: Vec<u64> = text
                .split_whitespace()
                .map(|p| p[..p.len() - 1].parse().unwrap())
                .collect();
            assert!(parts[1] < 60 && parts[2] < 60);
            assert_eq!(parts[0] * 3600 + parts[1] * 60 + parts[2], secs);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_clock_truncates() {
        let clock = SessionClock::start();
        tokio::time::advance(Duration::from_millis(61_999)).await;
        assert_eq!(clock.elapsed_secs(Instant::now()), 61);
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Substrings that make a username unacceptable, matched case-insensitively.
    pub username_denylist: Vec<String>,
    pub error_notice_ms: u64,
    pub draw_declined_notice_ms: u64,
    /// `None` keeps an unanswered request outstanding forever.
    pub request_timeout_secs: Option<u64>,
    /// Count the running side's clock down between server updates.
    pub interpolate_clock: bool,
    pub max_events: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            username_denylist: vec!["badword".to_string()],
            error_notice_ms: 2000,
            draw_declined_notice_ms: 3000,
            request_timeout_secs: Some(10),
            interpolate_clock: false,
            max_events: 256,
        }
    }
}

impl SessionConfig {
    pub fn error_notice(&self) -> Duration {
        Duration::from_millis(self.error_notice_ms)
    }

    pub fn draw_declined_notice(&self) -> Duration {
        Duration::from_millis(self.draw_declined_notice_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

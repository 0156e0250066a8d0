use std::time::Duration;

use crate::Messages;

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RetryPolicy {
    /// Number of attempts after the first one
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> RetryPolicy {
        RetryPolicy {
            max_retries: 5,
            retry_delay_ms: 1000,
        }
    }
}

/// How a comment the user just posted shows up in the feed
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum RenderPolicy {
    /// Render the row returned by the service as soon as the insert succeeds, and drop the
    /// realtime echo of it
    Confirmed,

    /// Only render comments received from the realtime feed
    EventOnly,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct FeedConfig {
    pub table: String,
    pub page_size: usize,
    pub max_content_chars: usize,
    pub retry: RetryPolicy,
    pub heartbeat_interval_ms: Option<u64>,
    pub render_policy: RenderPolicy,

    /// Also escape quotes when sanitizing
    pub hardened_sanitize: bool,

    /// Applied by the frontend to clicks on the submit control
    pub submit_debounce_ms: Option<u64>,

    /// Preference store key under which the last display name is saved
    pub username_key: String,

    pub messages: Messages,
}

impl FeedConfig {
    pub fn heartbeat_interval(&self) -> Option<chrono::Duration> {
        self.heartbeat_interval_ms
            .map(|ms| chrono::Duration::milliseconds(ms as i64))
    }

    pub fn char_counter(&self, len: usize) -> String {
        format!("{}/{}", len, self.max_content_chars)
    }
}

impl Default for FeedConfig {
    fn default() -> FeedConfig {
        FeedConfig {
            table: String::from("comments"),
            page_size: 10,
            max_content_chars: 500,
            retry: RetryPolicy::default(),
            heartbeat_interval_ms: Some(30_000),
            render_policy: RenderPolicy::Confirmed,
            hardened_sanitize: true,
            submit_debounce_ms: Some(500),
            username_key: String::from("comment-username"),
            messages: Messages::english(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: FeedConfig = serde_json::from_str(
            r#"{ "page_size": 25, "retry": { "max_retries": 2, "retry_delay_ms": 50 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.page_size, 25);
        assert_eq!(cfg.retry.delay(), Duration::from_millis(50));
        assert_eq!(cfg.table, "comments");
        assert_eq!(cfg.max_content_chars, 500);
        assert_eq!(cfg.char_counter(12), "12/500");
    }
}

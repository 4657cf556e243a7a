use chrono::{DateTime, Utc};

/// One accepted usage record from an assistant log line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsageEvent {
    pub timestamp: DateTime<Utc>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// `message_id:request_id` when both ids were present on the line
    pub dedup_key: Option<String>,
}

impl UsageEvent {
    pub fn new(timestamp: DateTime<Utc>, input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            timestamp,
            input_tokens,
            output_tokens,
            dedup_key: None,
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

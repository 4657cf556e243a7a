use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Deserialize, Debug, Default, Clone)]
pub struct MessageUsage {
    #[serde(default, deserialize_with = "lenient_count")]
    pub input_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub output_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub cache_read_input_tokens: Option<u64>,
}

/// Token counts written as floats (`5.0`) are truncated; negative or
/// non-numeric values count as absent instead of rejecting the line.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        _ => None,
    }))
}

impl MessageUsage {
    /// Input plus both cache counters: what the prompt occupied in context.
    pub fn context_tokens(&self) -> u64 {
        self.input_tokens.unwrap_or(0)
            + self.cache_read_input_tokens.unwrap_or(0)
            + self.cache_creation_input_tokens.unwrap_or(0)
    }

    pub fn cache_tokens(&self) -> u64 {
        self.cache_read_input_tokens.unwrap_or(0) + self.cache_creation_input_tokens.unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.input_tokens.is_none()
            && self.output_tokens.is_none()
            && self.cache_creation_input_tokens.is_none()
            && self.cache_read_input_tokens.is_none()
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct MessageObj {
    pub id: Option<String>,
    pub usage: Option<MessageUsage>,
    /// Either a plain string or an array of content blocks
    pub content: Option<Value>,
}

impl MessageObj {
    /// Total length of `text` content blocks.
    pub fn text_len(&self) -> usize {
        self.content
            .as_ref()
            .and_then(|c| c.as_array())
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                    .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                    .map(str::len)
                    .sum()
            })
            .unwrap_or(0)
    }
}

/// One JSONL line of a Claude transcript or project log.
#[derive(Deserialize, Debug, Default)]
pub struct TranscriptLine {
    pub r#type: Option<String>,
    pub timestamp: Option<String>,
    pub message_id: Option<String>,
    #[serde(rename = "requestId")]
    pub request_id_camel: Option<String>,
    pub request_id: Option<String>,
    pub message: Option<MessageObj>,
    /// Top-level text carried by `system_message` lines
    pub content: Option<Value>,
}

impl TranscriptLine {
    pub fn is_type(&self, t: &str) -> bool {
        self.r#type.as_deref() == Some(t)
    }

    /// `message_id`, falling back to the nested `message.id`. Empty ids
    /// count as missing.
    pub fn effective_message_id(&self) -> Option<&str> {
        non_empty(self.message_id.as_deref())
            .or_else(|| non_empty(self.message.as_ref().and_then(|m| m.id.as_deref())))
    }

    /// `requestId`, falling back to `request_id`. Empty ids count as missing.
    pub fn effective_request_id(&self) -> Option<&str> {
        non_empty(self.request_id_camel.as_deref()).or_else(|| non_empty(self.request_id.as_deref()))
    }

    pub fn usage(&self) -> Option<&MessageUsage> {
        self.message.as_ref().and_then(|m| m.usage.as_ref())
    }

    pub fn content_str(&self) -> Option<&str> {
        self.content.as_ref().and_then(|c| c.as_str())
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PROXY_ERROR_FALLBACK: &str = "Proxy error";

/// Uniform failure body: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// Extracts a human-readable failure message from an arbitrary response
    /// body. Looks at `error` first, then FastAPI's string `detail`.
    pub fn message_from_body(body: &[u8]) -> Option<String> {
        let value: Value = serde_json::from_slice(body).ok()?;
        ["error", "detail"].iter().find_map(|key| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|message| !message.is_empty())
                .map(str::to_string)
        })
    }
}

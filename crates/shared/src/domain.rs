use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Spam,
    Ham,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Spam => "spam",
            Label::Ham => "ham",
        }
    }
}

/// Body of a single classification request, as sent by the controller and
/// relayed by the proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRequest {
    pub subject: String,
    pub message: String,
}

impl CheckRequest {
    /// Builds a request from raw user input, trimming both fields.
    pub fn trimmed(subject: &str, message: &str) -> Self {
        Self {
            subject: subject.trim().to_string(),
            message: message.trim().to_string(),
        }
    }
}

/// Upstream classifier verdict. Fields are taken as reported; `label` and
/// `is_spam` are not cross-checked and probabilities are not range-checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub label: Label,
    pub is_spam: bool,
    pub spam_probability: f64,
    pub ham_probability: f64,
}

impl CheckResult {
    pub fn confidence(&self) -> f64 {
        self.spam_probability.max(self.ham_probability)
    }
}

use thiserror::Error;

pub const VALIDATION_MESSAGE: &str = "Please enter Subject or Message.";
pub const REQUEST_FAILED_MESSAGE: &str = "Request failed.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong.";

/// Why a check did not produce a result. `Display` is the text shown to the
/// user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("{}", VALIDATION_MESSAGE)]
    Validation,
    #[error("{}", or_request_failed(.message))]
    Upstream {
        status: u16,
        message: Option<String>,
    },
    #[error("{}", or_generic_failure(.0))]
    Transport(String),
}

impl CheckError {
    pub fn transport(error: &anyhow::Error) -> Self {
        Self::Transport(format!("{error:#}"))
    }
}

fn or_request_failed(message: &Option<String>) -> &str {
    message.as_deref().unwrap_or(REQUEST_FAILED_MESSAGE)
}

fn or_generic_failure(message: &str) -> &str {
    if message.trim().is_empty() {
        GENERIC_FAILURE_MESSAGE
    } else {
        message
    }
}

//! Interaction state and its pure transitions.
//!
//! Everything here is synchronous and network-free; [`crate::InteractionController`]
//! only adds the proxy call between [`InteractionState::begin_check`] and
//! [`InteractionState::finish_check`].

use shared::domain::{CheckRequest, CheckResult, Label};

use crate::error::CheckError;

pub const SPAM_DEMO_SUBJECT: &str = "promo";
pub const SPAM_DEMO_MESSAGE: &str = "Congratulations! You won $1000 gift card. Click now.";
pub const HAM_DEMO_SUBJECT: &str = "Meeting notes";
pub const HAM_DEMO_MESSAGE: &str = "Hi team, attached are the notes from today's meeting. Thanks!";

pub const CHECK_LABEL: &str = "Check email";
pub const CHECKING_LABEL: &str = "Checking...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckPhase {
    Idle,
    Checking,
    Resolved,
    Failed,
}

/// Outcome of [`InteractionState::begin_check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStart {
    /// Input passed validation; send this request.
    Dispatch(CheckRequest),
    /// Both fields were blank; the validation error is already set.
    Rejected,
    /// A check is already in flight; nothing changed.
    Busy,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionState {
    pub subject: String,
    pub message: String,
    pub loading: bool,
    pub result: Option<CheckResult>,
    pub error: Option<String>,
}

impl InteractionState {
    pub fn set_subject(&mut self, text: impl Into<String>) {
        self.subject = text.into();
    }

    pub fn set_message(&mut self, text: impl Into<String>) {
        self.message = text.into();
    }

    pub fn can_submit(&self) -> bool {
        !self.subject.trim().is_empty() || !self.message.trim().is_empty()
    }

    /// Clears the previous outcome and either rejects the input or marks the
    /// state as loading and hands back the trimmed request.
    pub fn begin_check(&mut self) -> CheckStart {
        if self.loading {
            return CheckStart::Busy;
        }

        self.result = None;
        self.error = None;

        if !self.can_submit() {
            self.error = Some(CheckError::Validation.to_string());
            return CheckStart::Rejected;
        }

        self.loading = true;
        CheckStart::Dispatch(CheckRequest::trimmed(&self.subject, &self.message))
    }

    pub fn finish_check(&mut self, outcome: Result<CheckResult, CheckError>) {
        self.loading = false;
        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.error = None;
            }
            Err(error) => {
                self.result = None;
                self.error = Some(error.to_string());
            }
        }
    }

    pub fn fill_demo(&mut self, kind: Label) {
        let (subject, message) = match kind {
            Label::Spam => (SPAM_DEMO_SUBJECT, SPAM_DEMO_MESSAGE),
            Label::Ham => (HAM_DEMO_SUBJECT, HAM_DEMO_MESSAGE),
        };
        self.subject = subject.to_string();
        self.message = message.to_string();
    }

    /// Returns to idle with empty fields. Refused while a check is pending.
    pub fn reset(&mut self) -> bool {
        if self.loading {
            return false;
        }
        *self = Self::default();
        true
    }

    pub fn phase(&self) -> CheckPhase {
        if self.loading {
            CheckPhase::Checking
        } else if self.result.is_some() {
            CheckPhase::Resolved
        } else if self.error.is_some() {
            CheckPhase::Failed
        } else {
            CheckPhase::Idle
        }
    }

    pub fn display(&self) -> DisplayModel {
        DisplayModel {
            badge: self
                .result
                .as_ref()
                .map(|result| if result.is_spam { "SPAM" } else { "HAM" }),
            confidence: self.result.as_ref().map(CheckResult::confidence),
            error: self.error.clone(),
            check_label: if self.loading {
                CHECKING_LABEL
            } else {
                CHECK_LABEL
            },
            check_enabled: self.can_submit() && !self.loading,
        }
    }
}

/// What a front end renders for the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayModel {
    pub badge: Option<&'static str>,
    pub confidence: Option<f64>,
    pub error: Option<String>,
    pub check_label: &'static str,
    pub check_enabled: bool,
}

impl DisplayModel {
    pub fn confidence_text(&self) -> Option<String> {
        self.confidence.map(|confidence| format!("{confidence:.4}"))
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;

use std::sync::{Mutex, MutexGuard, PoisonError};

use shared::domain::{CheckRequest, CheckResult, Label};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub mod error;
pub mod state;
pub mod transport;

pub use error::CheckError;
pub use state::{CheckPhase, CheckStart, DisplayModel, InteractionState};
pub use transport::{HttpProxyTransport, ProxyReply, ProxyTransport};

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    CheckStarted(CheckRequest),
    CheckResolved(CheckResult),
    CheckFailed(String),
}

/// Drives one spam/ham check at a time against the proxy.
///
/// State lives behind a plain mutex that is never held across an await, so
/// reads and field edits stay synchronous for the UI thread.
pub struct InteractionController<T: ProxyTransport> {
    transport: T,
    state: Mutex<InteractionState>,
    events: broadcast::Sender<ControllerEvent>,
}

impl<T: ProxyTransport> InteractionController<T> {
    pub fn new(transport: T) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            transport,
            state: Mutex::new(InteractionState::default()),
            events,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn state(&self) -> MutexGuard<'_, InteractionState> {
        lock_state(&self.state)
    }

    pub fn set_subject(&self, text: impl Into<String>) {
        self.state().set_subject(text);
    }

    pub fn set_message(&self, text: impl Into<String>) {
        self.state().set_message(text);
    }

    pub fn can_submit(&self) -> bool {
        self.state().can_submit()
    }

    pub fn fill_demo(&self, kind: Label) {
        self.state().fill_demo(kind);
    }

    pub fn reset(&self) -> bool {
        self.state().reset()
    }

    pub fn snapshot(&self) -> InteractionState {
        self.state().clone()
    }

    pub fn phase(&self) -> CheckPhase {
        self.state().phase()
    }

    pub fn display(&self) -> DisplayModel {
        self.state().display()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// Runs one check and returns the phase it settled in.
    ///
    /// Failures end up in the state's `error` field; this never returns an
    /// error itself. A call made while another check is pending is ignored.
    pub async fn check(&self) -> CheckPhase {
        let start = self.state().begin_check();
        let request = match start {
            CheckStart::Busy => {
                debug!("check already in flight; ignoring");
                return CheckPhase::Checking;
            }
            CheckStart::Rejected => {
                let _ = self
                    .events
                    .send(ControllerEvent::CheckFailed(CheckError::Validation.to_string()));
                return CheckPhase::Failed;
            }
            CheckStart::Dispatch(request) => request,
        };

        let pending = PendingCheck::new(&self.state, &self.events);
        info!(
            subject_len = request.subject.len(),
            message_len = request.message.len(),
            "submitting spam check"
        );
        let _ = self
            .events
            .send(ControllerEvent::CheckStarted(request.clone()));

        let outcome = match self.transport.predict(&request).await {
            Ok(reply) => reply.into_outcome(),
            Err(error) => Err(CheckError::transport(&error)),
        };

        let event = match &outcome {
            Ok(result) => {
                info!(
                    label = result.label.as_str(),
                    confidence = result.confidence(),
                    "spam check resolved"
                );
                ControllerEvent::CheckResolved(result.clone())
            }
            Err(error) => {
                warn!(%error, "spam check failed");
                ControllerEvent::CheckFailed(error.to_string())
            }
        };

        let phase = pending.settle(outcome);
        let _ = self.events.send(event);
        phase
    }
}

fn lock_state(state: &Mutex<InteractionState>) -> MutexGuard<'_, InteractionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears `loading` and announces the failure when a dispatched check is
/// abandoned (future dropped or transport panicked) before it could settle.
struct PendingCheck<'a> {
    state: &'a Mutex<InteractionState>,
    events: &'a broadcast::Sender<ControllerEvent>,
    settled: bool,
}

impl<'a> PendingCheck<'a> {
    fn new(
        state: &'a Mutex<InteractionState>,
        events: &'a broadcast::Sender<ControllerEvent>,
    ) -> Self {
        Self {
            state,
            events,
            settled: false,
        }
    }

    fn settle(mut self, outcome: Result<CheckResult, CheckError>) -> CheckPhase {
        let mut guard = lock_state(self.state);
        guard.finish_check(outcome);
        self.settled = true;
        guard.phase()
    }
}

impl Drop for PendingCheck<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let error = CheckError::Transport(String::new());
        warn!(%error, "spam check abandoned before it settled");
        let message = error.to_string();
        lock_state(self.state).finish_check(Err(error));
        let _ = self.events.send(ControllerEvent::CheckFailed(message));
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

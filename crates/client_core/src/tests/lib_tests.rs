use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use super::*;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::{oneshot, Mutex as AsyncMutex};

use crate::error::{GENERIC_FAILURE_MESSAGE, REQUEST_FAILED_MESSAGE, VALIDATION_MESSAGE};

const SPAM_BODY: &str =
    r#"{"label":"spam","is_spam":true,"spam_probability":0.97,"ham_probability":0.03}"#;

struct ScriptedTransport {
    replies: AsyncMutex<VecDeque<std::result::Result<ProxyReply, String>>>,
    calls: AtomicUsize,
    requests: AsyncMutex<Vec<CheckRequest>>,
}

impl ScriptedTransport {
    fn new(replies: Vec<std::result::Result<ProxyReply, String>>) -> Self {
        Self {
            replies: AsyncMutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            requests: AsyncMutex::new(Vec::new()),
        }
    }

    fn replying(status: u16, body: &str) -> Self {
        Self::new(vec![Ok(ProxyReply::new(status, body))])
    }

    fn failing(err: impl Into<String>) -> Self {
        Self::new(vec![Err(err.into())])
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProxyTransport for ScriptedTransport {
    async fn predict(&self, request: &CheckRequest) -> Result<ProxyReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());
        match self.replies.lock().await.pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(err)) => Err(anyhow!(err)),
            None => Err(anyhow!("no scripted reply left")),
        }
    }
}

/// Holds every call open until the test releases it.
struct GatedTransport {
    calls: AtomicUsize,
    entered: AsyncMutex<Option<oneshot::Sender<()>>>,
    release: AsyncMutex<Option<oneshot::Receiver<ProxyReply>>>,
}

impl GatedTransport {
    fn new() -> (Self, oneshot::Receiver<()>, oneshot::Sender<ProxyReply>) {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        (
            Self {
                calls: AtomicUsize::new(0),
                entered: AsyncMutex::new(Some(entered_tx)),
                release: AsyncMutex::new(Some(release_rx)),
            },
            entered_rx,
            release_tx,
        )
    }
}

#[async_trait]
impl ProxyTransport for GatedTransport {
    async fn predict(&self, _request: &CheckRequest) -> Result<ProxyReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = self.entered.lock().await.take() {
            let _ = tx.send(());
        }
        let release = self
            .release
            .lock()
            .await
            .take()
            .ok_or_else(|| anyhow!("gate already consumed"))?;
        release.await.map_err(|_| anyhow!("gate dropped"))
    }
}

struct StalledTransport;

#[async_trait]
impl ProxyTransport for StalledTransport {
    async fn predict(&self, _request: &CheckRequest) -> Result<ProxyReply> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn blank_input_sets_validation_error_without_network_call() {
    let controller = InteractionController::new(ScriptedTransport::replying(200, SPAM_BODY));
    controller.set_subject("   ");
    controller.set_message("\n");
    let mut events = controller.subscribe();

    assert!(!controller.can_submit());
    assert_eq!(controller.check().await, CheckPhase::Failed);

    let state = controller.snapshot();
    assert_eq!(state.error.as_deref(), Some(VALIDATION_MESSAGE));
    assert_eq!(state.result, None);
    assert!(!state.loading);
    assert_eq!(controller.transport().calls(), 0);
    assert_eq!(
        events.try_recv().expect("event"),
        ControllerEvent::CheckFailed(VALIDATION_MESSAGE.to_string())
    );
}

#[tokio::test]
async fn successful_check_sets_result_and_sends_trimmed_request() {
    let controller = InteractionController::new(ScriptedTransport::replying(200, SPAM_BODY));
    controller.set_subject("  promo  ");
    controller.set_message(" Congratulations! You won $1000 gift card. Click now.\n");

    assert_eq!(controller.check().await, CheckPhase::Resolved);

    let state = controller.snapshot();
    let result = state.result.expect("result");
    assert!(result.is_spam);
    assert_eq!(result.label, Label::Spam);
    assert_eq!(result.spam_probability, 0.97);
    assert_eq!(state.error, None);
    assert!(!state.loading);

    let requests = controller.transport().requests.lock().await.clone();
    assert_eq!(
        requests,
        vec![CheckRequest {
            subject: "promo".into(),
            message: "Congratulations! You won $1000 gift card. Click now.".into(),
        }]
    );
}

#[tokio::test]
async fn failure_status_clears_previous_result() {
    let controller = InteractionController::new(ScriptedTransport::new(vec![
        Ok(ProxyReply::new(200, SPAM_BODY)),
        Ok(ProxyReply::new(503, "upstream down")),
    ]));
    controller.fill_demo(Label::Spam);
    assert_eq!(controller.check().await, CheckPhase::Resolved);
    assert!(controller.snapshot().result.is_some());

    assert_eq!(controller.check().await, CheckPhase::Failed);
    let state = controller.snapshot();
    assert_eq!(state.result, None);
    assert_eq!(state.error.as_deref(), Some(REQUEST_FAILED_MESSAGE));
    assert!(!state.loading);
    assert_eq!(controller.transport().calls(), 2);
}

#[tokio::test]
async fn failure_status_surfaces_proxy_error_message() {
    let controller = InteractionController::new(ScriptedTransport::replying(
        500,
        r#"{"error":"error sending request for url (http://upstream/predict)"}"#,
    ));
    controller.set_message("hello");
    controller.check().await;

    assert_eq!(
        controller.snapshot().error.as_deref(),
        Some("error sending request for url (http://upstream/predict)")
    );
}

#[tokio::test]
async fn transport_failure_is_caught_and_reported() {
    let controller = InteractionController::new(ScriptedTransport::failing("connection refused"));
    controller.set_subject("hello");
    let mut events = controller.subscribe();

    assert_eq!(controller.check().await, CheckPhase::Failed);
    let state = controller.snapshot();
    assert_eq!(state.error.as_deref(), Some("connection refused"));
    assert!(!state.loading);

    assert!(matches!(
        events.try_recv().expect("started"),
        ControllerEvent::CheckStarted(_)
    ));
    assert_eq!(
        events.try_recv().expect("failed"),
        ControllerEvent::CheckFailed("connection refused".to_string())
    );
}

#[tokio::test]
async fn loading_is_set_only_while_request_is_pending() {
    let (transport, entered, release) = GatedTransport::new();
    let controller = Arc::new(InteractionController::new(transport));
    controller.fill_demo(Label::Spam);
    assert!(!controller.snapshot().loading);

    let task = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.check().await })
    };
    entered.await.expect("transport entered");

    assert!(controller.snapshot().loading);
    assert_eq!(controller.phase(), CheckPhase::Checking);
    assert_eq!(controller.display().check_label, "Checking...");

    // A second check while pending is ignored.
    assert_eq!(controller.check().await, CheckPhase::Checking);
    assert!(!controller.reset());
    assert_eq!(controller.transport().calls.load(Ordering::SeqCst), 1);

    release
        .send(ProxyReply::new(200, SPAM_BODY))
        .expect("release");
    assert_eq!(task.await.expect("join"), CheckPhase::Resolved);

    let state = controller.snapshot();
    assert!(!state.loading);
    assert!(state.result.is_some());
}

#[tokio::test]
async fn abandoned_check_does_not_leave_loading_stuck() {
    let controller = InteractionController::new(StalledTransport);
    controller.set_message("hello");
    let mut events = controller.subscribe();

    let outcome = tokio::time::timeout(Duration::from_millis(50), controller.check()).await;
    assert!(outcome.is_err(), "stalled transport should time out");

    let state = controller.snapshot();
    assert!(!state.loading);
    assert_eq!(state.error.as_deref(), Some(GENERIC_FAILURE_MESSAGE));
    assert_eq!(controller.phase(), CheckPhase::Failed);

    assert!(matches!(
        events.try_recv(),
        Ok(ControllerEvent::CheckStarted(_))
    ));
    assert_eq!(
        events.try_recv().expect("terminal event"),
        ControllerEvent::CheckFailed(GENERIC_FAILURE_MESSAGE.to_string())
    );
}

#[tokio::test]
async fn reset_after_result_returns_to_idle() {
    let controller = InteractionController::new(ScriptedTransport::replying(200, SPAM_BODY));
    controller.fill_demo(Label::Ham);
    controller.check().await;
    assert_eq!(controller.phase(), CheckPhase::Resolved);

    assert!(controller.reset());
    assert_eq!(controller.phase(), CheckPhase::Idle);
    assert_eq!(controller.snapshot(), InteractionState::default());
}

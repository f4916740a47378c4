use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use client_core::{
    error::GENERIC_FAILURE_MESSAGE, state::CHECKING_LABEL, CheckPhase, ControllerEvent,
    DisplayModel, HttpProxyTransport, InteractionController,
};
use shared::domain::Label;
use tracing::debug;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    proxy_url: String,
    #[arg(long, default_value = "")]
    subject: String,
    #[arg(long, default_value = "")]
    message: String,
    /// Replace subject and message with a built-in sample.
    #[arg(long, value_enum)]
    demo: Option<Demo>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Demo {
    Spam,
    Ham,
}

impl From<Demo> for Label {
    fn from(value: Demo) -> Self {
        match value {
            Demo::Spam => Label::Spam,
            Demo::Ham => Label::Ham,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries only the verdict line.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let args = Args::parse();

    let controller = InteractionController::new(HttpProxyTransport::new(args.proxy_url));
    controller.set_subject(args.subject);
    controller.set_message(args.message);
    if let Some(demo) = args.demo {
        controller.fill_demo(demo.into());
    }

    let mut events = controller.subscribe();
    let progress = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ControllerEvent::CheckStarted(request) => {
                    debug!(proxy_request = ?request, "check sent");
                    eprintln!("{CHECKING_LABEL}");
                }
                ControllerEvent::CheckResolved(_) | ControllerEvent::CheckFailed(_) => break,
            }
        }
    });

    let phase = controller.check().await;
    let _ = progress.await;

    println!("{}", verdict_line(phase, controller.display())?);
    Ok(())
}

fn verdict_line(phase: CheckPhase, view: DisplayModel) -> Result<String> {
    match (phase, view.badge, view.confidence_text()) {
        (CheckPhase::Resolved, Some(badge), Some(confidence)) => {
            Ok(format!("{badge}  confidence {confidence}"))
        }
        _ => Err(anyhow!(view
            .error
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::{CheckError, InteractionState};
    use shared::domain::CheckResult;

    #[test]
    fn resolved_check_prints_badge_and_confidence_only() {
        let mut state = InteractionState::default();
        state.fill_demo(Label::Spam);
        state.begin_check();
        state.finish_check(Ok(CheckResult {
            label: Label::Spam,
            is_spam: true,
            spam_probability: 0.97,
            ham_probability: 0.03,
        }));

        let line = verdict_line(state.phase(), state.display()).expect("verdict");
        assert_eq!(line, "SPAM  confidence 0.9700");
        assert!(!line.contains('\n'));
    }

    #[test]
    fn failed_check_becomes_the_error() {
        let mut state = InteractionState::default();
        state.fill_demo(Label::Ham);
        state.begin_check();
        state.finish_check(Err(CheckError::Upstream {
            status: 429,
            message: Some("rate limited".into()),
        }));

        let error = verdict_line(state.phase(), state.display()).expect_err("failure");
        assert_eq!(error.to_string(), "rate limited");
    }
}

//! `/predict` relay to the upstream classifier.

use std::{error::Error as StdError, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use shared::{
    error::{ErrorEnvelope, PROXY_ERROR_FALLBACK},
    protocol::{endpoint, JSON_CONTENT_TYPE, PREDICT_ROUTE},
};
use thiserror::Error;
use tracing::{info, warn};

use crate::app_state::AppState;

/// Failure of the outbound call itself. Always rendered as
/// `500 {"error": ...}`.
#[derive(Debug, Error)]
#[error("{}", .message.as_deref().unwrap_or(PROXY_ERROR_FALLBACK))]
pub(crate) struct ProxyError {
    message: Option<String>,
}

impl ProxyError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            message: (!message.trim().is_empty()).then_some(message),
        }
    }

    pub(crate) fn from_source(error: &(dyn StdError + 'static)) -> Self {
        Self::new(describe(error))
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorEnvelope::new(self.to_string())),
        )
            .into_response()
    }
}

/// Forwards the inbound body untouched and relays upstream's status and body
/// verbatim. The body is never parsed here in either direction.
pub(crate) async fn relay_predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let url = endpoint(&state.upstream_base, PREDICT_ROUTE);

    let upstream = state
        .http
        .post(&url)
        .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
        .body(body)
        .send()
        .await
        .map_err(|error| {
            let error = ProxyError::from_source(&error);
            warn!(%url, %error, "upstream predict call failed");
            error
        })?;

    let status = upstream.status();
    let payload = upstream.bytes().await.map_err(|error| {
        let error = ProxyError::from_source(&error);
        warn!(%url, %status, %error, "failed to read upstream predict response");
        error
    })?;

    info!(%status, bytes = payload.len(), "relayed upstream predict response");
    Ok((
        status,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static(JSON_CONTENT_TYPE),
        )],
        payload,
    )
        .into_response())
}

/// Joins an error with its sources, skipping causes already quoted by the
/// outer message.
fn describe(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !cause_text.is_empty() && !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

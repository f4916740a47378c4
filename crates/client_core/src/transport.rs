use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{CheckRequest, CheckResult},
    error::ErrorEnvelope,
    protocol::{endpoint, PREDICT_ROUTE},
};

use crate::error::CheckError;

/// Raw proxy answer: status code and undecoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ProxyReply {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn into_outcome(self) -> Result<CheckResult, CheckError> {
        if !self.is_success() {
            return Err(CheckError::Upstream {
                status: self.status,
                message: ErrorEnvelope::message_from_body(&self.body),
            });
        }

        match serde_json::from_slice::<CheckResult>(&self.body) {
            Ok(result) => Ok(result),
            // The classifier answers some bad inputs with 200 and an error body.
            Err(parse_error) => match ErrorEnvelope::message_from_body(&self.body) {
                Some(message) => Err(CheckError::Upstream {
                    status: self.status,
                    message: Some(message),
                }),
                None => Err(CheckError::Transport(format!(
                    "malformed classification response: {parse_error}"
                ))),
            },
        }
    }
}

#[async_trait]
pub trait ProxyTransport: Send + Sync {
    async fn predict(&self, request: &CheckRequest) -> Result<ProxyReply>;
}

pub struct HttpProxyTransport {
    http: Client,
    proxy_url: String,
}

impl HttpProxyTransport {
    pub fn new(proxy_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            proxy_url: proxy_url.into(),
        }
    }
}

#[async_trait]
impl ProxyTransport for HttpProxyTransport {
    async fn predict(&self, request: &CheckRequest) -> Result<ProxyReply> {
        let url = endpoint(&self.proxy_url, PREDICT_ROUTE);
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .with_context(|| format!("failed to reach proxy at {url}"))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .context("failed to read proxy response body")?;
        Ok(ProxyReply::new(status, body.to_vec()))
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;

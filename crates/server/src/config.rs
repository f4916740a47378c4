use std::{collections::HashMap, fs};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

/// Illustrative default; nothing here depends on that host being reachable.
pub const DEFAULT_SPAM_API_URL: &str = "https://web-production-2c982.up.railway.app";

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub spam_api_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:3000".into(),
            spam_api_url: DEFAULT_SPAM_API_URL.into(),
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        apply_file_overrides(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = file_cfg.get("spam_api_url") {
        settings.spam_api_url = v.clone();
    }
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = lookup("SPAM_API_URL") {
        settings.spam_api_url = v;
    }
    if let Some(v) = lookup("APP__SPAM_API_URL") {
        settings.spam_api_url = v;
    }
}

/// Trims whitespace and trailing slashes; a blank value means the default.
pub fn normalize_upstream_base(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_SPAM_API_URL.to_string();
    }
    trimmed.to_string()
}

pub fn validate_upstream_base(base: &str) -> anyhow::Result<()> {
    let url = Url::parse(base).with_context(|| format!("invalid upstream base url '{base}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!(
            "upstream base url '{base}' must use http or https, not '{}'",
            url.scheme()
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

//! Gateway configuration.
//!
//! Loaded from the environment, from YAML, or assembled in code through
//! [`ChatGatewayBuilder`](crate::ChatGatewayBuilder).
//!
//! Environment variables:
//! - `GUIDANCE_API_URL` (required): base of the chat, session and health endpoints
//! - `AUTH_API_URL`: base of `/auth/me`; defaults to `GUIDANCE_API_URL`
//! - `GUIDANCE_HTTP_TIMEOUT_SECS`: per-request timeout; unset means none
//! - `GUIDANCE_UNDERGRADUATE_USERS`: comma-separated identities routed to RUH only

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_GUIDANCE_API_URL: &str = "GUIDANCE_API_URL";
pub const ENV_AUTH_API_URL: &str = "AUTH_API_URL";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "GUIDANCE_HTTP_TIMEOUT_SECS";
pub const ENV_UNDERGRADUATE_USERS: &str = "GUIDANCE_UNDERGRADUATE_USERS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub guidance_base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub undergraduate_users: Vec<String>,
}

impl GatewayConfig {
    pub fn new(guidance_base_url: impl Into<String>) -> Self {
        Self {
            guidance_base_url: guidance_base_url.into(),
            auth_base_url: None,
            timeout_secs: None,
            undergraduate_users: Vec::new(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let guidance_base_url = get(ENV_GUIDANCE_API_URL).ok_or_else(|| {
            Error::configuration_with_context(
                "guidance service URL is not set",
                ErrorContext::new()
                    .with_field_path(ENV_GUIDANCE_API_URL)
                    .with_source("config"),
            )
        })?;

        let timeout_secs = match get(ENV_HTTP_TIMEOUT_SECS) {
            Some(raw) => Some(raw.parse::<u64>().map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid timeout '{}': {}", raw, e),
                    ErrorContext::new()
                        .with_field_path(ENV_HTTP_TIMEOUT_SECS)
                        .with_source("config"),
                )
            })?),
            None => None,
        };

        let undergraduate_users = get(ENV_UNDERGRADUATE_USERS)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            guidance_base_url,
            auth_base_url: get(ENV_AUTH_API_URL),
            timeout_secs,
            undergraduate_users,
        })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid gateway config: {}", e),
                ErrorContext::new().with_source("config"),
            )
        })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read gateway config: {}", e),
                ErrorContext::new()
                    .with_details(path.display().to_string())
                    .with_source("config"),
            )
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Auth base, falling back to the guidance base.
    pub fn auth_base_url(&self) -> &str {
        self.auth_base_url
            .as_deref()
            .unwrap_or(&self.guidance_base_url)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }
}

use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::verification::VerificationError;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/siteVerification/v1";
pub const DEFAULT_APPLICATION_NAME: &str = "Google-SiteVerificationSample/1.0";
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

const TOKEN_PLACEHOLDER: &str = "YOUR_ACCESS_TOKEN_HERE";

/// Main configuration structure for site-verifier
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SiteVerifierConfig {
    /// Site Verification API settings
    pub api: ApiConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Root of the Site Verification REST API
    pub base_url: String,
    /// Sent as the User-Agent of every request
    pub application_name: String,
    /// OAuth2 access token (can be set via env var)
    pub access_token: Option<String>,
    /// Ask the API for indented JSON responses
    pub pretty_print: bool,
    /// Fall back to `gcloud auth print-access-token` when no token is configured
    pub gcloud_fallback: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level, overridden by RUST_LOG
    pub log_level: String,
    /// Emit JSON log records instead of compact text
    pub json_logs: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
            access_token: None, // Will be read from env var or gcloud
            pretty_print: true,
            gcloud_fallback: true,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            // Logs share the terminal with the operator dialogue
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }
}

impl SiteVerifierConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. site-verifier.toml in the working directory
    /// 3. An explicit configuration file
    /// 4. Environment variables (prefixed with SITE_VERIFIER_, nested with __)
    pub fn load(explicit_file: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.application_name", defaults.api.application_name)?
            .set_default("api.pretty_print", defaults.api.pretty_print)?
            .set_default("api.gcloud_fallback", defaults.api.gcloud_fallback)?
            .set_default("observability.log_level", defaults.observability.log_level)?
            .set_default("observability.json_logs", defaults.observability.json_logs)?;

        if Path::new("site-verifier.toml").exists() {
            builder = builder.add_source(File::with_name("site-verifier"));
        }

        if let Some(path) = explicit_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("SITE_VERIFIER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: SiteVerifierConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Load .env file if it exists. Returns whether one was loaded.
    pub fn load_env_file() -> Result<bool> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            return Ok(true);
        }
        Ok(false)
    }
}

impl ApiConfig {
    /// Find an already-issued OAuth2 access token.
    ///
    /// Checks, in order, the configured token, `GOOGLE_OAUTH_ACCESS_TOKEN` and,
    /// when enabled, the Cloud SDK. Authorization flows themselves are not run here.
    pub fn resolve_access_token(&self) -> Result<String, VerificationError> {
        if let Some(token) = self.access_token.as_deref().and_then(usable_token) {
            return Ok(token);
        }

        if let Some(token) = std::env::var(ACCESS_TOKEN_ENV).ok().as_deref().and_then(usable_token) {
            return Ok(token);
        }

        if self.gcloud_fallback {
            match std::process::Command::new("gcloud")
                .args(["auth", "print-access-token"])
                .output()
            {
                Ok(output) if output.status.success() => {
                    if let Some(token) = usable_token(&String::from_utf8_lossy(&output.stdout)) {
                        tracing::debug!("Using access token from gcloud");
                        return Ok(token);
                    }
                }
                Ok(output) => {
                    tracing::debug!(
                        stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                        "gcloud could not print an access token"
                    );
                }
                Err(e) => {
                    tracing::debug!("gcloud not available: {}", e);
                }
            }
        }

        Err(VerificationError::TokenNotFound(format!(
            "No OAuth access token found. Pass --access-token, set {ACCESS_TOKEN_ENV}, or sign in with the Cloud SDK."
        )))
    }
}

fn usable_token(raw: &str) -> Option<String> {
    let token = raw.trim();
    if token.is_empty() || token == TOKEN_PLACEHOLDER {
        None
    } else {
        Some(token.to_string())
    }
}

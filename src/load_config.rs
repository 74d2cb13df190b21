//! `load_config` module: builds the delivery configuration from the environment and an optional
//! YAML settings file.
//!
//! # Responsibilities
//! - Read the required secrets from the environment (`CONTENTFUL_SPACE_ID`,
//!   `CONTENTFUL_ACCESS_TOKEN`); a missing or empty value is fatal.
//! - Parse the optional settings file (`environment`, `host`, `locale`, `timeout_secs`).
//!   Unknown keys are rejected so typos do not silently fall back to defaults.
//! - Secrets never come from the file.
//!
//! # Errors
//! All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use portfolio_content_core::config::ContentfulConfig;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const SPACE_ID_VAR: &str = "CONTENTFUL_SPACE_ID";
pub const ACCESS_TOKEN_VAR: &str = "CONTENTFUL_ACCESS_TOKEN";

/// Non-secret settings. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<SettingsFile> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading settings from file");

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read settings file");
            return Err(anyhow::anyhow!(
                "Failed to read settings file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty file is valid and means "all defaults".
    if content.trim().is_empty() {
        return Ok(SettingsFile::default());
    }

    match serde_yaml::from_str(&content) {
        Ok(settings) => {
            info!(config_path = ?path_ref, "Parsed settings YAML successfully");
            Ok(settings)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse settings YAML");
            Err(anyhow::anyhow!("Failed to parse settings YAML: {e}"))
        }
    }
}

fn required_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        Ok(_) => {
            error!(variable = name, "Required environment variable is empty");
            Err(anyhow::anyhow!("Environment variable {name} is set but empty"))
        }
        Err(e) => {
            error!(variable = name, error = ?e, "Required environment variable missing");
            Err(anyhow::anyhow!(
                "Missing required environment variable {name}: {e}"
            ))
        }
    }
}

/// Loads the delivery configuration. Environment secrets are checked first, so a missing
/// credential is reported even when the settings file is also broken.
pub fn load_config(path: Option<&Path>) -> Result<ContentfulConfig> {
    let space_id = required_env(SPACE_ID_VAR)?;
    let access_token = required_env(ACCESS_TOKEN_VAR)?;

    let settings = match path {
        Some(path) => load_settings(path)?,
        None => {
            info!("No settings file given, using defaults");
            SettingsFile::default()
        }
    };

    let mut config = ContentfulConfig::new(space_id, access_token);
    if let Some(environment) = settings.environment {
        config.environment = environment;
    }
    if let Some(host) = settings.host {
        config.host = host;
    }
    config.locale = settings.locale;
    if let Some(timeout_secs) = settings.timeout_secs {
        if timeout_secs == 0 {
            error!("timeout_secs must be greater than zero");
            return Err(anyhow::anyhow!("timeout_secs must be greater than zero"));
        }
        config.timeout_secs = timeout_secs;
    }

    config.trace_loaded();
    Ok(config)
}

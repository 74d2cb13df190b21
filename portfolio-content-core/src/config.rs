use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_ENVIRONMENT: &str = "master";
pub const DEFAULT_HOST: &str = "https://cdn.contentful.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the content delivery service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentfulConfig {
    pub space_id: String,
    pub access_token: String,
    pub environment: String,
    pub host: String,
    pub locale: Option<String>,
    pub timeout_secs: u64,
}

impl ContentfulConfig {
    pub fn new(space_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            access_token: access_token.into(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            host: DEFAULT_HOST.to_string(),
            locale: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `{host}/spaces/{space}/environments/{env}/entries`
    pub fn entries_url(&self) -> String {
        format!(
            "{}/spaces/{}/environments/{}/entries",
            self.host.trim_end_matches('/'),
            self.space_id,
            self.environment
        )
    }

    pub fn trace_loaded(&self) {
        info!(
            space_id = %self.space_id,
            environment = %self.environment,
            host = %self.host,
            timeout_secs = self.timeout_secs,
            "Loaded ContentfulConfig"
        );
        debug!(?self, "ContentfulConfig loaded (full debug)");
    }
}

impl fmt::Debug for ContentfulConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentfulConfig")
            .field("space_id", &self.space_id)
            .field("access_token", &"***")
            .field("environment", &self.environment)
            .field("host", &self.host)
            .field("locale", &self.locale)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

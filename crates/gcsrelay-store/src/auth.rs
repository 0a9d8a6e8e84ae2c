//! Ambient credential resolution.
//!
//! Credentials are process-wide, read-only configuration: an explicit token
//! from the environment when present, the GCE metadata server otherwise, and
//! nothing at all against emulators.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StoreError;

const TOKEN_ENV_VARS: [&str; 2] = ["GCS_OAUTH_TOKEN", "GOOGLE_OAUTH_ACCESS_TOKEN"];
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// How long before expiry a cached metadata token is refreshed.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Where bearer tokens for the store come from.
pub enum Credentials {
    /// No `Authorization` header. Enough for emulators and public buckets.
    Anonymous,
    /// Fixed token taken from the environment.
    Static(String),
    /// GCE metadata server, with the token cached until shortly before
    /// expiry.
    Metadata { cached: Mutex<Option<CachedToken>> },
}

pub struct CachedToken {
    token: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

impl Credentials {
    /// Environment token when one is set, metadata server otherwise.
    #[must_use]
    pub fn ambient() -> Self {
        for var in TOKEN_ENV_VARS {
            if let Ok(token) = std::env::var(var)
                && !token.is_empty()
            {
                debug!(source = var, "using bearer token from environment");
                return Credentials::Static(token);
            }
        }
        Credentials::Metadata {
            cached: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Credentials::Anonymous
    }

    #[must_use]
    pub fn from_token(token: impl Into<String>) -> Self {
        Credentials::Static(token.into())
    }

    /// Current bearer token, if this source produces one.
    pub(crate) async fn bearer_token(
        &self,
        http: &reqwest::Client,
    ) -> Result<Option<String>, StoreError> {
        match self {
            Credentials::Anonymous => Ok(None),
            Credentials::Static(token) => Ok(Some(token.clone())),
            Credentials::Metadata { cached } => {
                let mut slot = cached.lock().await;
                if let Some(entry) = slot.as_ref()
                    && entry.expires_at > Instant::now()
                {
                    return Ok(Some(entry.token.clone()));
                }

                let response = http
                    .get(METADATA_TOKEN_URL)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .map_err(|e| StoreError::Access(format!("metadata server: {e}")))?;
                if !response.status().is_success() {
                    return Err(StoreError::Access(format!(
                        "metadata server returned {}",
                        response.status()
                    )));
                }
                let token: MetadataToken = response
                    .json()
                    .await
                    .map_err(|e| StoreError::Access(format!("metadata token response: {e}")))?;

                debug!(expires_in = token.expires_in, "fetched metadata-server token");
                let expires_at = Instant::now()
                    + Duration::from_secs(token.expires_in).saturating_sub(REFRESH_MARGIN);
                let value = token.access_token.clone();
                *slot = Some(CachedToken {
                    token: token.access_token,
                    expires_at,
                });
                Ok(Some(value))
            }
        }
    }
}

impl fmt::Debug for Credentials {
    // Tokens stay out of logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Anonymous => f.write_str("Anonymous"),
            Credentials::Static(_) => f.write_str("Static(<redacted>)"),
            Credentials::Metadata { .. } => f.write_str("Metadata"),
        }
    }
}

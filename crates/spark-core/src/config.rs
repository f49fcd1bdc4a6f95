// ── Runtime connection configuration ──
//
// Describes *how* to reach the device cloud. Never touches disk: the CLI
// builds a `CloudConfig` from its config layer and hands it in, together
// with an explicit cache path.

use std::time::Duration;

use secrecy::SecretString;
use spark_api::{CloudClient, TransportConfig, DEFAULT_BASE_URL};
use url::Url;

use crate::error::CoreError;
use crate::variable::DEFAULT_POLL_INTERVAL;

/// Configuration shared by every session and collection in a process.
#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// Cloud base URL (e.g., `https://api.spark.io`).
    pub url: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// Interval used when auto-update is enabled without an explicit value.
    pub poll_interval: Duration,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            timeout: Duration::from_secs(30),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl CloudConfig {
    /// Build a cloud client authenticated with `token`.
    pub fn client(&self, token: SecretString) -> Result<CloudClient, CoreError> {
        let transport = TransportConfig::default().with_timeout(self.timeout);
        Ok(CloudClient::new(self.url.clone(), token, &transport)?)
    }
}

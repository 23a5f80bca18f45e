//! Mobile proxy IP rotation over a provider's change-IP URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::{debug, info};
use url::Url;

use crate::error::Result;
use crate::port::outbound::network::IpRotator;

/// Calls the change-IP URL and treats any 2xx as a completed rotation.
pub struct HttpIpRotator {
    http: HttpClient,
    url: Url,
}

impl HttpIpRotator {
    /// # Errors
    ///
    /// Returns an error if `url` does not parse or the HTTP client cannot be built.
    pub fn new(url: &str) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            url: Url::parse(url)?,
        })
    }
}

#[async_trait]
impl IpRotator for HttpIpRotator {
    async fn rotate(&self) -> Result<()> {
        debug!(host = ?self.url.host_str(), "Requesting IP change");
        let response = self
            .http
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?;
        info!(status = %response.status(), "Proxy IP changed");
        Ok(())
    }
}

/*
[INPUT]:  MefsConfig (base URL, origin, timeouts)
[OUTPUT]: Configured reqwest client ready for MEFS API calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing URL layout
*/

use reqwest::{Client, Method, RequestBuilder, Url};
use std::time::Duration;

use crate::config::MefsConfig;
use crate::http::{MefsError, Result};

/// Path segment under which storage endpoints live
pub(crate) const STORAGE_SEGMENT: &str = "mefs";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&MefsConfig> for ClientConfig {
    fn from(config: &MefsConfig) -> Self {
        Self {
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
        }
    }
}

/// Main HTTP client for the MEFS API
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct MefsClient {
    http_client: Client,
    base_url: Url,
    origin: String,
}

impl MefsClient {
    /// Create a client from a validated configuration
    pub fn new(config: &MefsConfig) -> Result<Self> {
        config.validate()?;
        Self::with_config_and_base_url(
            ClientConfig::from(config),
            &config.api_base_url,
            &config.origin,
        )
    }

    /// Create a client with explicit settings
    pub fn with_config_and_base_url(
        config: ClientConfig,
        base_url: &str,
        origin: &str,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        let base_url = Url::parse(base_url.trim())?;
        if base_url.cannot_be_a_base() {
            return Err(MefsError::Config(format!(
                "base URL cannot have path segments: {base_url}"
            )));
        }

        Ok(Self {
            http_client,
            base_url,
            origin: origin.to_string(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Append `segments` to the base URL, keeping any path prefix it has
    pub(crate) fn endpoint_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                MefsError::Config(format!(
                    "base URL cannot have path segments: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build request builder for an endpoint under the base URL
    pub(crate) fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.endpoint_url(segments)?;
        Ok(self.http_client.request(method, url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_keeps_path_prefix() {
        let client = MefsClient::with_config_and_base_url(
            ClientConfig::default(),
            "https://storage.example.com/api/",
            "https://app.example.com",
        )
        .unwrap();

        assert_eq!(
            client.endpoint_url(&["challenge"]).unwrap().as_str(),
            "https://storage.example.com/api/challenge"
        );
        assert_eq!(
            client.endpoint_url(&[STORAGE_SEGMENT, ""]).unwrap().as_str(),
            "https://storage.example.com/api/mefs/"
        );
    }

    #[test]
    fn test_endpoint_url_escapes_segments() {
        let client = MefsClient::with_config_and_base_url(
            ClientConfig::default(),
            "https://storage.example.com",
            "https://app.example.com",
        )
        .unwrap();

        assert_eq!(
            client.endpoint_url(&[STORAGE_SEGMENT, "a/b"]).unwrap().as_str(),
            "https://storage.example.com/mefs/a%2Fb"
        );
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = MefsConfig::new("mailto:someone@example.com", "https://app.example.com", 985);
        assert!(MefsClient::new(&config).is_err());
    }
}

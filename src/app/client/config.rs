//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the HTTP client
//! used for both listing pages and document downloads. The client is built
//! once per run and shared, so connections are reused across requests.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::{http, limits};
use crate::errors::{ConfigError, FetchError, FetchResult};

/// Configuration for the portal HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// User agent presented to the portal
    pub user_agent: String,
    /// Request timeout covering the whole request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connection establishment timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Maximum connections per host in the pool
    pub pool_max_per_host: usize,
    /// Maximum attempts for a failing request
    pub retry_attempts: u32,
    /// Base delay for exponential backoff between attempts
    #[serde(with = "humantime_serde")]
    pub retry_base_delay: Duration,
    /// Extra request headers sent with every request; kept last so the
    /// header table serializes after the scalar values
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: http::USER_AGENT.to_string(),
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            retry_attempts: limits::RETRY_ATTEMPTS,
            retry_base_delay: limits::RETRY_BASE_DELAY,
            headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    /// Validate configuration values that would break the retry loop
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.retry_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Build the HTTP client with the specified configuration
    pub fn build_http_client(&self) -> FetchResult<Client> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name: HeaderName = name
                .parse()
                .map_err(|_| FetchError::InvalidHeader { name: name.clone() })?;
            let header_value: HeaderValue = value
                .parse()
                .map_err(|_| FetchError::InvalidHeader { name: name.clone() })?;
            default_headers.insert(header_name, header_value);
        }
        default_headers.insert(
            USER_AGENT,
            self.user_agent.parse().map_err(|_| FetchError::InvalidHeader {
                name: "user-agent".to_string(),
            })?,
        );

        Client::builder()
            .default_headers(default_headers)
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .pool_idle_timeout(Some(http::POOL_IDLE_TIMEOUT))
            .pool_max_idle_per_host(self.pool_max_per_host)
            .tcp_nodelay(true)
            .build()
            .map_err(FetchError::Http)
    }
}

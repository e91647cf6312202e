//! Portal HTTP client
//!
//! One explicitly constructed client is shared across the whole run: the
//! listing fetch and every document download go through the same connection
//! pool and the same retry policy. There are no hidden process-wide
//! singletons; anything that needs to talk to the portal holds a reference to
//! a [`PortalClient`].

pub mod config;
pub mod retry;

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

use crate::app::models::DocumentDescriptor;
use crate::constants::files;
use crate::errors::{FetchError, FetchResult};

pub use config::ClientConfig;
pub use retry::RetryPolicy;

/// Seam between the orchestrator and the network
///
/// The orchestrator only needs "fetch this document to that path"; keeping
/// the seam narrow lets scheduling and resume logic be tested without a
/// server.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch one document and write it to `target`, returning bytes written
    async fn fetch_document(
        &self,
        descriptor: &DocumentDescriptor,
        target: &Path,
    ) -> FetchResult<u64>;
}

/// HTTP client for a document portal
#[derive(Debug)]
pub struct PortalClient {
    http: Client,
    policy: RetryPolicy,
    document_url_base: String,
    expected_content_type: String,
}

impl PortalClient {
    /// Build a client from configuration
    ///
    /// `document_url_base` is the URL prefix a document id is appended to,
    /// e.g. `https://portal.example.gov.uk/Document/ViewDocument?id=`.
    pub fn new(
        config: &ClientConfig,
        document_url_base: impl Into<String>,
        expected_content_type: impl Into<String>,
    ) -> FetchResult<Self> {
        Ok(Self {
            http: config.build_http_client()?,
            policy: RetryPolicy::new(config.retry_attempts, config.retry_base_delay),
            document_url_base: document_url_base.into(),
            expected_content_type: expected_content_type.into(),
        })
    }

    /// The retry policy in force for this client
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Download URL for one document id
    pub fn document_url(&self, id: &str) -> FetchResult<Url> {
        let raw = format!("{}{}", self.document_url_base, id);
        Url::parse(&raw).map_err(|source| FetchError::InvalidUrl { url: raw, source })
    }

    /// Fetch a page body as text, with retries
    pub async fn get_text(&self, url: &str) -> FetchResult<String> {
        let url = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        retry::run(self.policy, |_| {
            let url = url.clone();
            async move {
                let response = self.http.get(url.clone()).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }
                let body = response.text().await?;
                debug!("Fetched {} ({} bytes)", url, body.len());
                Ok(body)
            }
        })
        .await
    }

    /// One streamed download attempt into the temp path
    async fn download_attempt(&self, url: &Url, temp_path: &Path) -> FetchResult<u64> {
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        // The portal occasionally mislabels documents; a mismatch is worth a
        // warning but the bytes are saved regardless.
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if !content_type.contains(&self.expected_content_type) {
            warn!(
                "{} might not be {} (Content-Type: {})",
                url, self.expected_content_type, content_type
            );
        }

        let io_err = |source| FetchError::Io {
            path: temp_path.to_path_buf(),
            source,
        };

        let mut file = tokio::fs::File::create(temp_path).await.map_err(io_err)?;
        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(FetchError::Http)?;
            file.write_all(&chunk).await.map_err(io_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_err)?;

        Ok(written)
    }
}

#[async_trait]
impl DocumentFetcher for PortalClient {
    /// Download one document to `target` with retries and an atomic rename
    ///
    /// The body is streamed chunk-by-chunk into a sibling temp file, so
    /// memory use is bounded and `target` only ever appears complete.
    async fn fetch_document(
        &self,
        descriptor: &DocumentDescriptor,
        target: &Path,
    ) -> FetchResult<u64> {
        let url = self.document_url(&descriptor.id)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| FetchError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let temp_path = target.with_extension(format!(
            "{}{}",
            target.extension().and_then(|s| s.to_str()).unwrap_or(""),
            files::TEMP_FILE_SUFFIX
        ));

        let result = retry::run(self.policy, |_| {
            let url = url.clone();
            let temp_path = temp_path.clone();
            async move { self.download_attempt(&url, &temp_path).await }
        })
        .await;

        match result {
            Ok(written) => {
                tokio::fs::rename(&temp_path, target).await.map_err(|source| {
                    FetchError::AtomicRename {
                        temp_path: temp_path.clone(),
                        final_path: target.to_path_buf(),
                        source,
                    }
                })?;
                debug!("Downloaded {} -> {}", url, target.display());
                Ok(written)
            }
            Err(e) => {
                if temp_path.exists() {
                    let _ = tokio::fs::remove_file(&temp_path).await;
                }
                Err(e)
            }
        }
    }
}

use std::time::Duration;

use filters_logging::{filters_debug, filters_error, filters_warn};
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use url::Url;

use crate::decode::decode_body;
use crate::{EngineEvent, FailureKind, FetchError, FetchMetadata, FetchedPage};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// `None` waits as long as the server takes.
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
    pub redirect_limit: usize,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            request_timeout: None,
            redirect_limit: 20,
            user_agent: concat!("collection-filters/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Receives engine events on whatever thread produced them.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, FetchError> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(self.settings.redirect_limit))
            .user_agent(self.settings.user_agent.clone());
        if let Some(timeout) = self.settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = self.settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = self.build_client()?;

        let response = client
            .get(parsed)
            .header(ACCEPT, "text/html")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        // Like `fetch()`, an HTTP error status still yields a body.
        let status = response.status();
        if !status.is_success() {
            filters_warn!("GET {url} answered {status}");
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            bytes.extend_from_slice(&chunk);
        }

        let decoded = decode_body(&bytes, content_type.as_deref());
        if decoded.lossy {
            filters_warn!(
                "GET {url}: invalid {} sequences replaced",
                decoded.encoding_label
            );
        }
        filters_debug!(
            "GET {url}: {} bytes of {}",
            bytes.len(),
            decoded.encoding_label
        );

        Ok(FetchedPage {
            html: decoded.text,
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url,
                status: status.as_u16(),
                content_type,
                encoding: decoded.encoding_label,
                byte_len: bytes.len() as u64,
            },
        })
    }
}

/// Fetches a section's HTML. Failures are logged and become `None`.
pub async fn fetch_section(fetcher: &dyn Fetcher, url: &str) -> Option<String> {
    match fetcher.fetch(url).await {
        Ok(page) => Some(page.html),
        Err(err) => {
            filters_error!("section fetch {url} failed: {err}");
            None
        }
    }
}

/// Resolves a request target such as `/collections/all?section_id=x&` against the page URL.
pub fn resolve_target(page_url: &str, target: &str) -> Result<Url, FetchError> {
    Url::parse(page_url)
        .and_then(|base| base.join(target))
        .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}

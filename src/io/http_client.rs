//! HTTP access for every service.
//!
//! `PageFetcher` is the seam services depend on; `HttpFetcher` is the
//! reqwest-backed implementation. Failures are classified into
//! `FetchErrorKind` so callers can decide whether to fall back to
//! simulated data.

use std::time::Instant;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use url::Url;

use crate::config::HttpConfig;
use crate::error::{AppError, FetchErrorKind, Result};

/// Markers of interstitial bot-challenge pages served instead of content.
const CHALLENGE_MARKERS: &[&str] = &["cf-chl", "Just a moment...", "captcha-delivery"];

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub final_url: Url,
    pub status: u16,
    pub html: String,
    pub load_time_ms: u64,
    pub content_size: usize,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch an HTML page. HTTP error statuses other than access refusals
    /// are returned as pages so they can be reported as issues.
    async fn fetch_page(&self, url: &Url) -> Result<FetchedPage>;

    /// Status code of `url` without reading the body where possible.
    async fn probe(&self, url: &Url) -> Result<u16>;

    /// Status and body of a plain-text resource such as robots.txt.
    async fn fetch_text(&self, url: &Url) -> Result<(u16, String)>;
}

/// Build the shared reqwest client.
pub fn create_client(config: &HttpConfig) -> anyhow::Result<Client> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("Failed to build HTTP client")
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn is_html(content_type: Option<&str>) -> bool {
        match content_type {
            None => true,
            Some(ct) => {
                let ct = ct.to_ascii_lowercase();
                ct.contains("html") || ct.starts_with("text/plain")
            }
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<FetchedPage> {
        tracing::debug!("[HTTP] GET {}", url);
        let start = Instant::now();

        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().clone();

        if let Some(kind) = FetchErrorKind::from_status(status) {
            return Err(AppError::fetch(kind, format!("{} returned {}", url, status)));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if !Self::is_html(content_type.as_deref()) {
            return Err(AppError::fetch(
                FetchErrorKind::Parsing,
                format!(
                    "{} is not an HTML document ({})",
                    url,
                    content_type.unwrap_or_default()
                ),
            ));
        }

        let content_length = response.content_length();
        let html = response.text().await?;
        let load_time_ms = start.elapsed().as_millis() as u64;

        if status == StatusCode::SERVICE_UNAVAILABLE.as_u16()
            && CHALLENGE_MARKERS.iter().any(|m| html.contains(m))
        {
            return Err(AppError::fetch(
                FetchErrorKind::Cors,
                format!("{} served a bot challenge", url),
            ));
        }

        let content_size = content_length.map(|l| l as usize).unwrap_or(html.len());
        tracing::debug!(
            "[HTTP] {} -> {} ({} bytes in {}ms)",
            url,
            status,
            content_size,
            load_time_ms
        );

        Ok(FetchedPage {
            url: url.clone(),
            final_url,
            status,
            html,
            load_time_ms,
            content_size,
        })
    }

    async fn probe(&self, url: &Url) -> Result<u16> {
        let response = self.client.head(url.as_str()).send().await?;
        let status = response.status();
        if status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED {
            tracing::trace!("[HTTP] HEAD not supported by {}, retrying with GET", url);
            let response = self.client.get(url.as_str()).send().await?;
            return Ok(response.status().as_u16());
        }
        Ok(status.as_u16())
    }

    async fn fetch_text(&self, url: &Url) -> Result<(u16, String)> {
        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }
}

/// Parse and normalise a user-supplied URL. A missing scheme defaults to https.
pub fn parse_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidUrl("empty URL".to_string()));
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let url = Url::parse(&candidate).map_err(|e| AppError::InvalidUrl(format!("{}: {}", input, e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(AppError::InvalidUrl(format!("{}: only http(s) URLs are supported", input)));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&HttpConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_url() {
        assert_eq!(parse_url("example.com").unwrap().as_str(), "https://example.com/");
        assert_eq!(parse_url(" http://example.com/a ").unwrap().as_str(), "http://example.com/a");
        assert!(matches!(parse_url(""), Err(AppError::InvalidUrl(_))));
        assert!(matches!(parse_url("ftp://example.com"), Err(AppError::InvalidUrl(_))));
        assert!(matches!(parse_url("http://"), Err(AppError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_page_ok() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<html><head><title>Hi</title></head></html>")
            .create_async()
            .await;

        let url = Url::parse(&server.url()).unwrap();
        let page = fetcher().fetch_page(&url).await.unwrap();
        assert_eq!(page.status, 200);
        assert!(page.html.contains("<title>Hi</title>"));
        assert_eq!(page.content_size, page.html.len());
    }

    #[tokio::test]
    async fn test_not_found_is_still_a_page() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .with_header("content-type", "text/html")
            .with_body("<html><body>Not found</body></html>")
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/missing", server.url())).unwrap();
        let page = fetcher().fetch_page(&url).await.unwrap();
        assert_eq!(page.status, 404);
    }

    #[tokio::test]
    async fn test_forbidden_is_cors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/").with_status(403).create_async().await;

        let url = Url::parse(&server.url()).unwrap();
        let err = fetcher().fetch_page(&url).await.unwrap_err();
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::Cors));
    }

    #[tokio::test]
    async fn test_bot_challenge_is_cors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(503)
            .with_header("content-type", "text/html")
            .with_body("<html><title>Just a moment...</title></html>")
            .create_async()
            .await;

        let url = Url::parse(&server.url()).unwrap();
        let err = fetcher().fetch_page(&url).await.unwrap_err();
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::Cors));
    }

    #[tokio::test]
    async fn test_non_html_is_parsing() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/file.pdf")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body("%PDF-1.4")
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/file.pdf", server.url())).unwrap();
        let err = fetcher().fetch_page(&url).await.unwrap_err();
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::Parsing));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network() {
        // Nothing listens on port 9 (discard) on the loopback interface
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let err = fetcher().fetch_page(&url).await.unwrap_err();
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::Network));
    }

    #[tokio::test]
    async fn test_probe_falls_back_to_get() {
        let mut server = mockito::Server::new_async().await;
        let _head = server.mock("HEAD", "/page").with_status(405).create_async().await;
        let _get = server.mock("GET", "/page").with_status(200).create_async().await;

        let url = Url::parse(&format!("{}/page", server.url())).unwrap();
        assert_eq!(fetcher().probe(&url).await.unwrap(), 200);
    }
}

//! Single-page scanning: fetch, extract, optionally check links.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use url::Url;

use crate::config::CrawlSettings;
use crate::domain::models::PageAnalysis;
use crate::error::{FetchErrorKind, Result};
use crate::extractor::page_extractor::{PageExtractor, ResponseMeta};
use crate::io::http_client::{FetchedPage, PageFetcher};
use crate::service::simulator::Simulator;

const LINK_CHECK_CONCURRENCY: usize = 8;

/// Which links of a page get their status checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCheck {
    Skip,
    Internal,
    All,
}

impl LinkCheck {
    pub fn from_settings(settings: &CrawlSettings) -> Self {
        match (settings.check_links, settings.include_external_links) {
            (false, _) => LinkCheck::Skip,
            (true, false) => LinkCheck::Internal,
            (true, true) => LinkCheck::All,
        }
    }
}

/// A scanned page plus the reason it is simulated, if it is.
#[derive(Debug, Clone, Serialize)]
pub struct PageScan {
    pub page: PageAnalysis,
    pub error: Option<FetchErrorKind>,
}

pub struct SiteScanner {
    fetcher: Arc<dyn PageFetcher>,
    simulator: Arc<Simulator>,
    fallback_enabled: bool,
}

impl SiteScanner {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        simulator: Arc<Simulator>,
        fallback_enabled: bool,
    ) -> Self {
        Self {
            fetcher,
            simulator,
            fallback_enabled,
        }
    }

    pub fn fallback_enabled(&self) -> bool {
        self.fallback_enabled
    }

    /// Fetch and analyse `url`. A failed fetch yields a simulated page tagged
    /// with the failure kind, or the error itself when fallback is off.
    pub async fn scan_page(&self, url: &Url, links: LinkCheck) -> Result<PageScan> {
        match self.fetcher.fetch_page(url).await {
            Ok(fetched) => Ok(PageScan {
                page: self.analyze_fetched(&fetched, links).await,
                error: None,
            }),
            Err(e) => {
                let Some(kind) = e.fetch_kind().filter(|_| self.fallback_enabled) else {
                    return Err(e);
                };
                tracing::warn!(
                    "[AUDIT] Live fetch of {} failed ({}), using simulated data: {}",
                    url,
                    kind,
                    e
                );
                tokio::time::sleep(self.simulator.latency()).await;
                Ok(PageScan {
                    page: self.simulator.page(url),
                    error: Some(kind),
                })
            }
        }
    }

    /// Analyse an already fetched page.
    pub async fn analyze_fetched(&self, fetched: &FetchedPage, links: LinkCheck) -> PageAnalysis {
        let meta = ResponseMeta {
            status_code: fetched.status,
            load_time_ms: fetched.load_time_ms,
            content_size: fetched.content_size,
        };
        let mut page = PageExtractor::analyze(&fetched.html, &fetched.final_url, meta);
        tracing::debug!(
            "[AUDIT] {} -> {} issues, {} words, {} links",
            page.url,
            page.issues.len(),
            page.word_count,
            page.links.len()
        );

        if links != LinkCheck::Skip {
            self.check_links(&mut page, links == LinkCheck::All).await;
        }
        page
    }

    /// Probe every distinct link on the page and record status codes.
    /// Unreachable links are recorded as status 0.
    pub async fn check_links(&self, page: &mut PageAnalysis, include_external: bool) {
        let mut targets: Vec<String> = page
            .links
            .iter()
            .filter(|l| include_external || l.is_internal)
            .map(|l| l.href.clone())
            .collect();
        targets.sort();
        targets.dedup();
        tracing::debug!("[AUDIT] Checking {} links on {}", targets.len(), page.url);

        let fetcher = &self.fetcher;
        let statuses: Vec<(String, u16)> = stream::iter(targets)
            .map(|href| async move {
                let status = match Url::parse(&href) {
                    Ok(url) => match fetcher.probe(&url).await {
                        Ok(status) => status,
                        Err(e) => {
                            tracing::debug!("[AUDIT] Link {} unreachable: {}", href, e);
                            0
                        }
                    },
                    Err(_) => 0,
                };
                (href, status)
            })
            .buffer_unordered(LINK_CHECK_CONCURRENCY)
            .collect()
            .await;

        for link in page.links.iter_mut() {
            link.status_code = statuses
                .iter()
                .find(|(href, _)| *href == link.href)
                .map(|(_, status)| *status);
        }
        page.refresh_issues();
    }
}

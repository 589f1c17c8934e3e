//! Page discovery and resource checking services

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use url::Url;

use crate::domain::models::SiteResources;
use crate::error::Result;
use crate::extractor::page_extractor::PageExtractor;
use crate::extractor::sitemap::{self, Sitemap};
use crate::io::http_client::{FetchedPage, PageFetcher};

const MAX_SITEMAPS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceStatus {
    Found(String),
    Unauthorized(String),
    NotFound,
}

impl ResourceStatus {
    pub fn exists(&self) -> bool {
        matches!(
            self,
            ResourceStatus::Found(_) | ResourceStatus::Unauthorized(_)
        )
    }
}

/// Pages found by discovery. The start page's own fetch is kept so the
/// scanner does not have to download it twice.
#[derive(Debug, Default)]
pub struct Discovered {
    pub urls: Vec<Url>,
    pub start_page: Option<FetchedPage>,
}

pub struct PageDiscovery {
    fetcher: Arc<dyn PageFetcher>,
}

impl PageDiscovery {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Same-site breadth-first discovery, seeded with sitemap URLs.
    ///
    /// Fails only when the start page itself cannot be fetched; later
    /// failures are skipped.
    pub async fn discover(
        &self,
        start_url: &Url,
        max_pages: usize,
        delay: Duration,
        cancel_flag: &AtomicBool,
        on_discovered: impl Fn(usize) + Send + Sync,
    ) -> Result<Discovered> {
        tracing::info!("[DISCOVERY] Starting page discovery from: {}", start_url);
        tracing::debug!("[DISCOVERY] Max pages: {}, Delay: {:?}", max_pages, delay);

        let start_page = self.fetcher.fetch_page(start_url).await?;
        // Redirects decide the site: links are compared with where the start page landed
        let site = start_page.final_url.clone();
        if site != *start_url {
            tracing::debug!("[DISCOVERY] {} redirected to {}", start_url, site);
        }

        let mut visited: HashSet<Url> = HashSet::new();
        let mut order: Vec<Url> = Vec::new();
        let mut queue: VecDeque<Url> = VecDeque::new();
        let mut queued: HashSet<Url> = HashSet::new();

        visited.insert(start_url.clone());
        visited.insert(site.clone());
        order.push(site.clone());
        on_discovered(order.len());

        let enqueue = |url: Url, queue: &mut VecDeque<Url>, queued: &mut HashSet<Url>| {
            if PageExtractor::same_site(&site, &url) && queued.insert(url.clone()) {
                queue.push_back(url);
            }
        };

        for url in Self::links_in(&start_page.html, &site) {
            enqueue(url, &mut queue, &mut queued);
        }
        for url in self.sitemap_urls(&site).await {
            enqueue(url, &mut queue, &mut queued);
        }

        while let Some(url) = queue.pop_front() {
            if order.len() >= max_pages {
                tracing::info!("[DISCOVERY] Reached max pages limit: {}", max_pages);
                break;
            }
            if cancel_flag.load(Ordering::Relaxed) {
                tracing::warn!(
                    "[DISCOVERY] Discovery cancelled by user at {} pages",
                    order.len()
                );
                break;
            }
            if !visited.insert(url.clone()) {
                continue;
            }

            if !delay.is_zero() {
                sleep(delay).await;
            }

            let page = match self.fetcher.fetch_page(&url).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::debug!("[DISCOVERY] Failed to fetch {}: {}", url, e);
                    continue;
                }
            };

            order.push(url.clone());
            tracing::info!(
                "[DISCOVERY] Discovered page {}/{}: {}",
                order.len(),
                max_pages,
                url
            );
            on_discovered(order.len());

            for link in Self::links_in(&page.html, &page.final_url) {
                if !visited.contains(&link) {
                    enqueue(link, &mut queue, &mut queued);
                }
            }
            tracing::trace!("[DISCOVERY] Queue size: {}", queue.len());
        }

        tracing::info!("[DISCOVERY] Discovery complete - found {} pages", order.len());
        Ok(Discovered {
            urls: order,
            start_page: Some(start_page),
        })
    }

    /// Page URLs from the site's sitemaps: those declared in robots.txt, or
    /// `/sitemap.xml` when none are. Sitemap indexes are followed up to
    /// `MAX_SITEMAPS` documents.
    async fn sitemap_urls(&self, start_url: &Url) -> Vec<Url> {
        let mut pending: VecDeque<Url> = self.declared_sitemaps(start_url).await.into();
        if pending.is_empty() {
            pending.extend(sitemap::default_location(start_url));
        }

        let mut seen: HashSet<Url> = HashSet::new();
        let mut pages = Vec::new();
        while let Some(location) = pending.pop_front() {
            if seen.len() >= MAX_SITEMAPS {
                tracing::debug!("[DISCOVERY] Sitemap limit reached, skipping {}", location);
                break;
            }
            if !seen.insert(location.clone()) {
                continue;
            }
            match self.fetcher.fetch_text(&location).await {
                Ok((200, body)) => {
                    let parsed = Sitemap::parse(&body);
                    tracing::debug!(
                        "[DISCOVERY] {} lists {} pages and {} sitemaps",
                        location,
                        parsed.pages.len(),
                        parsed.nested.len()
                    );
                    pages.extend(parsed.pages);
                    pending.extend(parsed.nested);
                }
                Ok((status, _)) => tracing::trace!("[DISCOVERY] No sitemap at {} ({})", location, status),
                Err(e) => tracing::trace!("[DISCOVERY] Sitemap fetch failed for {}: {}", location, e),
            }
        }
        pages
    }

    async fn declared_sitemaps(&self, start_url: &Url) -> Vec<Url> {
        let Ok(robots) = start_url.join("/robots.txt") else {
            return Vec::new();
        };
        match self.fetcher.fetch_text(&robots).await {
            Ok((200, body)) => sitemap::robots_sitemaps(&body),
            _ => Vec::new(),
        }
    }

    /// Absolute, fragment-free links of a page.
    pub fn links_in(html: &str, base_url: &Url) -> Vec<Url> {
        let document = scraper::Html::parse_document(html);
        PageExtractor::extract_links(&document, base_url)
            .into_iter()
            .filter_map(|link| Url::parse(&link.href).ok())
            .collect()
    }
}

pub struct ResourceChecker {
    fetcher: Arc<dyn PageFetcher>,
}

impl ResourceChecker {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn check_all(&self, url: &Url) -> SiteResources {
        let robots_txt = self
            .check_robots_txt(url)
            .await
            .map(|s| s.exists())
            .unwrap_or(false);
        let sitemap = self
            .check_sitemap_xml(url)
            .await
            .map(|s| s.exists())
            .unwrap_or(false);

        SiteResources {
            robots_txt,
            sitemap,
            ssl: self.check_ssl_certificate(url),
        }
    }

    /// Check robots.txt exists
    pub async fn check_robots_txt(&self, base_url: &Url) -> Result<ResourceStatus> {
        tracing::debug!("[RESOURCE] Checking robots.txt for {}", base_url);
        self.check_resource(base_url, "/robots.txt").await
    }

    /// Check sitemap.xml exists
    pub async fn check_sitemap_xml(&self, base_url: &Url) -> Result<ResourceStatus> {
        tracing::debug!("[RESOURCE] Checking sitemap.xml for {}", base_url);
        self.check_resource(base_url, "/sitemap.xml").await
    }

    /// Check SSL certificate (HTTPS)
    pub fn check_ssl_certificate(&self, url: &Url) -> bool {
        url.scheme() == "https"
    }

    async fn check_resource(&self, base_url: &Url, path: &str) -> Result<ResourceStatus> {
        let resource_url = base_url.join(path)?;
        let status = match self.fetcher.probe(&resource_url).await? {
            200 => ResourceStatus::Found(resource_url.to_string()),
            401 | 403 => ResourceStatus::Unauthorized(resource_url.to_string()),
            404 => ResourceStatus::NotFound,
            other => {
                tracing::debug!("[RESOURCE] Unexpected status {} for: {}", other, resource_url);
                ResourceStatus::NotFound
            }
        };
        Ok(status)
    }
}

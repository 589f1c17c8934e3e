use std::sync::Arc;

use scraper::Html;
use url::Url;

use crate::domain::models::{DataSource, KeywordExtraction, KeywordIdea, PageAnalysis};
use crate::error::{AppError, Result};
use crate::extractor::keyword_extractor::{split_meta_keywords, top_phrases, top_terms};
use crate::extractor::page_extractor::PageExtractor;
use crate::io::http_client::{parse_url, PageFetcher};
use crate::service::simulator::Simulator;

pub const MAX_IDEAS: usize = 50;

pub struct KeywordService {
    fetcher: Arc<dyn PageFetcher>,
    simulator: Arc<Simulator>,
    fallback_enabled: bool,
}

impl KeywordService {
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

    /// Keyword ideas around `seed`. There is no live keyword source, so ideas
    /// are always simulated.
    pub async fn research(&self, seed: &str, limit: usize) -> Result<Vec<KeywordIdea>> {
        let seed = normalize_seed(seed);
        if seed.is_empty() {
            return Err(AppError::invalid_input("seed keyword must not be empty"));
        }
        let limit = limit.min(MAX_IDEAS);
        tracing::info!("[KEYWORDS] Researching '{}' (limit {})", seed, limit);

        tokio::time::sleep(self.simulator.latency()).await;
        let mut ideas = self.simulator.keyword_ideas(&seed, limit);
        ideas.dedup_by(|a, b| a.keyword == b.keyword);
        tracing::debug!("[KEYWORDS] Generated {} ideas", ideas.len());
        Ok(ideas)
    }

    /// Keywords a page is about: its meta keywords plus the most frequent
    /// terms and phrases of its visible text.
    pub async fn extract_from_url(&self, url: &str, limit: usize) -> Result<KeywordExtraction> {
        let url = parse_url(url)?;
        tracing::info!("[KEYWORDS] Extracting keywords from {}", url);

        match self.fetcher.fetch_page(&url).await {
            Ok(page) => Ok(Self::extract_from_html(&page.html, &url, limit)),
            Err(e) => {
                let Some(kind) = e.fetch_kind().filter(|_| self.fallback_enabled) else {
                    return Err(e);
                };
                tracing::warn!(
                    "[KEYWORDS] Live fetch of {} failed ({}), using simulated data",
                    url,
                    kind
                );
                tokio::time::sleep(self.simulator.latency()).await;
                let page = self.simulator.page(&url);
                let mut extraction = Self::extract_from_text(&url, &simulated_text(&page), limit);
                extraction.error = Some(kind);
                extraction.source = DataSource::Simulated;
                Ok(extraction)
            }
        }
    }

    pub fn extract_from_html(html: &str, url: &Url, limit: usize) -> KeywordExtraction {
        let document = Html::parse_document(html);
        let mut text = String::new();
        for part in [
            PageExtractor::extract_title(&document),
            PageExtractor::extract_meta_description(&document),
        ]
        .into_iter()
        .flatten()
        {
            text.push_str(&part);
            text.push_str(". ");
        }
        text.push_str(&PageExtractor::extract_body_text(&document));

        let mut extraction = Self::extract_from_text(url, &text, limit);
        extraction.meta_keywords = PageExtractor::extract_meta_keywords(&document)
            .map(|raw| split_meta_keywords(&raw))
            .unwrap_or_default();
        extraction
    }

    fn extract_from_text(url: &Url, text: &str, limit: usize) -> KeywordExtraction {
        KeywordExtraction {
            url: url.to_string(),
            meta_keywords: Vec::new(),
            terms: top_terms(text, limit),
            phrases: top_phrases(text, limit),
            error: None,
            source: DataSource::Live,
        }
    }
}

fn normalize_seed(seed: &str) -> String {
    seed.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn simulated_text(page: &PageAnalysis) -> String {
    let mut parts: Vec<&str> = Vec::new();
    parts.extend(page.title.as_deref());
    parts.extend(page.meta_description.as_deref());
    parts.extend(page.headings.iter().map(|h| h.text.as_str()));
    parts.join(". ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::error::FetchErrorKind;
    use crate::io::http_client::HttpFetcher;

    fn service(fallback: bool) -> KeywordService {
        KeywordService::new(
            Arc::new(HttpFetcher::new(&HttpConfig::default()).unwrap()),
            Arc::new(Simulator::seeded(21)),
            fallback,
        )
    }

    #[tokio::test]
    async fn research_rejects_empty_seed() {
        let err = service(true).research("   ", 10).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn research_normalizes_seed_and_caps_limit() {
        let ideas = service(true).research("  Rust   SEO ", 500).await.unwrap();
        assert_eq!(ideas[0].keyword, "rust seo");
        assert!(ideas.len() <= MAX_IDEAS);
        assert!(ideas.iter().all(|i| i.source == DataSource::Simulated));
        assert!(ideas.iter().all(|i| i.difficulty <= 100));
    }

    #[test]
    fn extract_from_html_reads_meta_and_text() {
        let html = r#"<html><head>
            <title>Rust crawler guide</title>
            <meta name="keywords" content="rust, crawler">
            </head><body>
            <p>A rust crawler walks pages. Every rust crawler needs a queue.</p>
            <script>var crawler = "ignored ignored ignored";</script>
            </body></html>"#;
        let url = Url::parse("https://example.com/").unwrap();
        let extraction = KeywordService::extract_from_html(html, &url, 5);

        assert_eq!(extraction.meta_keywords, vec!["rust", "crawler"]);
        assert_eq!(extraction.terms[0].term, "crawler");
        assert_eq!(extraction.terms[0].occurrences, 3);
        assert!(extraction.terms.iter().all(|t| t.term != "ignored"));
        assert_eq!(extraction.phrases[0].term, "rust crawler");
        assert_eq!(extraction.source, DataSource::Live);
    }

    #[tokio::test]
    async fn extract_falls_back_to_simulation() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/").with_status(451).create_async().await;

        let extraction = service(true).extract_from_url(&server.url(), 10).await.unwrap();
        assert_eq!(extraction.error, Some(FetchErrorKind::Cors));
        assert_eq!(extraction.source, DataSource::Simulated);
        assert!(!extraction.terms.is_empty());
    }

    #[tokio::test]
    async fn extract_without_fallback_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/").with_status(403).create_async().await;

        let err = service(false).extract_from_url(&server.url(), 10).await.unwrap_err();
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::Cors));
    }
}

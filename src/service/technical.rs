//! Technical SEO scoring.
//!
//! The score starts at 100 and every failed check deducts points. The result
//! is clamped to `[0, 100]`.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::models::{clamp_score, PageAnalysis, TechnicalCheck, TechnicalSeoReport};
use crate::error::Result;
use crate::io::http_client::parse_url;
use crate::service::scanner::{LinkCheck, SiteScanner};

const MISSING_TITLE: u8 = 15;
const TITLE_LENGTH: u8 = 5;
const MISSING_DESCRIPTION: u8 = 10;
const DESCRIPTION_LENGTH: u8 = 5;
const MISSING_H1: u8 = 10;
const MULTIPLE_H1: u8 = 5;
const IMAGE_ALT_EACH: u8 = 2;
const IMAGE_ALT_MAX: u8 = 10;
const VERY_SLOW_LOAD: u8 = 15;
const SLOW_LOAD: u8 = 5;
const NO_HTTPS: u8 = 15;
const NO_VIEWPORT: u8 = 10;
const NO_CANONICAL: u8 = 5;
const THIN_CONTENT: u8 = 5;
const NO_STRUCTURED_DATA: u8 = 5;
const NOINDEX: u8 = 20;
const HTTP_ERROR: u8 = 30;

const SLOW_LOAD_MS: u64 = 1500;

pub struct TechnicalSeoService {
    scanner: Arc<SiteScanner>,
}

impl TechnicalSeoService {
    pub fn new(scanner: Arc<SiteScanner>) -> Self {
        Self { scanner }
    }

    /// Score one page. Falls back to simulated page data when the live fetch
    /// fails and fallback is enabled.
    pub async fn analyze(&self, url: &str) -> Result<TechnicalSeoReport> {
        let url = parse_url(url)?;
        tracing::info!("[AUDIT] Technical analysis of {}", url);

        let scan = self.scanner.scan_page(&url, LinkCheck::Skip).await?;
        let checks = Self::evaluate(&scan.page);
        let score = Self::score(&checks);
        tracing::info!(
            "[AUDIT] {} scored {} ({} of {} checks failed)",
            url,
            score,
            checks.iter().filter(|c| !c.passed).count(),
            checks.len()
        );

        Ok(TechnicalSeoReport {
            url: url.to_string(),
            score,
            checks,
            issues: scan.page.issues.clone(),
            source: scan.page.source,
            page: scan.page,
            error: scan.error,
            analyzed_at: Utc::now(),
        })
    }

    pub fn score(checks: &[TechnicalCheck]) -> u8 {
        let deducted: i64 = checks.iter().map(|c| c.deduction as i64).sum();
        clamp_score(100 - deducted)
    }

    /// Run every check against `page`.
    pub fn evaluate(page: &PageAnalysis) -> Vec<TechnicalCheck> {
        let mut checks = Vec::with_capacity(15);

        let title_len = page.title.as_deref().map_or(0, |t| t.chars().count());
        checks.push(check(
            "title",
            "Title tag",
            title_len > 0,
            MISSING_TITLE,
            if title_len > 0 {
                "Title tag present".to_string()
            } else {
                "No title tag".to_string()
            },
        ));
        if title_len > 0 {
            let ok = (PageAnalysis::TITLE_MIN..=PageAnalysis::TITLE_MAX).contains(&title_len);
            checks.push(check(
                "title_length",
                "Title length",
                ok,
                TITLE_LENGTH,
                format!(
                    "{} characters (recommended {}-{})",
                    title_len,
                    PageAnalysis::TITLE_MIN,
                    PageAnalysis::TITLE_MAX
                ),
            ));
        }

        let desc_len = page
            .meta_description
            .as_deref()
            .map_or(0, |d| d.chars().count());
        checks.push(check(
            "meta_description",
            "Meta description",
            desc_len > 0,
            MISSING_DESCRIPTION,
            if desc_len > 0 {
                "Meta description present".to_string()
            } else {
                "No meta description".to_string()
            },
        ));
        if desc_len > 0 {
            let ok = (PageAnalysis::DESC_MIN..=PageAnalysis::DESC_MAX).contains(&desc_len);
            checks.push(check(
                "description_length",
                "Meta description length",
                ok,
                DESCRIPTION_LENGTH,
                format!(
                    "{} characters (recommended {}-{})",
                    desc_len,
                    PageAnalysis::DESC_MIN,
                    PageAnalysis::DESC_MAX
                ),
            ));
        }

        let h1 = page.h1_count();
        checks.push(check("h1", "H1 heading", h1 > 0, MISSING_H1, format!("{} H1 tags", h1)));
        if h1 > 0 {
            checks.push(check(
                "single_h1",
                "Single H1",
                h1 == 1,
                MULTIPLE_H1,
                format!("{} H1 tags", h1),
            ));
        }

        let missing_alt = page.images_without_alt();
        let alt_penalty = (missing_alt.min(u8::MAX as usize) as u8)
            .saturating_mul(IMAGE_ALT_EACH)
            .min(IMAGE_ALT_MAX);
        checks.push(TechnicalCheck {
            key: "image_alt".to_string(),
            label: "Image alt text".to_string(),
            passed: missing_alt == 0,
            deduction: alt_penalty,
            detail: format!("{} of {} images lack alt text", missing_alt, page.images.len()),
        });

        let load_deduction = if page.load_time_ms > PageAnalysis::SLOW_LOAD_MS {
            VERY_SLOW_LOAD
        } else if page.load_time_ms > SLOW_LOAD_MS {
            SLOW_LOAD
        } else {
            0
        };
        checks.push(TechnicalCheck {
            key: "load_time".to_string(),
            label: "Load time".to_string(),
            passed: load_deduction == 0,
            deduction: load_deduction,
            detail: format!("{} ms", page.load_time_ms),
        });

        checks.push(check(
            "https",
            "HTTPS",
            page.is_https,
            NO_HTTPS,
            if page.is_https { "Served over HTTPS" } else { "Served over plain HTTP" }.to_string(),
        ));
        checks.push(check(
            "viewport",
            "Mobile viewport",
            page.has_viewport,
            NO_VIEWPORT,
            if page.has_viewport { "Viewport meta tag present" } else { "No viewport meta tag" }
                .to_string(),
        ));
        checks.push(check(
            "canonical",
            "Canonical URL",
            page.canonical_url.is_some(),
            NO_CANONICAL,
            page.canonical_url
                .clone()
                .unwrap_or_else(|| "No canonical link".to_string()),
        ));
        checks.push(check(
            "content_length",
            "Content length",
            page.word_count >= PageAnalysis::THIN_CONTENT_WORDS,
            THIN_CONTENT,
            format!(
                "{} words (minimum {})",
                page.word_count,
                PageAnalysis::THIN_CONTENT_WORDS
            ),
        ));
        checks.push(check(
            "structured_data",
            "Structured data",
            page.has_structured_data,
            NO_STRUCTURED_DATA,
            if page.has_structured_data { "Structured data found" } else { "No structured data" }
                .to_string(),
        ));
        checks.push(check(
            "indexable",
            "Indexable",
            !page.noindex,
            NOINDEX,
            if page.noindex { "Robots meta contains noindex" } else { "Page can be indexed" }
                .to_string(),
        ));
        checks.push(check(
            "http_status",
            "HTTP status",
            page.status_code < 400,
            HTTP_ERROR,
            format!("Status {}", page.status_code),
        ));

        checks
    }
}

fn check(key: &str, label: &str, passed: bool, penalty: u8, detail: String) -> TechnicalCheck {
    TechnicalCheck {
        key: key.to_string(),
        label: label.to_string(),
        passed,
        deduction: if passed { 0 } else { penalty },
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::domain::models::{DataSource, HeadingElement, ImageElement};
    use crate::error::FetchErrorKind;
    use crate::io::http_client::HttpFetcher;
    use crate::service::simulator::Simulator;

    fn failed(checks: &[TechnicalCheck]) -> Vec<&str> {
        checks.iter().filter(|c| !c.passed).map(|c| c.key.as_str()).collect()
    }

    #[test]
    fn perfect_page_scores_100() {
        let mut page = PageAnalysis::default_test_instance();
        page.canonical_url = Some("https://example.com/".to_string());
        page.has_structured_data = true;

        let checks = TechnicalSeoService::evaluate(&page);
        assert!(failed(&checks).is_empty(), "{:?}", failed(&checks));
        assert_eq!(TechnicalSeoService::score(&checks), 100);
    }

    #[test]
    fn deductions_add_up() {
        let mut page = PageAnalysis::default_test_instance();
        page.canonical_url = Some("https://example.com/".to_string());
        page.has_structured_data = true;
        page.title = Some("Short".to_string());
        page.load_time_ms = 2000;
        page.images = (0..3)
            .map(|i| ImageElement {
                src: format!("https://example.com/{}.png", i),
                alt: None,
            })
            .collect();

        let checks = TechnicalSeoService::evaluate(&page);
        assert_eq!(failed(&checks), vec!["title_length", "image_alt", "load_time"]);
        // 5 + 6 + 5
        assert_eq!(TechnicalSeoService::score(&checks), 84);
    }

    #[test]
    fn image_penalty_is_capped() {
        let mut page = PageAnalysis::default_test_instance();
        page.images = (0..20)
            .map(|i| ImageElement {
                src: format!("{}.png", i),
                alt: Some(String::new()),
            })
            .collect();
        let checks = TechnicalSeoService::evaluate(&page);
        let alt = checks.iter().find(|c| c.key == "image_alt").unwrap();
        assert_eq!(alt.deduction, 10);
    }

    #[test]
    fn missing_title_skips_length_check() {
        let mut page = PageAnalysis::default_test_instance();
        page.title = None;
        page.meta_description = None;
        page.headings = vec![
            HeadingElement { level: 1, text: "A".into() },
            HeadingElement { level: 1, text: "B".into() },
        ];
        let checks = TechnicalSeoService::evaluate(&page);
        let keys: Vec<&str> = checks.iter().map(|c| c.key.as_str()).collect();
        assert!(!keys.contains(&"title_length"));
        assert!(!keys.contains(&"description_length"));
        assert!(failed(&checks).contains(&"single_h1"));
    }

    #[test]
    fn worst_page_is_clamped_to_zero() {
        let mut page = PageAnalysis::empty("http://example.com/");
        page.status_code = 500;
        page.noindex = true;
        page.load_time_ms = 9000;
        let checks = TechnicalSeoService::evaluate(&page);
        assert_eq!(TechnicalSeoService::score(&checks), 0);
    }

    fn service(fallback: bool) -> TechnicalSeoService {
        let fetcher = Arc::new(HttpFetcher::new(&HttpConfig::default()).unwrap());
        TechnicalSeoService::new(Arc::new(SiteScanner::new(
            fetcher,
            Arc::new(Simulator::seeded(3)),
            fallback,
        )))
    }

    #[tokio::test]
    async fn analyze_live_page() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_header("content-type", "text/html")
            .with_body(
                r#"<html><head><title>A reasonably descriptive page title here</title>
                   <meta name="viewport" content="width=device-width"></head>
                   <body><h1>Hello</h1></body></html>"#,
            )
            .create_async()
            .await;

        let report = service(true).analyze(&server.url()).await.unwrap();
        assert_eq!(report.source, DataSource::Live);
        assert!(report.error.is_none());
        let failed = failed(&report.checks);
        assert!(failed.contains(&"https"));
        assert!(failed.contains(&"meta_description"));
        assert!(!failed.contains(&"title_length"));
        assert_eq!(report.score, TechnicalSeoService::score(&report.checks));
    }

    #[tokio::test]
    async fn analyze_falls_back_with_error_kind() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/").with_status(403).create_async().await;

        let report = service(true).analyze(&server.url()).await.unwrap();
        assert_eq!(report.source, DataSource::Simulated);
        assert_eq!(report.error, Some(FetchErrorKind::Cors));
        assert!(report.score <= 100);
    }
}

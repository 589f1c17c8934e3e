//! Rich domain entities - behavior lives WITH data

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CrawlSettings;
use crate::error::FetchErrorKind;

pub type JobId = String;

/// Clamp a points total into the 0-100 score range.
pub fn clamp_score(points: i64) -> u8 {
    points.clamp(0, 100) as u8
}

// ====== Enums ======

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// Where a record's values came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Live,
    Simulated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Critical,
    Warning,
    Suggestion,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSeverity::Critical => "critical",
            IssueSeverity::Warning => "warning",
            IssueSeverity::Suggestion => "suggestion",
        }
    }
}

// ====== Simple Entities ======

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoIssue {
    pub severity: IssueSeverity,
    pub title: String,
    pub description: String,
    pub page_url: String,
    pub element: Option<String>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingElement {
    pub level: u8,
    pub text: String,
}

impl HeadingElement {
    pub fn tag(&self) -> String {
        format!("h{}", self.level)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageElement {
    pub src: String,
    pub alt: Option<String>,
}

impl ImageElement {
    pub fn missing_alt(&self) -> bool {
        self.alt.as_deref().map(|a| a.trim().is_empty()).unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkElement {
    pub href: String,
    pub text: Option<String>,
    pub is_internal: bool,
    /// Populated only when link checking is enabled. `Some(0)` means the
    /// request itself failed.
    pub status_code: Option<u16>,
}

impl LinkElement {
    pub fn is_broken(&self) -> bool {
        self.status_code
            .map(|c| c == 0 || c >= 400)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteResources {
    pub robots_txt: bool,
    pub sitemap: bool,
    pub ssl: bool,
}

// ====== Rich Entity: PageAnalysis ======

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAnalysis {
    pub url: String,
    pub status_code: u16,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub canonical_url: Option<String>,
    pub headings: Vec<HeadingElement>,
    pub word_count: usize,
    pub images: Vec<ImageElement>,
    pub links: Vec<LinkElement>,
    pub load_time_ms: u64,
    pub content_size: usize,
    pub has_viewport: bool,
    pub has_structured_data: bool,
    pub is_https: bool,
    pub noindex: bool,
    pub issues: Vec<SeoIssue>,
    pub source: DataSource,
}

impl PageAnalysis {
    pub const ISSUE_MISSING_TITLE: &'static str = "Missing Title Tag";
    pub const ISSUE_TITLE_TOO_SHORT: &'static str = "Title Too Short";
    pub const ISSUE_TITLE_TOO_LONG: &'static str = "Title Too Long";
    pub const ISSUE_MISSING_DESC: &'static str = "Missing Meta Description";
    pub const ISSUE_DESC_TOO_SHORT: &'static str = "Meta Description Too Short";
    pub const ISSUE_DESC_TOO_LONG: &'static str = "Meta Description Too Long";
    pub const ISSUE_MISSING_H1: &'static str = "Missing H1 Tag";
    pub const ISSUE_MULTIPLE_H1: &'static str = "Multiple H1 Tags";
    pub const ISSUE_THIN_CONTENT: &'static str = "Thin Content";
    pub const ISSUE_IMG_MISSING_ALT: &'static str = "Images Missing Alt Text";
    pub const ISSUE_SLOW_LOAD: &'static str = "Slow Page Load";
    pub const ISSUE_HTTP_ERROR: &'static str = "HTTP Error";
    pub const ISSUE_MISSING_VIEWPORT: &'static str = "Missing Viewport Meta Tag";
    pub const ISSUE_NOINDEX: &'static str = "Page Blocked From Indexing";
    pub const ISSUE_NO_HTTPS: &'static str = "Page Not Served Over HTTPS";
    pub const ISSUE_BROKEN_LINKS: &'static str = "Broken Links";

    pub const TITLE_MIN: usize = 30;
    pub const TITLE_MAX: usize = 60;
    pub const DESC_MIN: usize = 70;
    pub const DESC_MAX: usize = 160;
    pub const THIN_CONTENT_WORDS: usize = 300;
    pub const SLOW_LOAD_MS: u64 = 3000;

    /// An empty record for `url`, to be filled by an extractor or the simulator.
    pub fn empty(url: &str) -> Self {
        Self {
            url: url.to_string(),
            status_code: 0,
            title: None,
            meta_description: None,
            meta_keywords: None,
            canonical_url: None,
            headings: Vec::new(),
            word_count: 0,
            images: Vec::new(),
            links: Vec::new(),
            load_time_ms: 0,
            content_size: 0,
            has_viewport: false,
            has_structured_data: false,
            is_https: url.starts_with("https://"),
            noindex: false,
            issues: Vec::new(),
            source: DataSource::Live,
        }
    }

    pub fn heading_count(&self, level: u8) -> usize {
        self.headings.iter().filter(|h| h.level == level).count()
    }

    pub fn h1_count(&self) -> usize {
        self.heading_count(1)
    }

    pub fn images_without_alt(&self) -> usize {
        self.images.iter().filter(|i| i.missing_alt()).count()
    }

    pub fn internal_link_count(&self) -> usize {
        self.links.iter().filter(|l| l.is_internal).count()
    }

    pub fn external_link_count(&self) -> usize {
        self.links.iter().filter(|l| !l.is_internal).count()
    }

    pub fn broken_links(&self) -> impl Iterator<Item = &LinkElement> {
        self.links.iter().filter(|l| l.is_broken())
    }

    /// Recompute `issues` from the current field values.
    pub fn refresh_issues(&mut self) {
        self.issues = self.generate_issues();
    }

    fn issue(
        &self,
        severity: IssueSeverity,
        title: &str,
        description: String,
        element: Option<&str>,
        recommendation: &str,
    ) -> SeoIssue {
        SeoIssue {
            severity,
            title: title.to_string(),
            description,
            page_url: self.url.clone(),
            element: element.map(str::to_string),
            recommendation: recommendation.to_string(),
        }
    }

    /// Rich behavior: validates itself and generates SEO issues
    pub fn generate_issues(&self) -> Vec<SeoIssue> {
        use IssueSeverity::*;
        let mut issues = Vec::new();

        if self.status_code >= 400 {
            issues.push(self.issue(
                Critical,
                Self::ISSUE_HTTP_ERROR,
                format!("Page returned status code {}", self.status_code),
                None,
                "Fix the HTTP error or redirect the URL to a live page",
            ));
        }

        match self.title.as_deref().map(|t| t.chars().count()) {
            None | Some(0) => issues.push(self.issue(
                Critical,
                Self::ISSUE_MISSING_TITLE,
                "Page has no title tag".to_string(),
                Some("title"),
                "Add a unique, descriptive title tag (30-60 characters)",
            )),
            Some(len) if len < Self::TITLE_MIN => issues.push(self.issue(
                Warning,
                Self::ISSUE_TITLE_TOO_SHORT,
                format!("Title is only {} characters", len),
                Some("title"),
                "Expand title to 30-60 characters with the main keyword",
            )),
            Some(len) if len > Self::TITLE_MAX => issues.push(self.issue(
                Suggestion,
                Self::ISSUE_TITLE_TOO_LONG,
                format!("Title is {} characters", len),
                Some("title"),
                "Shorten title to display fully in search results",
            )),
            Some(_) => {}
        }

        match self.meta_description.as_deref().map(|d| d.chars().count()) {
            None | Some(0) => issues.push(self.issue(
                Warning,
                Self::ISSUE_MISSING_DESC,
                "Page has no meta description".to_string(),
                Some("meta[name=description]"),
                "Add a compelling meta description (70-160 characters)",
            )),
            Some(len) if len < Self::DESC_MIN => issues.push(self.issue(
                Suggestion,
                Self::ISSUE_DESC_TOO_SHORT,
                format!("Meta description is only {} characters", len),
                Some("meta[name=description]"),
                "Expand the description to summarise the page in 70-160 characters",
            )),
            Some(len) if len > Self::DESC_MAX => issues.push(self.issue(
                Suggestion,
                Self::ISSUE_DESC_TOO_LONG,
                format!("Meta description is {} characters", len),
                Some("meta[name=description]"),
                "Trim the description so it is not truncated in search results",
            )),
            Some(_) => {}
        }

        match self.h1_count() {
            0 => issues.push(self.issue(
                Critical,
                Self::ISSUE_MISSING_H1,
                "Page has no H1 heading".to_string(),
                Some("h1"),
                "Add one H1 tag with main keyword near the top",
            )),
            1 => {}
            n => issues.push(self.issue(
                Warning,
                Self::ISSUE_MULTIPLE_H1,
                format!("Page has {} H1 tags", n),
                Some("h1"),
                "Use only one H1 tag per page",
            )),
        }

        if self.word_count < Self::THIN_CONTENT_WORDS {
            issues.push(self.issue(
                Warning,
                Self::ISSUE_THIN_CONTENT,
                format!("Page only has {} words", self.word_count),
                None,
                "Add more comprehensive content (aim for 500+ words)",
            ));
        }

        let missing_alt = self.images_without_alt();
        if missing_alt > 0 {
            issues.push(self.issue(
                Warning,
                Self::ISSUE_IMG_MISSING_ALT,
                format!(
                    "{} of {} images lack alt attribute",
                    missing_alt,
                    self.images.len()
                ),
                Some("img"),
                "Add descriptive alt text for accessibility and SEO",
            ));
        }

        if self.load_time_ms > Self::SLOW_LOAD_MS {
            issues.push(self.issue(
                Warning,
                Self::ISSUE_SLOW_LOAD,
                format!("Page loads in {:.2} seconds", self.load_time_ms as f64 / 1000.0),
                None,
                "Optimize images, enable caching, reduce server response time",
            ));
        }

        if !self.has_viewport {
            issues.push(self.issue(
                Warning,
                Self::ISSUE_MISSING_VIEWPORT,
                "Page has no viewport meta tag".to_string(),
                Some("meta[name=viewport]"),
                "Add <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">",
            ));
        }

        if self.noindex {
            issues.push(self.issue(
                Critical,
                Self::ISSUE_NOINDEX,
                "Robots meta tag contains noindex".to_string(),
                Some("meta[name=robots]"),
                "Remove noindex if this page should appear in search results",
            ));
        }

        if !self.is_https {
            issues.push(self.issue(
                Warning,
                Self::ISSUE_NO_HTTPS,
                "Page is served over plain HTTP".to_string(),
                None,
                "Serve the site over HTTPS and redirect HTTP requests",
            ));
        }

        let broken = self.broken_links().count();
        if broken > 0 {
            issues.push(self.issue(
                Warning,
                Self::ISSUE_BROKEN_LINKS,
                format!("{} links return an error", broken),
                Some("a"),
                "Fix or remove links that point to missing pages",
            ));
        }

        issues
    }

    /// Helper for testing: Creates a valid 'good' page instance to minimize boilerplate in tests
    #[cfg(test)]
    pub fn default_test_instance() -> Self {
        Self {
            url: "https://example.com".into(),
            status_code: 200,
            title: Some("A Perfectly Reasonable Page Title Here".into()),
            meta_description: Some(
                "A meta description that is long enough to describe the page and short enough to fit."
                    .into(),
            ),
            meta_keywords: None,
            canonical_url: Some("https://example.com".into()),
            headings: vec![HeadingElement { level: 1, text: "Welcome".into() }],
            word_count: 500,
            images: vec![ImageElement { src: "a.png".into(), alt: Some("logo".into()) }],
            links: Vec::new(),
            load_time_ms: 500,
            content_size: 1024,
            has_viewport: true,
            has_structured_data: true,
            is_https: true,
            noindex: false,
            issues: Vec::new(),
            source: DataSource::Live,
        }
    }
}

// ====== Crawl jobs ======

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub pages_analyzed: usize,
    pub critical_issues: usize,
    pub warning_issues: usize,
    pub suggestion_issues: usize,
    pub total_issues: usize,
    pub avg_load_time_ms: f64,
    pub total_words: usize,
    pub broken_links: usize,
    pub score: u8,
}

impl CrawlSummary {
    const CRITICAL_PENALTY: i64 = 10;
    const WARNING_PENALTY: i64 = 4;
    const SUGGESTION_PENALTY: i64 = 1;

    pub fn from_pages(pages: &[PageAnalysis], resources: &SiteResources) -> Self {
        let mut summary = Self {
            pages_analyzed: pages.len(),
            ..Default::default()
        };
        if pages.is_empty() {
            return summary;
        }

        let mut page_scores = 0i64;
        for page in pages {
            let mut page_points = 100i64;
            for issue in &page.issues {
                match issue.severity {
                    IssueSeverity::Critical => {
                        summary.critical_issues += 1;
                        page_points -= Self::CRITICAL_PENALTY;
                    }
                    IssueSeverity::Warning => {
                        summary.warning_issues += 1;
                        page_points -= Self::WARNING_PENALTY;
                    }
                    IssueSeverity::Suggestion => {
                        summary.suggestion_issues += 1;
                        page_points -= Self::SUGGESTION_PENALTY;
                    }
                }
            }
            page_scores += page_points.max(0);
            summary.total_words += page.word_count;
            summary.broken_links += page.broken_links().count();
        }

        summary.total_issues =
            summary.critical_issues + summary.warning_issues + summary.suggestion_issues;
        summary.avg_load_time_ms =
            pages.iter().map(|p| p.load_time_ms as f64).sum::<f64>() / pages.len() as f64;

        let mut score = page_scores / pages.len() as i64;
        if !resources.sitemap {
            score -= 5;
        }
        if !resources.robots_txt {
            score -= 5;
        }
        if !resources.ssl {
            score -= 10;
        }
        summary.score = clamp_score(score);
        summary
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlJob {
    pub id: JobId,
    pub url: String,
    pub status: JobStatus,
    pub progress: f64,
    pub settings: CrawlSettings,
    pub pages: Vec<PageAnalysis>,
    pub resources: SiteResources,
    pub summary: Option<CrawlSummary>,
    pub error: Option<FetchErrorKind>,
    pub message: Option<String>,
    pub source: DataSource,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CrawlJob {
    pub fn new(url: &str, settings: CrawlSettings) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            url: url.to_string(),
            status: JobStatus::Queued,
            progress: 0.0,
            settings,
            pages: Vec::new(),
            resources: SiteResources::default(),
            summary: None,
            error: None,
            message: None,
            source: DataSource::Live,
            attempts: 1,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Clear results so the same slot can be re-run.
    pub fn reset_for_retry(&mut self) {
        self.status = JobStatus::Queued;
        self.progress = 0.0;
        self.pages.clear();
        self.resources = SiteResources::default();
        self.summary = None;
        self.error = None;
        self.message = None;
        self.source = DataSource::Live;
        self.attempts += 1;
        self.started_at = None;
        self.completed_at = None;
    }

    /// Progress only moves forward within an attempt.
    pub fn advance(&mut self, progress: f64) {
        let progress = progress.clamp(0.0, 100.0);
        if progress > self.progress {
            self.progress = progress;
        }
    }

    pub fn all_issues(&self) -> impl Iterator<Item = &SeoIssue> {
        self.pages.iter().flat_map(|p| p.issues.iter())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobProgress {
    pub job_id: JobId,
    pub url: String,
    pub status: JobStatus,
    pub progress: f64,
    pub analyzed_pages: usize,
    pub max_pages: usize,
    pub error: Option<FetchErrorKind>,
}

impl From<&CrawlJob> for JobProgress {
    fn from(job: &CrawlJob) -> Self {
        Self {
            job_id: job.id.clone(),
            url: job.url.clone(),
            status: job.status,
            progress: job.progress,
            analyzed_pages: job.pages.len(),
            max_pages: job.settings.max_pages,
            error: job.error,
        }
    }
}

// ====== Keywords ======

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchIntent {
    Informational,
    Commercial,
    Transactional,
    Navigational,
}

impl SearchIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchIntent::Informational => "informational",
            SearchIntent::Commercial => "commercial",
            SearchIntent::Transactional => "transactional",
            SearchIntent::Navigational => "navigational",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Competition {
    Low,
    Medium,
    High,
}

impl Competition {
    pub fn from_difficulty(difficulty: u8) -> Self {
        match difficulty {
            0..=33 => Competition::Low,
            34..=66 => Competition::Medium,
            _ => Competition::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Competition::Low => "low",
            Competition::Medium => "medium",
            Competition::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordIdea {
    pub keyword: String,
    pub search_volume: u32,
    pub difficulty: u8,
    pub cpc: f64,
    pub competition: Competition,
    pub intent: SearchIntent,
    /// Twelve monthly relative volumes, oldest first.
    pub trend: Vec<u32>,
    pub source: DataSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordDensity {
    pub term: String,
    pub occurrences: usize,
    /// Percentage of all counted words.
    pub density: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordExtraction {
    pub url: String,
    pub meta_keywords: Vec<String>,
    pub terms: Vec<KeywordDensity>,
    pub phrases: Vec<KeywordDensity>,
    pub error: Option<FetchErrorKind>,
    pub source: DataSource,
}

// ====== Rank tracking ======

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankCheck {
    pub position: Option<u8>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRanking {
    pub keyword: String,
    pub domain: String,
    /// 1-100, or `None` when the domain is not in the top 100.
    pub position: Option<u8>,
    pub previous_position: Option<u8>,
    pub best_position: Option<u8>,
    pub url: Option<String>,
    pub search_volume: u32,
    pub history: Vec<RankCheck>,
    pub checked_at: DateTime<Utc>,
    pub source: DataSource,
}

impl KeywordRanking {
    pub const MAX_HISTORY: usize = 30;

    /// Positions gained since the previous check (positive = improved).
    pub fn change(&self) -> Option<i32> {
        match (self.previous_position, self.position) {
            (Some(prev), Some(cur)) => Some(prev as i32 - cur as i32),
            _ => None,
        }
    }

    /// Record a new check, keeping the history bounded.
    pub fn record(&mut self, position: Option<u8>, checked_at: DateTime<Utc>) {
        self.previous_position = self.position;
        self.position = position;
        self.checked_at = checked_at;
        if let Some(pos) = position {
            self.best_position = Some(self.best_position.map_or(pos, |best| best.min(pos)));
        }
        self.history.push(RankCheck {
            position,
            checked_at,
        });
        if self.history.len() > Self::MAX_HISTORY {
            let overflow = self.history.len() - Self::MAX_HISTORY;
            self.history.drain(..overflow);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingSummary {
    pub domain: String,
    pub tracked: usize,
    pub average_position: Option<f64>,
    pub top_3: usize,
    pub top_10: usize,
    pub top_100: usize,
    pub improved: usize,
    pub declined: usize,
}

impl RankingSummary {
    pub fn from_rankings(domain: &str, rankings: &[KeywordRanking]) -> Self {
        let positions: Vec<u8> = rankings.iter().filter_map(|r| r.position).collect();
        let average_position = if positions.is_empty() {
            None
        } else {
            Some(positions.iter().map(|&p| p as f64).sum::<f64>() / positions.len() as f64)
        };

        Self {
            domain: domain.to_string(),
            tracked: rankings.len(),
            average_position,
            top_3: positions.iter().filter(|&&p| p <= 3).count(),
            top_10: positions.iter().filter(|&&p| p <= 10).count(),
            top_100: positions.len(),
            improved: rankings.iter().filter(|r| r.change().is_some_and(|c| c > 0)).count(),
            declined: rankings.iter().filter(|r| r.change().is_some_and(|c| c < 0)).count(),
        }
    }
}

// ====== Technical SEO ======

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalCheck {
    pub key: String,
    pub label: String,
    pub passed: bool,
    pub deduction: u8,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalSeoReport {
    pub url: String,
    pub score: u8,
    pub checks: Vec<TechnicalCheck>,
    pub issues: Vec<SeoIssue>,
    pub page: PageAnalysis,
    pub error: Option<FetchErrorKind>,
    pub source: DataSource,
    pub analyzed_at: DateTime<Utc>,
}

//! Site reports: crawl + technical analysis + rankings in one record.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CrawlSettings;
use crate::domain::models::{
    CrawlSummary, DataSource, IssueSeverity, KeywordRanking, PageAnalysis, RankingSummary,
    SeoIssue, TechnicalSeoReport,
};
use crate::error::{AppError, FetchErrorKind, Result};
use crate::service::crawler::CrawlerService;
use crate::service::rank_tracker::{normalize_domain, RankTracker};
use crate::service::technical::TechnicalSeoService;

const TOP_ISSUES: usize = 10;

/// Occurrences of one issue title across the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueGroup {
    pub title: String,
    pub severity: IssueSeverity,
    pub count: usize,
    pub pages: Vec<String>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteReport {
    pub url: String,
    pub domain: String,
    pub score: u8,
    pub crawl: CrawlSummary,
    pub technical_score: u8,
    pub critical_issues: usize,
    pub warning_issues: usize,
    pub suggestion_issues: usize,
    pub total_issues: usize,
    pub top_issues: Vec<IssueGroup>,
    pub issues: Vec<SeoIssue>,
    pub pages: Vec<PageAnalysis>,
    pub technical: TechnicalSeoReport,
    pub rankings: Vec<KeywordRanking>,
    pub ranking_summary: RankingSummary,
    pub source: DataSource,
    pub error: Option<FetchErrorKind>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Csv,
}

impl FromStr for ReportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(AppError::invalid_input(format!(
                "unknown report format '{}' (expected json or csv)",
                other
            ))),
        }
    }
}

pub struct ReportService {
    crawler: Arc<CrawlerService>,
    technical: Arc<TechnicalSeoService>,
    rank_tracker: Arc<RankTracker>,
}

impl ReportService {
    pub fn new(
        crawler: Arc<CrawlerService>,
        technical: Arc<TechnicalSeoService>,
        rank_tracker: Arc<RankTracker>,
    ) -> Self {
        Self {
            crawler,
            technical,
            rank_tracker,
        }
    }

    pub async fn build(&self, url: &str, settings: CrawlSettings) -> Result<SiteReport> {
        let domain = normalize_domain(url)?;
        tracing::info!("[REPORT] Building report for {}", url);

        let job = self.crawler.crawl(url, settings).await?;
        if let Some(message) = job.message.as_ref().filter(|_| job.pages.is_empty()) {
            return Err(AppError::fetch(
                job.error.unwrap_or(FetchErrorKind::Network),
                message.clone(),
            ));
        }
        let technical = self.technical.analyze(&job.url).await?;
        let rankings = self.rank_tracker.rankings(&domain)?;

        let crawl = job
            .summary
            .clone()
            .unwrap_or_else(|| CrawlSummary::from_pages(&job.pages, &job.resources));
        let issues: Vec<SeoIssue> = job.all_issues().cloned().collect();
        let source = if job.source == DataSource::Simulated || technical.source == DataSource::Simulated
        {
            DataSource::Simulated
        } else {
            DataSource::Live
        };

        let report = SiteReport {
            url: job.url.clone(),
            score: ((crawl.score as u16 + technical.score as u16 + 1) / 2) as u8,
            technical_score: technical.score,
            critical_issues: crawl.critical_issues,
            warning_issues: crawl.warning_issues,
            suggestion_issues: crawl.suggestion_issues,
            total_issues: crawl.total_issues,
            top_issues: group_issues(&issues, TOP_ISSUES),
            ranking_summary: RankingSummary::from_rankings(&domain, &rankings),
            error: job.error.or(technical.error),
            generated_at: Utc::now(),
            pages: job.pages,
            domain,
            crawl,
            issues,
            technical,
            rankings,
            source,
        };
        tracing::info!(
            "[REPORT] {} scored {} with {} issues",
            report.url,
            report.score,
            report.total_issues
        );
        Ok(report)
    }
}

/// Group issues by title, most frequent first, then by severity.
pub fn group_issues(issues: &[SeoIssue], limit: usize) -> Vec<IssueGroup> {
    let mut groups: HashMap<&str, IssueGroup> = HashMap::new();
    for issue in issues {
        let group = groups.entry(issue.title.as_str()).or_insert_with(|| IssueGroup {
            title: issue.title.clone(),
            severity: issue.severity,
            count: 0,
            pages: Vec::new(),
            recommendation: issue.recommendation.clone(),
        });
        group.count += 1;
        if !group.pages.contains(&issue.page_url) {
            group.pages.push(issue.page_url.clone());
        }
    }

    let mut groups: Vec<IssueGroup> = groups.into_values().collect();
    groups.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.severity.cmp(&b.severity))
            .then_with(|| a.title.cmp(&b.title))
    });
    groups.truncate(limit);
    groups
}

pub fn export(report: &SiteReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| AppError::Other(anyhow::anyhow!("failed to serialise report: {}", e))),
        ReportFormat::Csv => Ok(issues_csv(&report.issues)),
    }
}

/// Issues table as RFC 4180 CSV.
pub fn issues_csv(issues: &[SeoIssue]) -> String {
    let mut out = String::from("severity,title,page_url,element,description,recommendation\n");
    for issue in issues {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{}",
            issue.severity.as_str(),
            csv_field(&issue.title),
            csv_field(&issue.page_url),
            csv_field(issue.element.as_deref().unwrap_or("")),
            csv_field(&issue.description),
            csv_field(&issue.recommendation),
        );
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::io::http_client::{HttpFetcher, PageFetcher};
    use crate::repository::{InMemoryJobRepository, InMemoryRankingRepository};
    use crate::service::job_canceler::JobCanceler;
    use crate::service::scanner::SiteScanner;
    use crate::service::simulator::Simulator;

    fn issue(severity: IssueSeverity, title: &str, page: &str) -> SeoIssue {
        SeoIssue {
            severity,
            title: title.to_string(),
            description: "desc".to_string(),
            page_url: page.to_string(),
            element: None,
            recommendation: "fix it".to_string(),
        }
    }

    #[test]
    fn issues_are_grouped_by_frequency() {
        let issues = vec![
            issue(IssueSeverity::Warning, "Thin Content", "/a"),
            issue(IssueSeverity::Critical, "Missing H1 Tag", "/a"),
            issue(IssueSeverity::Warning, "Thin Content", "/b"),
            issue(IssueSeverity::Critical, "Missing Title Tag", "/c"),
        ];
        let groups = group_issues(&issues, 2);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].title, "Thin Content");
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].pages, vec!["/a", "/b"]);
        assert_eq!(groups[1].title, "Missing H1 Tag");
    }

    #[test]
    fn csv_escapes_fields() {
        let mut tricky = issue(IssueSeverity::Suggestion, "Title, \"quoted\"", "/a");
        tricky.element = Some("meta[name=description]".to_string());
        let csv = issues_csv(&[tricky]);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("severity,title,page_url,element,description,recommendation")
        );
        assert_eq!(
            lines.next(),
            Some("suggestion,\"Title, \"\"quoted\"\"\",/a,meta[name=description],desc,fix it")
        );
    }

    #[test]
    fn report_format_parses() {
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!(" csv".parse::<ReportFormat>().unwrap(), ReportFormat::Csv);
        assert!("xml".parse::<ReportFormat>().is_err());
    }

    #[tokio::test]
    async fn simulated_report_is_consistent() {
        let fetcher: Arc<dyn PageFetcher> =
            Arc::new(HttpFetcher::new(&HttpConfig::default()).unwrap());
        let simulator = Arc::new(Simulator::seeded(8));
        let scanner = Arc::new(SiteScanner::new(fetcher.clone(), simulator.clone(), true));
        let crawler = Arc::new(CrawlerService::new(
            Arc::new(InMemoryJobRepository::new()),
            Arc::new(JobCanceler::new()),
            fetcher,
            scanner.clone(),
            simulator.clone(),
        ));
        let tracker = Arc::new(RankTracker::new(
            Arc::new(InMemoryRankingRepository::new()),
            simulator,
        ));
        tracker
            .track("127.0.0.1", &["local seo".to_string()])
            .unwrap();
        let service = ReportService::new(
            crawler,
            Arc::new(TechnicalSeoService::new(scanner)),
            tracker,
        );

        let settings = CrawlSettings {
            max_pages: 4,
            delay_between_requests_ms: 0,
            ..CrawlSettings::default()
        };
        let report = service.build("http://127.0.0.1:9/", settings).await.unwrap();

        assert_eq!(report.source, DataSource::Simulated);
        assert_eq!(report.error, Some(FetchErrorKind::Network));
        assert!(report.score <= 100);
        assert_eq!(report.total_issues, report.issues.len());
        assert_eq!(report.rankings.len(), 1);
        assert_eq!(report.ranking_summary.tracked, 1);

        let csv = export(&report, ReportFormat::Csv).unwrap();
        assert_eq!(csv.lines().count(), report.issues.len() + 1);
        let json: serde_json::Value =
            serde_json::from_str(&export(&report, ReportFormat::Json).unwrap()).unwrap();
        assert_eq!(json["error"], "network");
        assert_eq!(json["source"], "simulated");
    }
}

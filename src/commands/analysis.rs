use serde::{Deserialize, Serialize};

use crate::config::CrawlSettings;
use crate::domain::models::{CrawlJob, JobProgress, JobStatus, TechnicalSeoReport};
use crate::error::CommandError;
use crate::io::http_client::parse_url;
use crate::lifecycle::AppState;
use crate::service::scanner::{LinkCheck, PageScan};

#[derive(Debug, Serialize)]
pub struct AnalysisJobResponse {
    pub job_id: String,
    pub url: String,
    pub status: JobStatus,
}

/// Crawl settings sent by the dashboard. Missing fields take the
/// configured defaults.
#[derive(Debug, Default, Deserialize)]
pub struct AnalysisSettingsRequest {
    pub max_pages: Option<usize>,
    pub include_external_links: Option<bool>,
    pub check_links: Option<bool>,
    pub delay_between_requests: Option<u64>,
}

impl AnalysisSettingsRequest {
    pub fn apply(self, defaults: &CrawlSettings) -> CrawlSettings {
        CrawlSettings {
            max_pages: self.max_pages.unwrap_or(defaults.max_pages),
            include_external_links: self
                .include_external_links
                .unwrap_or(defaults.include_external_links),
            check_links: self.check_links.unwrap_or(defaults.check_links),
            delay_between_requests_ms: self
                .delay_between_requests
                .unwrap_or(defaults.delay_between_requests_ms),
        }
    }
}

pub async fn start_analysis(
    state: &AppState,
    url: String,
    settings: Option<AnalysisSettingsRequest>,
) -> Result<AnalysisJobResponse, CommandError> {
    tracing::info!("Starting analysis: {}", url);
    let settings = settings.unwrap_or_default().apply(&state.config.crawl);
    tracing::debug!("Settings: {:?}", settings);

    let job_id = state.crawler.start_crawl(&url, settings)?;
    let job = state.crawler.get_job(&job_id)?;

    Ok(AnalysisJobResponse {
        job_id,
        url: job.url,
        status: job.status,
    })
}

pub async fn get_analysis_progress(
    state: &AppState,
    job_id: String,
) -> Result<JobProgress, CommandError> {
    tracing::debug!("Getting analysis progress for job: {}", job_id);
    let job = state.crawler.get_job(&job_id)?;
    Ok(JobProgress::from(&job))
}

pub async fn get_all_jobs(state: &AppState) -> Result<Vec<JobProgress>, CommandError> {
    tracing::debug!("Fetching all analysis jobs");
    Ok(state.crawler.list_jobs().iter().map(JobProgress::from).collect())
}

pub async fn cancel_analysis(state: &AppState, job_id: String) -> Result<(), CommandError> {
    tracing::info!("Cancelling analysis job: {}", job_id);
    state.crawler.cancel(&job_id)?;
    Ok(())
}

pub async fn retry_analysis(state: &AppState, job_id: String) -> Result<(), CommandError> {
    tracing::info!("Retrying analysis job: {}", job_id);
    state.crawler.retry(&job_id)?;
    Ok(())
}

pub async fn delete_analysis(state: &AppState, job_id: String) -> Result<(), CommandError> {
    state.crawler.delete(&job_id)?;
    Ok(())
}

pub async fn get_result(state: &AppState, job_id: String) -> Result<CrawlJob, CommandError> {
    Ok(state.crawler.get_job(&job_id)?)
}

pub async fn analyze_technical(
    state: &AppState,
    url: String,
) -> Result<TechnicalSeoReport, CommandError> {
    Ok(state.technical.analyze(&url).await?)
}

/// Scan one page, optionally checking the status of its links.
pub async fn inspect_page(
    state: &AppState,
    url: String,
    check_links: bool,
    include_external: bool,
) -> Result<PageScan, CommandError> {
    let url = parse_url(&url)?;
    let links = match (check_links, include_external) {
        (false, _) => LinkCheck::Skip,
        (true, false) => LinkCheck::Internal,
        (true, true) => LinkCheck::All,
    };
    Ok(state.scanner.scan_page(&url, links).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn request_fills_missing_fields_from_defaults() {
        let defaults = CrawlSettings::default();
        let settings = AnalysisSettingsRequest {
            max_pages: Some(3),
            check_links: Some(true),
            ..Default::default()
        }
        .apply(&defaults);

        assert_eq!(settings.max_pages, 3);
        assert!(settings.check_links);
        assert_eq!(settings.delay_between_requests_ms, defaults.delay_between_requests_ms);
        assert_eq!(settings.include_external_links, defaults.include_external_links);
    }

    #[tokio::test]
    async fn unknown_job_is_reported_as_message() {
        let state = AppState::new(AppConfig::default()).unwrap();
        let err = get_analysis_progress(&state, "missing".to_string())
            .await
            .unwrap_err();
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!("Job not found: missing")
        );
    }
}

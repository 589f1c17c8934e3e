//! Application lifecycle: logging, service wiring and shutdown.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::io::http_client::{HttpFetcher, PageFetcher};
use crate::repository::{InMemoryJobRepository, InMemoryRankingRepository};
use crate::service::{
    CrawlerService, JobCanceler, KeywordService, RankTracker, ReportService, SiteScanner,
    Simulator, TechnicalSeoService,
};

/// Every service the dashboard pages talk to.
pub struct AppState {
    pub config: AppConfig,
    pub crawler: Arc<CrawlerService>,
    pub technical: Arc<TechnicalSeoService>,
    pub keywords: Arc<KeywordService>,
    pub rank_tracker: Arc<RankTracker>,
    pub reports: Arc<ReportService>,
    pub scanner: Arc<SiteScanner>,
    canceler: Arc<JobCanceler>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(&config.http)?);
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Wire the services around a given fetcher.
    pub fn with_fetcher(config: AppConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        let fallback = config.simulation.fallback_enabled;
        let simulator = Arc::new(Simulator::new(&config.simulation));
        let canceler = Arc::new(JobCanceler::new());
        let scanner = Arc::new(SiteScanner::new(fetcher.clone(), simulator.clone(), fallback));

        let crawler = Arc::new(CrawlerService::new(
            Arc::new(InMemoryJobRepository::new()),
            canceler.clone(),
            fetcher.clone(),
            scanner.clone(),
            simulator.clone(),
        ));
        let technical = Arc::new(TechnicalSeoService::new(scanner.clone()));
        let keywords = Arc::new(KeywordService::new(fetcher, simulator.clone(), fallback));
        let rank_tracker = Arc::new(RankTracker::new(
            Arc::new(InMemoryRankingRepository::new()),
            simulator,
        ));
        let reports = Arc::new(ReportService::new(
            crawler.clone(),
            technical.clone(),
            rank_tracker.clone(),
        ));

        tracing::debug!(
            "Services ready (fallback: {}, seed: {:?})",
            fallback,
            config.simulation.seed
        );
        Self {
            config,
            crawler,
            technical,
            keywords,
            rank_tracker,
            reports,
            scanner,
            canceler,
        }
    }
}

/// Initialize logging with tracing_subscriber.
pub fn init_logging(verbose: bool) {
    let crate_level = if verbose { "seo_dashboard=debug" } else { "seo_dashboard=info" };
    let mut filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("reqwest=warn".parse().unwrap());
    if let Ok(directive) = crate_level.parse() {
        filter = filter.add_directive(directive);
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .with_target(false)
        .try_init();
}

/// Stop every unfinished crawl job.
pub fn shutdown(state: &AppState) {
    let cancelled = state.crawler.cancel_all();
    let signalled = state.canceler.cancel_all();
    tracing::info!(
        "Shutting down: {} jobs cancelled, {} flags raised",
        cancelled,
        signalled
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlSettings;
    use crate::domain::models::JobStatus;

    #[tokio::test]
    async fn shutdown_cancels_queued_jobs() {
        let mut config = AppConfig::default();
        config.simulation.seed = Some(1);
        let state = AppState::new(config).unwrap();

        // Nothing awaits before shutdown, so the spawned job is still queued
        let id = state
            .crawler
            .start_crawl("https://example.invalid/", CrawlSettings::default())
            .unwrap();
        shutdown(&state);

        let job = state.crawler.get_job(&id).unwrap();
        assert_eq!(job.status, JobStatus::Cancelled);
    }
}

//! Crawl job orchestration.
//!
//! Jobs live in a `JobRepository` for the lifetime of the process. Each job
//! runs as its own tokio task: resource checks, discovery, per-page scanning,
//! then summary. Cancellation is cooperative through `JobCanceler`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::time::sleep;
use url::Url;

use crate::config::CrawlSettings;
use crate::domain::models::{
    CrawlJob, CrawlSummary, DataSource, JobId, JobStatus, PageAnalysis, SiteResources,
};
use crate::error::{AppError, Result};
use crate::io::http_client::{parse_url, PageFetcher};
use crate::repository::JobRepository;
use crate::service::discovery::{PageDiscovery, ResourceChecker};
use crate::service::job_canceler::JobCanceler;
use crate::service::scanner::{LinkCheck, SiteScanner};
use crate::service::simulator::Simulator;

/// Share of the progress bar given to resource checks and discovery.
const RESOURCES_PROGRESS: f64 = 5.0;
const DISCOVERY_PROGRESS: f64 = 30.0;

pub struct CrawlerService {
    jobs: Arc<dyn JobRepository>,
    canceler: Arc<JobCanceler>,
    discovery: PageDiscovery,
    resource_checker: ResourceChecker,
    scanner: Arc<SiteScanner>,
    simulator: Arc<Simulator>,
}

impl CrawlerService {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        canceler: Arc<JobCanceler>,
        fetcher: Arc<dyn PageFetcher>,
        scanner: Arc<SiteScanner>,
        simulator: Arc<Simulator>,
    ) -> Self {
        Self {
            jobs,
            canceler,
            discovery: PageDiscovery::new(fetcher.clone()),
            resource_checker: ResourceChecker::new(fetcher),
            scanner,
            simulator,
        }
    }

    /// Queue a crawl and run it in the background.
    pub fn start_crawl(self: &Arc<Self>, url: &str, settings: CrawlSettings) -> Result<JobId> {
        let job = self.create_job(url, settings)?;
        let job_id = job.id.clone();
        tracing::info!("[CRAWL] Queued job {} for {}", job_id, job.url);
        self.spawn(job_id.clone());
        Ok(job_id)
    }

    /// Crawl `url` and wait for the result.
    pub async fn crawl(&self, url: &str, settings: CrawlSettings) -> Result<CrawlJob> {
        let job = self.create_job(url, settings)?;
        self.run(&job.id).await?;
        self.finished_job(&job.id)
    }

    /// A finished job, or `Cancelled` when it was stopped before completing.
    fn finished_job(&self, job_id: &str) -> Result<CrawlJob> {
        let job = self.get_job(job_id)?;
        if job.status == JobStatus::Cancelled {
            return Err(AppError::Cancelled);
        }
        Ok(job)
    }

    fn create_job(&self, url: &str, settings: CrawlSettings) -> Result<CrawlJob> {
        settings.validate()?;
        let url = parse_url(url)?;
        let job = CrawlJob::new(url.as_str(), settings);
        self.jobs.insert(job.clone());
        Ok(job)
    }

    fn spawn(self: &Arc<Self>, job_id: JobId) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = this.run(&job_id).await {
                tracing::error!("[CRAWL] Job {} failed: {}", job_id, e);
            }
        });
    }

    pub fn get_job(&self, job_id: &str) -> Result<CrawlJob> {
        self.jobs
            .get(job_id)
            .ok_or_else(|| AppError::JobNotFound(job_id.to_string()))
    }

    /// Every job, newest first.
    pub fn list_jobs(&self) -> Vec<CrawlJob> {
        self.jobs.list()
    }

    /// Ask a job to stop. Queued jobs are cancelled at once; running jobs stop
    /// before their next page. Finished jobs are left alone.
    pub fn cancel(&self, job_id: &str) -> Result<()> {
        let job = self.get_job(job_id)?;
        if job.status.is_terminal() {
            tracing::debug!("[CRAWL] Job {} already {}", job_id, job.status.as_str());
            return Ok(());
        }

        self.jobs.update(job_id, &mut |job| {
            if job.status == JobStatus::Queued {
                job.status = JobStatus::Cancelled;
                job.completed_at = Some(Utc::now());
            }
        })?;
        self.canceler.cancel(job_id);
        tracing::info!("[CRAWL] Cancellation requested for job {}", job_id);
        Ok(())
    }

    /// Re-run a finished job in the same slot.
    pub fn retry(self: &Arc<Self>, job_id: &str) -> Result<()> {
        let job = self.get_job(job_id)?;
        if !job.status.is_terminal() {
            return Err(AppError::invalid_input(format!(
                "job {} is still {}",
                job_id,
                job.status.as_str()
            )));
        }

        self.jobs.update(job_id, &mut |job| job.reset_for_retry())?;
        tracing::info!(
            "[CRAWL] Retrying job {} (attempt {})",
            job_id,
            job.attempts + 1
        );
        self.spawn(job_id.to_string());
        Ok(())
    }

    pub fn delete(&self, job_id: &str) -> Result<()> {
        self.canceler.cancel(job_id);
        self.jobs
            .remove(job_id)
            .ok_or_else(|| AppError::JobNotFound(job_id.to_string()))?;
        tracing::info!("[CRAWL] Deleted job {}", job_id);
        Ok(())
    }

    /// Poll until the job reaches a terminal state.
    pub async fn wait_for(&self, job_id: &str, poll: Duration) -> Result<CrawlJob> {
        loop {
            let job = self.get_job(job_id)?;
            if job.status.is_terminal() {
                return Ok(job);
            }
            sleep(poll).await;
        }
    }

    /// Cancel every unfinished job. Returns how many were signalled.
    pub fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        for job in self.jobs.list() {
            if !job.status.is_terminal() && self.cancel(&job.id).is_ok() {
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Run the crawl pipeline for a queued job.
    ///
    /// The job is claimed and its cancel flag registered in one repository
    /// update, so only one task runs a given attempt.
    pub async fn run(&self, job_id: &str) -> Result<()> {
        let mut cancel_flag: Option<Arc<AtomicBool>> = None;
        self.jobs.update(job_id, &mut |job| {
            if job.status == JobStatus::Queued {
                job.status = JobStatus::Running;
                job.started_at = Some(Utc::now());
                cancel_flag = Some(self.canceler.register(job_id));
            }
        })?;
        let Some(cancel_flag) = cancel_flag else {
            tracing::debug!("[CRAWL] Job {} is not queued, not running", job_id);
            return Ok(());
        };

        let job = self.get_job(job_id)?;
        let result = self.run_attempt(job_id, &job, cancel_flag.as_ref()).await;
        self.canceler.release(job_id, &cancel_flag);
        result
    }

    async fn run_attempt(&self, job_id: &str, job: &CrawlJob, cancel_flag: &AtomicBool) -> Result<()> {
        let started = Instant::now();
        let settings = job.settings.clone();
        let start_url = parse_url(&job.url)?;
        tracing::info!("[CRAWL] [STAGE 1/4] Starting job {} for {}", job_id, start_url);

        tracing::info!("[CRAWL] [STAGE 2/4] Checking robots.txt, sitemap.xml and SSL");
        let resources = self.resource_checker.check_all(&start_url).await;
        tracing::debug!("[CRAWL] Job {} resources: {:?}", job_id, resources);
        self.jobs.update(job_id, &mut |job| {
            job.resources = resources.clone();
            job.advance(RESOURCES_PROGRESS);
        })?;

        tracing::info!("[CRAWL] [STAGE 3/4] Discovering pages (max {})", settings.max_pages);
        let delay = Duration::from_millis(settings.delay_between_requests_ms);
        let max_pages = settings.max_pages;
        let discovered = self
            .discovery
            .discover(&start_url, max_pages, delay, cancel_flag, |count| {
                let progress = RESOURCES_PROGRESS
                    + (DISCOVERY_PROGRESS - RESOURCES_PROGRESS) * count as f64 / max_pages as f64;
                let _ = self.jobs.update(job_id, &mut |job| job.advance(progress));
            })
            .await;

        let discovered = match discovered {
            Ok(discovered) => discovered,
            Err(e) => return self.finish_unreachable(job_id, &start_url, &settings, e).await,
        };

        tracing::info!(
            "[CRAWL] [STAGE 4/4] Analysing {} pages",
            discovered.urls.len()
        );
        let links = LinkCheck::from_settings(&settings);
        let total = discovered.urls.len().max(1);
        let mut start_page = discovered.start_page;

        for (index, url) in discovered.urls.iter().enumerate() {
            if cancel_flag.load(Ordering::Relaxed) {
                tracing::warn!("[CRAWL] Job {} cancelled after {} pages", job_id, index);
                break;
            }
            if index > 0 && !delay.is_zero() {
                sleep(delay).await;
            }

            let page = match start_page.take().filter(|_| index == 0) {
                Some(fetched) => Some(self.scanner.analyze_fetched(&fetched, links).await),
                None => match self.scanner.scan_page(url, links).await {
                    Ok(scan) if scan.error.is_none() => Some(scan.page),
                    Ok(scan) => {
                        tracing::warn!("[CRAWL] Skipping {} ({:?})", url, scan.error);
                        None
                    }
                    Err(e) => {
                        tracing::warn!("[CRAWL] Skipping {}: {}", url, e);
                        None
                    }
                },
            };

            let progress = DISCOVERY_PROGRESS
                + (100.0 - DISCOVERY_PROGRESS) * (index + 1) as f64 / total as f64;
            let mut page = page;
            self.jobs.update(job_id, &mut |job| {
                if let Some(page) = page.take() {
                    job.pages.push(page);
                }
                job.advance(progress);
            })?;
        }

        let cancelled = cancel_flag.load(Ordering::Relaxed);
        self.finish(job_id, cancelled)?;
        tracing::info!(
            "[CRAWL] Job {} {} in {:?}",
            job_id,
            if cancelled { "cancelled" } else { "completed" },
            started.elapsed()
        );
        Ok(())
    }

    /// The start page could not be fetched: fill the job with simulated
    /// pages, or fail it when fallback is disabled.
    async fn finish_unreachable(
        &self,
        job_id: &str,
        start_url: &Url,
        settings: &CrawlSettings,
        error: AppError,
    ) -> Result<()> {
        let kind = error.fetch_kind();
        let message = error.to_string();

        let Some(kind) = kind.filter(|_| self.scanner.fallback_enabled()) else {
            tracing::error!("[CRAWL] Job {} failed: {}", job_id, message);
            self.jobs.update(job_id, &mut |job| {
                job.status = JobStatus::Failed;
                job.error = kind;
                job.message = Some(message.clone());
                job.completed_at = Some(Utc::now());
            })?;
            return Ok(());
        };

        tracing::warn!(
            "[CRAWL] Start page unreachable ({}), generating simulated results: {}",
            kind,
            message
        );
        sleep(self.simulator.latency()).await;
        let count = self.simulator.site_size(settings.max_pages);
        let pages: Vec<PageAnalysis> = self.simulator.site(start_url, count);
        let resources = SiteResources {
            ssl: start_url.scheme() == "https",
            ..SiteResources::default()
        };
        let summary = CrawlSummary::from_pages(&pages, &resources);
        let mut pages = Some(pages);

        self.jobs.update(job_id, &mut |job| {
            job.pages = pages.take().unwrap_or_default();
            job.resources = resources.clone();
            job.summary = Some(summary.clone());
            job.error = Some(kind);
            job.message = Some(message.clone());
            job.source = DataSource::Simulated;
            job.status = JobStatus::Completed;
            job.advance(100.0);
            job.completed_at = Some(Utc::now());
        })
    }

    fn finish(&self, job_id: &str, cancelled: bool) -> Result<()> {
        self.jobs.update(job_id, &mut |job| {
            job.summary = Some(CrawlSummary::from_pages(&job.pages, &job.resources));
            if cancelled {
                job.status = JobStatus::Cancelled;
            } else {
                job.status = JobStatus::Completed;
                job.advance(100.0);
            }
            job.completed_at = Some(Utc::now());
        })
    }
}

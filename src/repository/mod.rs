pub mod memory;

use crate::domain::models::{CrawlJob, KeywordRanking};
use crate::error::Result;

pub use memory::{InMemoryJobRepository, InMemoryRankingRepository};

/// Crawl jobs keyed by id.
pub trait JobRepository: Send + Sync {
    fn insert(&self, job: CrawlJob);
    fn get(&self, id: &str) -> Option<CrawlJob>;
    /// All jobs, newest first.
    fn list(&self) -> Vec<CrawlJob>;
    /// Mutate a job in place. Fails with `JobNotFound` for unknown ids.
    fn update(&self, id: &str, f: &mut dyn FnMut(&mut CrawlJob)) -> Result<()>;
    fn remove(&self, id: &str) -> Option<CrawlJob>;
}

/// Tracked keyword rankings grouped by domain.
pub trait RankingRepository: Send + Sync {
    fn domains(&self) -> Vec<String>;
    /// Rankings of `domain` in the order they were first tracked.
    fn rankings(&self, domain: &str) -> Vec<KeywordRanking>;
    /// Insert, or replace the entry with the same keyword (case-insensitive).
    fn upsert(&self, ranking: KeywordRanking);
    fn remove(&self, domain: &str, keyword: &str) -> bool;
}

//! Process-lifetime repositories backed by `DashMap`.

use dashmap::DashMap;

use super::{JobRepository, RankingRepository};
use crate::domain::models::{CrawlJob, JobId, KeywordRanking};
use crate::error::{AppError, Result};

#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: DashMap<JobId, CrawlJob>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobRepository for InMemoryJobRepository {
    fn insert(&self, job: CrawlJob) {
        self.jobs.insert(job.id.clone(), job);
    }

    fn get(&self, id: &str) -> Option<CrawlJob> {
        self.jobs.get(id).map(|job| job.clone())
    }

    fn list(&self) -> Vec<CrawlJob> {
        let mut jobs: Vec<CrawlJob> = self.jobs.iter().map(|job| job.clone()).collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        jobs
    }

    fn update(&self, id: &str, f: &mut dyn FnMut(&mut CrawlJob)) -> Result<()> {
        let mut job = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| AppError::JobNotFound(id.to_string()))?;
        f(&mut job);
        Ok(())
    }

    fn remove(&self, id: &str) -> Option<CrawlJob> {
        self.jobs.remove(id).map(|(_, job)| job)
    }
}

#[derive(Default)]
pub struct InMemoryRankingRepository {
    rankings: DashMap<String, Vec<KeywordRanking>>,
}

impl InMemoryRankingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RankingRepository for InMemoryRankingRepository {
    fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.rankings.iter().map(|e| e.key().clone()).collect();
        domains.sort();
        domains
    }

    fn rankings(&self, domain: &str) -> Vec<KeywordRanking> {
        self.rankings
            .get(domain)
            .map(|list| list.clone())
            .unwrap_or_default()
    }

    fn upsert(&self, ranking: KeywordRanking) {
        let mut list = self.rankings.entry(ranking.domain.clone()).or_default();
        match list
            .iter_mut()
            .find(|r| r.keyword.eq_ignore_ascii_case(&ranking.keyword))
        {
            Some(existing) => *existing = ranking,
            None => list.push(ranking),
        }
    }

    fn remove(&self, domain: &str, keyword: &str) -> bool {
        let Some(mut list) = self.rankings.get_mut(domain) else {
            return false;
        };
        let before = list.len();
        list.retain(|r| !r.keyword.eq_ignore_ascii_case(keyword));
        before != list.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlSettings;
    use crate::domain::models::{DataSource, JobStatus};
    use chrono::{Duration, Utc};

    fn ranking(domain: &str, keyword: &str, position: Option<u8>) -> KeywordRanking {
        KeywordRanking {
            keyword: keyword.to_string(),
            domain: domain.to_string(),
            position,
            previous_position: None,
            best_position: position,
            url: None,
            search_volume: 100,
            history: Vec::new(),
            checked_at: Utc::now(),
            source: DataSource::Simulated,
        }
    }

    #[test]
    fn jobs_are_listed_newest_first() {
        let repo = InMemoryJobRepository::new();
        let mut old = CrawlJob::new("https://a.test/", CrawlSettings::default());
        old.created_at = Utc::now() - Duration::minutes(5);
        let new = CrawlJob::new("https://b.test/", CrawlSettings::default());
        repo.insert(old.clone());
        repo.insert(new.clone());

        let ids: Vec<String> = repo.list().into_iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![new.id, old.id]);
    }

    #[test]
    fn update_unknown_job_fails() {
        let repo = InMemoryJobRepository::new();
        let err = repo.update("missing", &mut |_| {}).unwrap_err();
        assert!(matches!(err, AppError::JobNotFound(id) if id == "missing"));
    }

    #[test]
    fn update_and_remove() {
        let repo = InMemoryJobRepository::new();
        let job = CrawlJob::new("https://a.test/", CrawlSettings::default());
        let id = job.id.clone();
        repo.insert(job);

        repo.update(&id, &mut |job| job.status = JobStatus::Running).unwrap();
        assert_eq!(repo.get(&id).unwrap().status, JobStatus::Running);

        assert!(repo.remove(&id).is_some());
        assert!(repo.get(&id).is_none());
        assert!(repo.remove(&id).is_none());
    }

    #[test]
    fn upsert_replaces_same_keyword() {
        let repo = InMemoryRankingRepository::new();
        repo.upsert(ranking("a.test", "rust seo", Some(10)));
        repo.upsert(ranking("a.test", "crawler", None));
        repo.upsert(ranking("a.test", "Rust SEO", Some(4)));

        let list = repo.rankings("a.test");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].position, Some(4));
        assert_eq!(list[1].keyword, "crawler");
        assert_eq!(repo.domains(), vec!["a.test"]);
    }

    #[test]
    fn remove_keyword() {
        let repo = InMemoryRankingRepository::new();
        repo.upsert(ranking("a.test", "rust seo", Some(10)));
        assert!(repo.remove("a.test", "RUST SEO"));
        assert!(!repo.remove("a.test", "rust seo"));
        assert!(!repo.remove("b.test", "rust seo"));
        assert!(repo.rankings("a.test").is_empty());
        assert!(repo.rankings("b.test").is_empty());
    }
}

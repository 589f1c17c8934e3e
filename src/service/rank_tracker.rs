//! Keyword rank tracking per domain.
//!
//! Search engines offer no open ranking API, so positions come from the
//! simulator as a bounded random walk from the previous check.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::models::{DataSource, KeywordRanking, RankingSummary};
use crate::error::{AppError, Result};
use crate::io::http_client::parse_url;
use crate::repository::RankingRepository;
use crate::service::simulator::Simulator;

pub struct RankTracker {
    rankings: Arc<dyn RankingRepository>,
    simulator: Arc<Simulator>,
}

impl RankTracker {
    pub fn new(rankings: Arc<dyn RankingRepository>, simulator: Arc<Simulator>) -> Self {
        Self {
            rankings,
            simulator,
        }
    }

    /// Start tracking `keywords` for `domain`. Keywords already tracked are
    /// left untouched.
    pub fn track(&self, domain: &str, keywords: &[String]) -> Result<Vec<KeywordRanking>> {
        let domain = normalize_domain(domain)?;
        let keywords = normalize_keywords(keywords);
        if keywords.is_empty() {
            return Err(AppError::invalid_input("no keywords to track"));
        }

        let existing = self.rankings.rankings(&domain);
        let mut added = 0;
        for keyword in keywords {
            if existing.iter().any(|r| r.keyword == keyword) {
                continue;
            }
            let (search_volume, ..) = self
                .simulator
                .keyword_metrics(keyword.split_whitespace().count());
            let now = Utc::now();
            let mut ranking = KeywordRanking {
                url: None,
                domain: domain.clone(),
                position: None,
                previous_position: None,
                best_position: None,
                search_volume,
                history: Vec::new(),
                checked_at: now,
                source: DataSource::Simulated,
                keyword,
            };
            let position = self.simulator.ranking_position(None);
            ranking.record(position, now);
            ranking.url = landing_url(&ranking);
            self.rankings.upsert(ranking);
            added += 1;
        }

        tracing::info!("[RANK] Tracking {} new keywords for {}", added, domain);
        Ok(self.rankings.rankings(&domain))
    }

    /// Run a new check for every keyword tracked for `domain`.
    pub fn refresh(&self, domain: &str) -> Result<Vec<KeywordRanking>> {
        let domain = normalize_domain(domain)?;
        let current = self.tracked(&domain)?;

        let now = Utc::now();
        for mut ranking in current {
            let position = self.simulator.ranking_position(ranking.position);
            ranking.record(position, now);
            ranking.url = landing_url(&ranking);
            tracing::debug!(
                "[RANK] {} '{}': {:?} -> {:?}",
                domain,
                ranking.keyword,
                ranking.previous_position,
                ranking.position
            );
            self.rankings.upsert(ranking);
        }

        tracing::info!("[RANK] Refreshed rankings for {}", domain);
        Ok(self.rankings.rankings(&domain))
    }

    pub fn rankings(&self, domain: &str) -> Result<Vec<KeywordRanking>> {
        let domain = normalize_domain(domain)?;
        Ok(self.rankings.rankings(&domain))
    }

    /// Stop tracking one keyword. Returns whether it was tracked.
    pub fn untrack(&self, domain: &str, keyword: &str) -> Result<bool> {
        let domain = normalize_domain(domain)?;
        let Some(keyword) = normalize_keywords(&[keyword.to_string()]).pop() else {
            return Ok(false);
        };
        let removed = self.rankings.remove(&domain, &keyword);
        if removed {
            tracing::info!("[RANK] Untracked '{}' for {}", keyword, domain);
        }
        Ok(removed)
    }

    pub fn summary(&self, domain: &str) -> Result<RankingSummary> {
        let domain = normalize_domain(domain)?;
        Ok(RankingSummary::from_rankings(
            &domain,
            &self.rankings.rankings(&domain),
        ))
    }

    pub fn domains(&self) -> Vec<String> {
        self.rankings.domains()
    }

    fn tracked(&self, domain: &str) -> Result<Vec<KeywordRanking>> {
        let current = self.rankings.rankings(domain);
        if current.is_empty() {
            return Err(AppError::invalid_input(format!(
                "no keywords tracked for {}",
                domain
            )));
        }
        Ok(current)
    }
}

/// Host of a URL or bare domain, lowercased and without `www.`.
pub fn normalize_domain(input: &str) -> Result<String> {
    let url = parse_url(input)?;
    let host = url
        .host_str()
        .ok_or_else(|| AppError::InvalidUrl(input.to_string()))?
        .to_lowercase();
    Ok(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for keyword in keywords {
        let keyword = keyword
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if !keyword.is_empty() && !out.contains(&keyword) {
            out.push(keyword);
        }
    }
    out
}

fn landing_url(ranking: &KeywordRanking) -> Option<String> {
    ranking.position?;
    let slug = ranking.keyword.split_whitespace().collect::<Vec<_>>().join("-");
    Some(format!("https://{}/{}", ranking.domain, slug))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRankingRepository;

    fn tracker() -> RankTracker {
        RankTracker::new(
            Arc::new(InMemoryRankingRepository::new()),
            Arc::new(Simulator::seeded(99)),
        )
    }

    fn kw(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalize_domain_accepts_urls() {
        assert_eq!(normalize_domain("https://www.Example.com/page").unwrap(), "example.com");
        assert_eq!(normalize_domain("shop.example.com").unwrap(), "shop.example.com");
        assert!(normalize_domain("").is_err());
    }

    #[test]
    fn track_deduplicates_case_insensitively() {
        let tracker = tracker();
        let list = tracker
            .track("example.com", &kw(&["Rust SEO", "rust  seo", "crawler", " "]))
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].keyword, "rust seo");
        assert!(list.iter().all(|r| r.history.len() == 1));
        assert!(list.iter().all(|r| r.previous_position.is_none()));

        // Tracking again does not reset existing entries
        let again = tracker.track("www.example.com", &kw(&["RUST SEO"])).unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(again[0].history.len(), 1);
    }

    #[test]
    fn track_requires_keywords() {
        let err = tracker().track("example.com", &kw(&["", "  "])).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn refresh_keeps_previous_and_caps_history() {
        let tracker = tracker();
        let tracked = tracker.track("example.com", &kw(&["rust seo"])).unwrap();

        let mut last = tracked[0].position;
        for _ in 0..40 {
            let list = tracker.refresh("example.com").unwrap();
            let ranking = &list[0];
            assert_eq!(ranking.previous_position, last);
            if let (Some(best), Some(pos)) = (ranking.best_position, ranking.position) {
                assert!(best <= pos);
            }
            last = ranking.position;
        }
        let list = tracker.rankings("example.com").unwrap();
        assert_eq!(list[0].history.len(), KeywordRanking::MAX_HISTORY);
    }

    #[test]
    fn refresh_unknown_domain_fails() {
        assert!(matches!(
            tracker().refresh("nothing.test"),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn untrack_and_summary() {
        let tracker = tracker();
        tracker
            .track("example.com", &kw(&["a keyword", "b keyword", "c keyword"]))
            .unwrap();
        assert!(tracker.untrack("example.com", "B Keyword").unwrap());
        assert!(!tracker.untrack("example.com", "b keyword").unwrap());
        assert!(tracker.untrack("example.com", "  c   keyword ").unwrap());
        assert!(!tracker.untrack("example.com", "   ").unwrap());

        let summary = tracker.summary("example.com").unwrap();
        assert_eq!(summary.tracked, 1);
        assert!(summary.top_3 <= summary.top_10 && summary.top_10 <= summary.top_100);
        assert_eq!(tracker.domains(), vec!["example.com"]);
    }
}

use serde::Serialize;

use crate::domain::models::{KeywordExtraction, KeywordIdea, KeywordRanking, RankingSummary};
use crate::error::CommandError;
use crate::lifecycle::AppState;

const DEFAULT_IDEAS: usize = 20;
const DEFAULT_TERMS: usize = 15;

#[derive(Debug, Serialize)]
pub struct RankingsResponse {
    pub rankings: Vec<KeywordRanking>,
    pub summary: RankingSummary,
}

pub async fn research_keywords(
    state: &AppState,
    seed: String,
    limit: Option<usize>,
) -> Result<Vec<KeywordIdea>, CommandError> {
    Ok(state
        .keywords
        .research(&seed, limit.unwrap_or(DEFAULT_IDEAS))
        .await?)
}

pub async fn extract_keywords(
    state: &AppState,
    url: String,
    limit: Option<usize>,
) -> Result<KeywordExtraction, CommandError> {
    Ok(state
        .keywords
        .extract_from_url(&url, limit.unwrap_or(DEFAULT_TERMS))
        .await?)
}

pub async fn track_keywords(
    state: &AppState,
    domain: String,
    keywords: Vec<String>,
) -> Result<Vec<KeywordRanking>, CommandError> {
    Ok(state.rank_tracker.track(&domain, &keywords)?)
}

pub async fn untrack_keyword(
    state: &AppState,
    domain: String,
    keyword: String,
) -> Result<bool, CommandError> {
    Ok(state.rank_tracker.untrack(&domain, &keyword)?)
}

pub async fn refresh_rankings(
    state: &AppState,
    domain: String,
) -> Result<Vec<KeywordRanking>, CommandError> {
    Ok(state.rank_tracker.refresh(&domain)?)
}

pub async fn get_rankings(
    state: &AppState,
    domain: String,
) -> Result<RankingsResponse, CommandError> {
    Ok(RankingsResponse {
        rankings: state.rank_tracker.rankings(&domain)?,
        summary: state.rank_tracker.summary(&domain)?,
    })
}

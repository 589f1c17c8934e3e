use std::fmt::Write as _;

use crate::domain::models::{DataSource, KeywordRanking, RankingSummary};
use crate::views::{heading, push_notice};

pub fn render(rankings: &[KeywordRanking], summary: &RankingSummary) -> String {
    let mut out = String::new();
    heading(&mut out, &format!("Rank Tracking: {}", summary.domain));
    if rankings.iter().any(|r| r.source == DataSource::Simulated) {
        push_notice(&mut out, DataSource::Simulated, None);
    }

    let average = summary
        .average_position
        .map_or_else(|| "-".to_string(), |p| format!("{:.1}", p));
    let _ = writeln!(
        out,
        "{} keywords | avg position {} | top 3: {} | top 10: {} | top 100: {} | up {} / down {}\n",
        summary.tracked,
        average,
        summary.top_3,
        summary.top_10,
        summary.top_100,
        summary.improved,
        summary.declined
    );

    let _ = writeln!(
        out,
        "{:<32} {:>4} {:>6} {:>4} {:>8}",
        "keyword", "pos", "change", "best", "volume"
    );
    for ranking in rankings {
        let _ = writeln!(
            out,
            "{:<32} {:>4} {:>6} {:>4} {:>8}",
            ranking.keyword,
            position(ranking.position),
            change(ranking.change()),
            position(ranking.best_position),
            ranking.search_volume
        );
    }
    out
}

fn position(value: Option<u8>) -> String {
    value.map_or_else(|| "-".to_string(), |p| p.to_string())
}

fn change(value: Option<i32>) -> String {
    match value {
        Some(c) if c > 0 => format!("+{}", c),
        Some(c) => c.to_string(),
        None => String::new(),
    }
}

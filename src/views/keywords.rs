use std::fmt::Write as _;

use crate::domain::models::{DataSource, KeywordExtraction, KeywordIdea};
use crate::views::{heading, push_notice};

const SPARK: &[char] = &['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub fn render_ideas(seed: &str, ideas: &[KeywordIdea]) -> String {
    let mut out = String::new();
    heading(&mut out, &format!("Keyword Research: {}", seed));
    let source = ideas
        .first()
        .map_or(DataSource::Simulated, |idea| idea.source);
    push_notice(&mut out, source, None);

    let _ = writeln!(
        out,
        "{:<36} {:>8} {:>4} {:>6} {:<6} {:<13} trend",
        "keyword", "volume", "kd", "cpc", "comp.", "intent"
    );
    for idea in ideas {
        let _ = writeln!(
            out,
            "{:<36} {:>8} {:>4} {:>6.2} {:<6} {:<13} {}",
            idea.keyword,
            idea.search_volume,
            idea.difficulty,
            idea.cpc,
            idea.competition.as_str(),
            idea.intent.as_str(),
            sparkline(&idea.trend)
        );
    }
    out
}

pub fn render_extraction(extraction: &KeywordExtraction) -> String {
    let mut out = String::new();
    heading(&mut out, &format!("Keywords on {}", extraction.url));
    push_notice(&mut out, extraction.source, extraction.error);

    if !extraction.meta_keywords.is_empty() {
        let _ = writeln!(out, "Meta keywords: {}\n", extraction.meta_keywords.join(", "));
    }

    let _ = writeln!(out, "Top terms:");
    for term in &extraction.terms {
        let _ = writeln!(out, "  {:<28} {:>4}x {:>6.2}%", term.term, term.occurrences, term.density);
    }
    if !extraction.phrases.is_empty() {
        let _ = writeln!(out, "\nTop phrases:");
        for phrase in &extraction.phrases {
            let _ = writeln!(out, "  {:<28} {:>4}x", phrase.term, phrase.occurrences);
        }
    }
    out
}

/// One block character per value, scaled between the series min and max.
pub fn sparkline(values: &[u32]) -> String {
    let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
        return String::new();
    };
    let span = (max - min).max(1) as usize;
    values
        .iter()
        .map(|&v| SPARK[(v - min) as usize * (SPARK.len() - 1) / span])
        .collect()
}

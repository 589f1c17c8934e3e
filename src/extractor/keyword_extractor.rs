//! Term-frequency keyword extraction from page text.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::models::KeywordDensity;

const MIN_TERM_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "because",
    "been", "but", "by", "can", "could", "did", "do", "does", "each", "for", "from", "get", "has",
    "have", "her", "his", "how", "if", "in", "into", "is", "it", "its", "just", "more", "most",
    "my", "no", "not", "now", "of", "on", "one", "only", "or", "other", "our", "out", "over", "so",
    "some", "such", "than", "that", "the", "their", "them", "then", "there", "these", "they",
    "this", "those", "through", "to", "too", "up", "us", "use", "very", "was", "we", "were",
    "what", "when", "where", "which", "while", "who", "will", "with", "would", "you", "your",
];

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\p{L}\p{N}][\p{L}\p{N}'-]*").unwrap())
}

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}

/// Lowercased word tokens from `text`.
pub fn tokenize(text: &str) -> Vec<String> {
    word_regex()
        .find_iter(text)
        .map(|m| m.as_str().trim_matches(|c| c == '\'' || c == '-').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn is_candidate(word: &str) -> bool {
    word.chars().count() >= MIN_TERM_LEN
        && !is_stop_word(word)
        && !word.chars().all(|c| c.is_ascii_digit())
}

fn rank(counts: HashMap<String, usize>, total_words: usize, limit: usize) -> Vec<KeywordDensity> {
    let mut ranked: Vec<KeywordDensity> = counts
        .into_iter()
        .map(|(term, occurrences)| KeywordDensity {
            density: if total_words == 0 {
                0.0
            } else {
                (occurrences as f64 / total_words as f64 * 10000.0).round() / 100.0
            },
            term,
            occurrences,
        })
        .collect();
    ranked.sort_by(|a, b| b.occurrences.cmp(&a.occurrences).then_with(|| a.term.cmp(&b.term)));
    ranked.truncate(limit);
    ranked
}

/// Most frequent single terms, ignoring stop words and short tokens.
pub fn top_terms(text: &str, limit: usize) -> Vec<KeywordDensity> {
    let tokens = tokenize(text);
    let mut counts: HashMap<String, usize> = HashMap::new();
    for token in tokens.iter().filter(|t| is_candidate(t)) {
        *counts.entry(token.clone()).or_default() += 1;
    }
    rank(counts, tokens.len(), limit)
}

/// Most frequent two-word phrases where both words are candidates.
/// Phrases seen only once are dropped.
pub fn top_phrases(text: &str, limit: usize) -> Vec<KeywordDensity> {
    let tokens = tokenize(text);
    let mut counts: HashMap<String, usize> = HashMap::new();
    for pair in tokens.windows(2) {
        if is_candidate(&pair[0]) && is_candidate(&pair[1]) {
            *counts.entry(format!("{} {}", pair[0], pair[1])).or_default() += 1;
        }
    }
    counts.retain(|_, n| *n > 1);
    rank(counts, tokens.len(), limit)
}

/// Split a `<meta name="keywords">` value.
pub fn split_meta_keywords(raw: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for kw in raw.split([',', ';']).map(|k| k.trim().to_lowercase()) {
        if !kw.is_empty() && !seen.contains(&kw) {
            seen.push(kw);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_words_are_sorted_for_binary_search() {
        let mut sorted = STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOP_WORDS);
    }

    #[test]
    fn tokenize_lowercases_and_trims() {
        assert_eq!(
            tokenize("Rust's SEO -- crawler, 2024!"),
            vec!["rust's", "seo", "crawler", "2024"]
        );
    }

    #[test]
    fn top_terms_ranks_by_frequency() {
        let text = "Rust crawler. The rust crawler is fast. Rust is safe and the crawler is rust.";
        let terms = top_terms(text, 2);
        assert_eq!(terms[0].term, "rust");
        assert_eq!(terms[0].occurrences, 4);
        assert_eq!(terms[1].term, "crawler");
        assert_eq!(terms[1].occurrences, 3);
        assert!(terms.iter().all(|t| t.term != "the"));
        // 4 of 15 tokens
        assert_eq!(terms[0].density, 26.67);
    }

    #[test]
    fn top_phrases_requires_repetition() {
        let text = "technical seo audit, technical seo checklist and a seo audit tool";
        let phrases = top_phrases(text, 5);
        assert_eq!(phrases.len(), 2);
        let names: Vec<&str> = phrases.iter().map(|p| p.term.as_str()).collect();
        assert!(names.contains(&"technical seo"));
        assert!(names.contains(&"seo audit"));
    }

    #[test]
    fn numbers_and_short_words_are_skipped() {
        let terms = top_terms("go go go 2024 2024 ok", 10);
        assert!(terms.is_empty());
    }

    #[test]
    fn meta_keywords_are_deduplicated() {
        assert_eq!(
            split_meta_keywords("Rust, SEO; rust ,  crawler,,"),
            vec!["rust", "seo", "crawler"]
        );
    }

    #[test]
    fn empty_text_has_no_terms() {
        assert!(top_terms("", 5).is_empty());
        assert!(top_phrases("", 5).is_empty());
    }
}

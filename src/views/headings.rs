use std::fmt::Write as _;

use crate::domain::models::PageAnalysis;
use crate::error::FetchErrorKind;
use crate::views::{heading, push_notice};

/// Headings that jump more than one level deeper than the previous one.
pub fn skipped_levels(page: &PageAnalysis) -> Vec<(u8, u8)> {
    let mut skipped = Vec::new();
    let mut previous = 0u8;
    for h in &page.headings {
        if previous > 0 && h.level > previous + 1 {
            skipped.push((previous, h.level));
        }
        previous = h.level;
    }
    skipped
}

/// Title, meta description and the heading outline of a page.
pub fn render(page: &PageAnalysis, error: Option<FetchErrorKind>) -> String {
    let mut out = String::new();
    heading(&mut out, &format!("Headings: {}", page.url));
    push_notice(&mut out, page.source, error);

    let title = page.title.as_deref().unwrap_or("(missing)");
    let _ = writeln!(out, "Title ({} chars): {}", page.title.as_deref().map_or(0, |t| t.chars().count()), title);
    let description = page.meta_description.as_deref().unwrap_or("(missing)");
    let _ = writeln!(
        out,
        "Description ({} chars): {}\n",
        page.meta_description.as_deref().map_or(0, |d| d.chars().count()),
        description
    );

    if page.headings.is_empty() {
        out.push_str("No headings found.\n");
    }
    for h in &page.headings {
        let indent = "  ".repeat(h.level.saturating_sub(1) as usize);
        let _ = writeln!(out, "{}{}: {}", indent, h.tag(), h.text);
    }

    let counts: Vec<String> = (1..=6)
        .map(|level| (level, page.heading_count(level)))
        .filter(|(_, n)| *n > 0)
        .map(|(level, n)| format!("h{}: {}", level, n))
        .collect();
    if !counts.is_empty() {
        let _ = writeln!(out, "\n{}", counts.join(" | "));
    }
    match page.h1_count() {
        0 => out.push_str("! No H1 heading\n"),
        1 => {}
        n => {
            let _ = writeln!(out, "! {} H1 headings", n);
        }
    }
    for (from, to) in skipped_levels(page) {
        let _ = writeln!(out, "! Skipped level: h{} followed by h{}", from, to);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::HeadingElement;

    fn h(level: u8, text: &str) -> HeadingElement {
        HeadingElement {
            level,
            text: text.to_string(),
        }
    }

    #[test]
    fn outline_and_warnings() {
        let mut page = PageAnalysis::default_test_instance();
        page.headings = vec![h(1, "Main"), h(3, "Deep"), h(2, "Section")];

        let text = render(&page, None);
        assert!(text.contains("h1: Main\n"));
        assert!(text.contains("    h3: Deep\n"));
        assert!(text.contains("h1: 1 | h2: 1 | h3: 1"));
        assert!(text.contains("! Skipped level: h1 followed by h3"));
        assert!(!text.contains("No H1"));
    }

    #[test]
    fn empty_page() {
        let page = PageAnalysis::empty("https://example.com/");
        let text = render(&page, None);
        assert!(text.contains("Title (0 chars): (missing)"));
        assert!(text.contains("No headings found."));
        assert!(text.contains("! No H1 heading"));
    }
}

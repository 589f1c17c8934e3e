use std::fmt::Write as _;

use crate::domain::models::PageAnalysis;
use crate::error::FetchErrorKind;
use crate::views::{heading, push_notice, truncate};

pub fn render(page: &PageAnalysis, error: Option<FetchErrorKind>) -> String {
    let mut out = String::new();
    heading(&mut out, &format!("Broken Links: {}", page.url));
    push_notice(&mut out, page.source, error);

    let checked = page.links.iter().filter(|l| l.status_code.is_some()).count();
    let broken: Vec<_> = page.broken_links().collect();
    let _ = writeln!(
        out,
        "{} links ({} internal, {} external), {} checked, {} broken\n",
        page.links.len(),
        page.internal_link_count(),
        page.external_link_count(),
        checked,
        broken.len()
    );

    for link in &broken {
        let status = match link.status_code {
            Some(0) => "ERR".to_string(),
            Some(code) => code.to_string(),
            None => "?".to_string(),
        };
        let _ = writeln!(
            out,
            "{:>4}  {}  {}",
            status,
            truncate(&link.href, 70),
            link.text.as_deref().unwrap_or("")
        );
    }
    if broken.is_empty() && checked > 0 {
        out.push_str("No broken links found.\n");
    }
    out
}

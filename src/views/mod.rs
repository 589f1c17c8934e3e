//! Text renderings of the dashboard pages.

pub mod broken_links;
pub mod headings;
pub mod keywords;
pub mod rank_tracking;
pub mod reports;
pub mod technical;

use crate::domain::models::DataSource;
use crate::error::FetchErrorKind;

/// Banner shown above simulated data.
pub fn notice(source: DataSource, error: Option<FetchErrorKind>) -> Option<String> {
    if source != DataSource::Simulated {
        return None;
    }
    Some(match error {
        Some(kind) => format!(
            "! Showing simulated data: live fetch failed ({}: {}).",
            kind,
            kind.explanation()
        ),
        None => "! Showing simulated data.".to_string(),
    })
}

pub(crate) fn push_notice(out: &mut String, source: DataSource, error: Option<FetchErrorKind>) {
    if let Some(line) = notice(source, error) {
        out.push_str(&line);
        out.push_str("\n\n");
    }
}

pub(crate) fn heading(out: &mut String, title: &str) {
    out.push_str(title);
    out.push('\n');
    out.push_str(&"=".repeat(title.chars().count()));
    out.push('\n');
}

pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_only_for_simulated_data() {
        assert!(notice(DataSource::Live, None).is_none());
        let line = notice(DataSource::Simulated, Some(FetchErrorKind::Timeout)).unwrap();
        assert!(line.contains("(timeout: the site took too long to respond)"));
        assert_eq!(
            notice(DataSource::Simulated, None).as_deref(),
            Some("! Showing simulated data.")
        );
    }

    #[test]
    fn truncate_long_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long line", 8), "a ver...");
    }
}

use std::fmt::Write as _;

use crate::domain::models::TechnicalSeoReport;
use crate::views::{heading, push_notice};

pub fn render(report: &TechnicalSeoReport) -> String {
    let mut out = String::new();
    heading(&mut out, &format!("Technical SEO: {}", report.url));
    push_notice(&mut out, report.source, report.error);

    let _ = writeln!(out, "Score: {}/100\n", report.score);
    for check in &report.checks {
        let mark = if check.passed { "PASS" } else { "FAIL" };
        let penalty = if check.deduction > 0 {
            format!(" (-{})", check.deduction)
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "[{}] {:<24} {}{}",
            mark, check.label, check.detail, penalty
        );
    }

    if !report.issues.is_empty() {
        out.push('\n');
        heading(&mut out, "Issues");
        for issue in &report.issues {
            let _ = writeln!(out, "- [{}] {}: {}", issue.severity.as_str(), issue.title, issue.description);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{DataSource, PageAnalysis};
    use crate::service::technical::TechnicalSeoService;

    #[test]
    fn failed_checks_show_penalty() {
        let mut page = PageAnalysis::default_test_instance();
        page.has_viewport = false;
        page.refresh_issues();
        let checks = TechnicalSeoService::evaluate(&page);
        let report = TechnicalSeoReport {
            url: page.url.clone(),
            score: TechnicalSeoService::score(&checks),
            checks,
            issues: page.issues.clone(),
            page,
            error: None,
            source: DataSource::Live,
            analyzed_at: chrono::Utc::now(),
        };

        let text = render(&report);
        assert!(text.contains("Score: 90/100"));
        assert!(text.contains("[FAIL] Mobile viewport"));
        assert!(text.contains("(-10)"));
        assert!(!text.contains("simulated"));
    }
}

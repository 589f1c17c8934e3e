use std::fmt::Write as _;

use crate::domain::models::{CrawlJob, JobStatus};
use crate::service::reports::SiteReport;
use crate::views::{heading, push_notice, truncate};

pub fn render(report: &SiteReport) -> String {
    let mut out = String::new();
    heading(&mut out, &format!("SEO Report: {}", report.url));
    push_notice(&mut out, report.source, report.error);

    let _ = writeln!(out, "Overall score:   {}/100", report.score);
    let _ = writeln!(out, "Crawl score:     {}/100", report.crawl.score);
    let _ = writeln!(out, "Technical score: {}/100", report.technical_score);
    let _ = writeln!(out, "Pages analysed:  {}", report.crawl.pages_analyzed);
    let _ = writeln!(
        out,
        "Issues:          {} ({} critical, {} warnings, {} suggestions)",
        report.total_issues, report.critical_issues, report.warning_issues, report.suggestion_issues
    );
    let _ = writeln!(out, "Avg load time:   {:.0} ms", report.crawl.avg_load_time_ms);
    let _ = writeln!(out, "Broken links:    {}", report.crawl.broken_links);

    if !report.top_issues.is_empty() {
        out.push('\n');
        heading(&mut out, "Top issues");
        for group in &report.top_issues {
            let _ = writeln!(
                out,
                "[{:<10}] {} ({} on {} pages)",
                group.severity.as_str(),
                group.title,
                group.count,
                group.pages.len()
            );
            let _ = writeln!(out, "             -> {}", group.recommendation);
        }
    }

    if !report.rankings.is_empty() {
        out.push('\n');
        heading(&mut out, "Tracked keywords");
        for ranking in &report.rankings {
            let position = ranking
                .position
                .map_or_else(|| "-".to_string(), |p| p.to_string());
            let _ = writeln!(out, "{:>4}  {}", position, ranking.keyword);
        }
    }
    out
}

/// A crawl job and its pages.
pub fn render_job(job: &CrawlJob) -> String {
    let mut out = String::new();
    heading(&mut out, &format!("Crawl: {}", job.url));
    push_notice(&mut out, job.source, job.error);

    let _ = writeln!(
        out,
        "Job {} | {} | {:.0}% | attempt {}",
        job.id,
        job.status.as_str(),
        job.progress,
        job.attempts
    );
    if job.status == JobStatus::Failed {
        if let Some(message) = &job.message {
            let _ = writeln!(out, "Error: {}", message);
        }
    }
    let _ = writeln!(
        out,
        "robots.txt: {} | sitemap.xml: {} | SSL: {}",
        yes_no(job.resources.robots_txt),
        yes_no(job.resources.sitemap),
        yes_no(job.resources.ssl)
    );
    if let Some(summary) = &job.summary {
        let _ = writeln!(
            out,
            "Score {}/100 | {} pages | {} issues | {} words",
            summary.score, summary.pages_analyzed, summary.total_issues, summary.total_words
        );
    }

    if !job.pages.is_empty() {
        out.push('\n');
        for page in &job.pages {
            let _ = writeln!(
                out,
                "{:>3} {:>6}ms {:>3} issues  {}  {}",
                page.status_code,
                page.load_time_ms,
                page.issues.len(),
                truncate(&page.url, 60),
                truncate(page.title.as_deref().unwrap_or("(no title)"), 40)
            );
        }
    }
    out
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlSettings;
    use crate::domain::models::{CrawlSummary, DataSource, PageAnalysis};
    use crate::error::FetchErrorKind;

    #[test]
    fn job_view_lists_pages_and_notice() {
        let mut job = CrawlJob::new("https://example.com/", CrawlSettings::default());
        job.status = JobStatus::Completed;
        job.source = DataSource::Simulated;
        job.error = Some(FetchErrorKind::Cors);
        job.pages = vec![PageAnalysis::default_test_instance()];
        job.summary = Some(CrawlSummary::from_pages(&job.pages, &job.resources));

        let text = render_job(&job);
        assert!(text.starts_with("Crawl: https://example.com/\n"));
        assert!(text.contains("live fetch failed (cors"));
        assert!(text.contains("A Perfectly Reasonable Page Title Here"));
        assert!(text.contains("completed"));
    }
}

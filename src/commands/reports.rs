use crate::commands::AnalysisSettingsRequest;
use crate::error::CommandError;
use crate::lifecycle::AppState;
use crate::service::reports::{self, ReportFormat, SiteReport};

pub async fn build_report(
    state: &AppState,
    url: String,
    settings: Option<AnalysisSettingsRequest>,
) -> Result<SiteReport, CommandError> {
    let settings = settings.unwrap_or_default().apply(&state.config.crawl);
    Ok(state.reports.build(&url, settings).await?)
}

/// Serialise a report as `json` or `csv`.
pub async fn export_report(report: &SiteReport, format: String) -> Result<String, CommandError> {
    let format: ReportFormat = format.parse()?;
    Ok(reports::export(report, format)?)
}

//! Dashboard command layer.
//!
//! Thin async wrappers over `AppState`; every command returns a
//! `CommandError` that serialises to a plain message.

pub mod analysis;
pub mod keywords;
pub mod reports;

pub use analysis::{
    analyze_technical, cancel_analysis, delete_analysis, get_all_jobs, get_analysis_progress,
    get_result, inspect_page, retry_analysis, start_analysis, AnalysisJobResponse,
    AnalysisSettingsRequest,
};
pub use keywords::{
    extract_keywords, get_rankings, refresh_rankings, research_keywords, track_keywords,
    untrack_keyword, RankingsResponse,
};
pub use reports::{build_report, export_report};

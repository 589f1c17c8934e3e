pub mod crawler;
pub mod discovery;
pub mod job_canceler;
pub mod keywords;
pub mod rank_tracker;
pub mod reports;
pub mod scanner;
pub mod simulator;
pub mod technical;

pub use crawler::CrawlerService;
pub use discovery::{PageDiscovery, ResourceChecker};
pub use job_canceler::JobCanceler;
pub use keywords::KeywordService;
pub use rank_tracker::RankTracker;
pub use reports::{ReportFormat, ReportService, SiteReport};
pub use scanner::{LinkCheck, SiteScanner};
pub use simulator::Simulator;
pub use technical::TechnicalSeoService;

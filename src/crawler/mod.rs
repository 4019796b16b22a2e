//! Crawler engine (C1–C9): failure classification, per-domain politeness
//! and circuit breaking, metrics, URL frontier, robots policy, fetch/parse
//! contracts, single-session loop, and multi-session management.

pub mod content_parser;
pub mod domain_manager;
pub mod failure_classifier;
pub mod fetcher;
pub mod frontier;
pub mod manager;
pub mod metrics;
pub mod robots;
pub mod session;

pub use content_parser::{ContentParser, ParsedContent, ScraperContentParser};
pub use domain_manager::DomainManager;
pub use fetcher::{FetchOutcome, PageFetcher, ReqwestFetcher};
pub use frontier::Frontier;
pub use manager::{CrawlStatus, CrawlerManager};
pub use metrics::{CrawlMetrics, MetricsSnapshot};
pub use robots::RobotsPolicy;
pub use session::{Crawler, SessionStatus};

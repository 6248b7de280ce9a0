//! CLI command implementations.

pub mod crawl;
pub mod stats;
pub mod upload;

pub use crawl::CrawlCommand;
pub use stats::StatsCommand;
pub use upload::{UploadArgs, UploadCommand, UploadOutcome};

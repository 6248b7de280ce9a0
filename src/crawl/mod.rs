//! Crawl orchestration: the navigation driver and the batch writer.

pub mod driver;
pub mod output;

pub use driver::{CrawlLimits, CrawlReport, Crawler};
pub use output::OutputWriter;

//! cafe-crawler - Korean café chain menu crawler and catalog uploader
//!
//! Drives a real browser over café chain menu sites, extracts product
//! listings through per-site selector profiles, and reconciles the
//! results into a catalog store.

pub mod browser;
pub mod commands;
pub mod config;
pub mod crawl;
pub mod extract;
pub mod format;
pub mod images;
pub mod model;
pub mod reconcile;
pub mod sites;
pub mod store;

pub use config::Config;
pub use model::{Cafe, ExtractedProduct, StoredProduct, UploadReport};
pub use sites::SiteId;

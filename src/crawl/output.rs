//! Batch files and debug screenshots on disk.

use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use crate::model::ExtractedProduct;

/// Writes crawl artifacts into a flat output directory. Batch files are
/// named `{site}-products-{YYYY-MM-DD}.json`, so re-running a crawl on
/// the same day overwrites that day's batch.
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn write_batch(&self, site_slug: &str, products: &[ExtractedProduct]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory: {}", self.dir.display()))?;
        let filename = format!("{}-products-{}.json", site_slug, Local::now().format("%Y-%m-%d"));
        let path = self.dir.join(filename);
        let json = serde_json::to_string_pretty(products).context("Failed to serialize batch")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write batch file: {}", path.display()))?;
        info!(path = %path.display(), count = products.len(), "batch written");
        Ok(path)
    }

    /// Saved when a crawl comes back empty, to make selector rot visible.
    pub fn write_debug_screenshot(&self, site_slug: &str, png: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory: {}", self.dir.display()))?;
        let filename = format!("{}-debug-{}.png", site_slug, Local::now().format("%Y-%m-%d"));
        let path = self.dir.join(filename);
        fs::write(&path, png)
            .with_context(|| format!("Failed to write screenshot: {}", path.display()))?;
        info!(path = %path.display(), "debug screenshot written");
        Ok(path)
    }

    /// Most recently modified batch file for a site, if any exists.
    pub fn latest_batch(&self, site_slug: &str) -> Option<PathBuf> {
        let prefix = format!("{site_slug}-products-");
        let entries = fs::read_dir(&self.dir).ok()?;
        let mut newest: Option<(SystemTime, PathBuf)> = None;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(&prefix) || !name.ends_with(".json") {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            if newest.as_ref().map_or(true, |(when, _)| modified > *when) {
                newest = Some((modified, entry.path()));
            }
        }
        newest.map(|(_, path)| path)
    }
}

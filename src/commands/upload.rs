//! Upload command: reconciles a crawl batch into the catalog store.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info};

use crate::config::Config;
use crate::crawl::OutputWriter;
use crate::format::Formatter;
use crate::images;
use crate::model::ExtractedProduct;
use crate::reconcile;
use crate::store::{HttpStore, ProductStore};

/// Arguments for `upload`, which is also the default command.
#[derive(Args, Debug, Clone, Default)]
pub struct UploadArgs {
    /// Batch file to upload; defaults to the newest batch for the café
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Café slug to reconcile against
    #[arg(long)]
    pub cafe_slug: Option<String>,

    /// Display name used if the café has to be created first
    #[arg(long)]
    pub cafe_name: Option<String>,

    /// Compute and print the outcome without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Mirror product images into the store after reconciling
    #[arg(long)]
    pub with_images: bool,
}

/// What an upload run produced, for printing and for the exit code.
#[derive(Debug)]
pub struct UploadOutcome {
    pub summary: String,
    /// False when any record failed; the process should exit nonzero.
    pub clean: bool,
}

/// Executes batch uploads.
pub struct UploadCommand {
    config: Config,
}

impl UploadCommand {
    /// Creates a new upload command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes the upload against the configured store.
    pub async fn execute(&self, args: &UploadArgs) -> Result<UploadOutcome> {
        let store_url = self.config.store_url.as_deref().context(
            "No store URL configured. Set CAFE_STORE_URL, or put store_url in the config file.",
        )?;
        let store = HttpStore::new(store_url, self.config.store_key.clone())
            .context("Failed to create store client")?;

        self.execute_with_store(&store, args).await
    }

    /// Executes the upload with a provided store (for testing).
    pub async fn execute_with_store(
        &self,
        store: &dyn ProductStore,
        args: &UploadArgs,
    ) -> Result<UploadOutcome> {
        let cafe_slug = args
            .cafe_slug
            .as_deref()
            .context("--cafe-slug is required for uploads")?;

        let path = match &args.file {
            Some(path) => path.clone(),
            None => OutputWriter::new(&self.config.output_dir)
                .latest_batch(cafe_slug)
                .with_context(|| {
                    format!(
                        "No batch file given and none found for '{}' under {}",
                        cafe_slug,
                        self.config.output_dir.display()
                    )
                })?,
        };
        info!("Uploading batch: {}", path.display());

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
        let batch: Vec<ExtractedProduct> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse batch file: {}", path.display()))?;
        debug!("Batch holds {} records", batch.len());

        let report = reconcile::reconcile(
            store,
            &batch,
            cafe_slug,
            args.cafe_name.as_deref(),
            args.dry_run,
        )
        .await?;

        let mut summary = Formatter::new(self.config.verbose).upload_summary(&report);
        if args.with_images && !args.dry_run {
            let mirrored =
                images::mirror_images(store, &report.image_targets, self.config.mirror_workers)
                    .await;
            summary.push_str(&format!(
                "\n  Images:      {} mirrored, {} failed",
                mirrored.attached, mirrored.failed
            ));
        }

        Ok(UploadOutcome {
            summary,
            clean: report.is_clean(),
        })
    }
}

//! Stats command: per-café catalog counts straight from the store.

use anyhow::{bail, Context, Result};

use crate::config::Config;
use crate::format::{CafeStats, Formatter};
use crate::store::{HttpStore, ProductStore};

/// Prints catalog statistics.
pub struct StatsCommand {
    config: Config,
}

impl StatsCommand {
    /// Creates a new stats command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Queries the configured store and renders the stats table.
    pub async fn execute(&self, cafe_slug: Option<&str>) -> Result<String> {
        let store_url = self.config.store_url.as_deref().context(
            "No store URL configured. Set CAFE_STORE_URL, or put store_url in the config file.",
        )?;
        let store = HttpStore::new(store_url, self.config.store_key.clone())
            .context("Failed to create store client")?;

        self.execute_with_store(&store, cafe_slug).await
    }

    /// Executes against a provided store (for testing).
    pub async fn execute_with_store(
        &self,
        store: &dyn ProductStore,
        cafe_slug: Option<&str>,
    ) -> Result<String> {
        let cafes = match cafe_slug {
            Some(slug) => match store.cafe_by_slug(slug).await? {
                Some(cafe) => vec![cafe],
                None => bail!("Café '{}' not found in the store", slug),
            },
            None => store.list_cafes().await?,
        };

        let mut rows = Vec::with_capacity(cafes.len());
        for cafe in &cafes {
            let products = store.product_index(&cafe.id).await?;
            rows.push(CafeStats::from_products(cafe, &products));
        }

        Ok(Formatter::new(self.config.verbose).stats_table(&rows))
    }
}

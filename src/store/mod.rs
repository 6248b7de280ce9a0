//! Catalog store access.
//!
//! The reconciler talks to the store through [`ProductStore`], so the
//! HTTP client can be swapped for the in-memory store in tests.

pub mod http;
pub mod memory;

pub use http::HttpStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Cafe, ExtractedProduct, StoredProduct};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] wreq::Error),
    #[error("store returned HTTP {status} for {endpoint}")]
    Status { status: u16, endpoint: String },
    #[error("store rejected the call: {0}")]
    Rpc(String),
    #[error("store response did not decode: {0}")]
    Decode(#[from] serde_json::Error),
}

/// What the store did with one upserted product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertAction {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertOutcome {
    pub action: UpsertAction,
    /// Store id of the created or matched product.
    pub id: String,
}

/// Result of the store-side removal pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalOutcome {
    pub removed: usize,
    pub reactivated: usize,
    /// Names of products that were deactivated.
    #[serde(default)]
    pub removed_products: Vec<String>,
    /// Names of products that came back.
    #[serde(default)]
    pub reactivated_products: Vec<String>,
}

/// Catalog store operations the reconciler needs.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn cafe_by_slug(&self, slug: &str) -> Result<Option<Cafe>, StoreError>;

    /// Finds or creates a café with the given slug and display name.
    async fn ensure_cafe(&self, slug: &str, name: &str) -> Result<Cafe, StoreError>;

    async fn list_cafes(&self) -> Result<Vec<Cafe>, StoreError>;

    /// Every stored product of a café, active or not.
    async fn product_index(&self, cafe_id: &str) -> Result<Vec<StoredProduct>, StoreError>;

    /// Creates the product, or updates the one sharing its external id.
    /// The store compares content server-side and reports what it did.
    async fn upsert_product(
        &self,
        cafe_id: &str,
        product: &ExtractedProduct,
    ) -> Result<UpsertOutcome, StoreError>;

    /// Deactivates active products whose external id is not in
    /// `current_external_ids` and reactivates inactive ones that are.
    async fn mark_removed(
        &self,
        cafe_id: &str,
        current_external_ids: &[String],
    ) -> Result<RemovalOutcome, StoreError>;

    /// Uploads raw image bytes and returns the storage id.
    async fn store_image(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, StoreError>;

    /// Points a product at a previously stored image.
    async fn attach_image(&self, product_id: &str, storage_id: &str) -> Result<(), StoreError>;
}

//! In-memory catalog store.
//!
//! Implements the same reconciliation semantics the real store applies
//! server-side, which lets the reconciler and command layers be tested
//! without a network.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::model::{Cafe, ExtractedProduct, StoredProduct};
use crate::store::{ProductStore, RemovalOutcome, StoreError, UpsertAction, UpsertOutcome};

#[derive(Default)]
struct MemoryState {
    cafes: Vec<Cafe>,
    products: Vec<StoredProduct>,
    counter: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers a café directly, bypassing `ensure_cafe`.
    pub fn seed_cafe(&self, slug: &str, name: &str) -> Cafe {
        let mut state = self.state();
        state.counter += 1;
        let cafe = Cafe {
            id: format!("cafe{}", state.counter),
            name: name.to_string(),
            slug: slug.to_string(),
        };
        state.cafes.push(cafe.clone());
        cafe
    }

    /// Full product table, ordered by store id. Meant for asserting that
    /// a dry run left the store untouched.
    pub fn snapshot(&self) -> Vec<StoredProduct> {
        let mut products = self.state().products.clone();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        products
    }

    pub fn product(&self, cafe_id: &str, external_id: &str) -> Option<StoredProduct> {
        self.state()
            .products
            .iter()
            .find(|p| p.cafe_id == cafe_id && p.external_id == external_id)
            .cloned()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn cafe_by_slug(&self, slug: &str) -> Result<Option<Cafe>, StoreError> {
        Ok(self.state().cafes.iter().find(|c| c.slug == slug).cloned())
    }

    async fn ensure_cafe(&self, slug: &str, name: &str) -> Result<Cafe, StoreError> {
        if let Some(cafe) = self.cafe_by_slug(slug).await? {
            return Ok(cafe);
        }
        Ok(self.seed_cafe(slug, name))
    }

    async fn list_cafes(&self) -> Result<Vec<Cafe>, StoreError> {
        Ok(self.state().cafes.clone())
    }

    async fn product_index(&self, cafe_id: &str) -> Result<Vec<StoredProduct>, StoreError> {
        Ok(self
            .state()
            .products
            .iter()
            .filter(|p| p.cafe_id == cafe_id)
            .cloned()
            .collect())
    }

    async fn upsert_product(
        &self,
        cafe_id: &str,
        product: &ExtractedProduct,
    ) -> Result<UpsertOutcome, StoreError> {
        let mut state = self.state();
        let now = Utc::now();
        if let Some(existing) = state
            .products
            .iter_mut()
            .find(|p| p.cafe_id == cafe_id && p.external_id == product.external_id)
        {
            if existing.content_matches(product) {
                return Ok(UpsertOutcome {
                    action: UpsertAction::Unchanged,
                    id: existing.id.clone(),
                });
            }
            existing.apply_content(product);
            existing.updated_at = now;
            return Ok(UpsertOutcome {
                action: UpsertAction::Updated,
                id: existing.id.clone(),
            });
        }
        state.counter += 1;
        let id = format!("prod{}", state.counter);
        state
            .products
            .push(StoredProduct::from_extracted(id.clone(), cafe_id, product, now));
        Ok(UpsertOutcome {
            action: UpsertAction::Created,
            id,
        })
    }

    async fn mark_removed(
        &self,
        cafe_id: &str,
        current_external_ids: &[String],
    ) -> Result<RemovalOutcome, StoreError> {
        let mut state = self.state();
        let now = Utc::now();
        let mut outcome = RemovalOutcome::default();
        for product in state.products.iter_mut().filter(|p| p.cafe_id == cafe_id) {
            let seen = current_external_ids.contains(&product.external_id);
            if product.is_active && !seen {
                product.is_active = false;
                product.removed_at = Some(now);
                outcome.removed += 1;
                outcome.removed_products.push(product.name.clone());
            } else if !product.is_active && seen {
                product.is_active = true;
                product.removed_at = None;
                product.updated_at = now;
                outcome.reactivated += 1;
                outcome.reactivated_products.push(product.name.clone());
            }
        }
        Ok(outcome)
    }

    async fn store_image(&self, bytes: Vec<u8>, _content_type: &str) -> Result<String, StoreError> {
        if bytes.is_empty() {
            return Err(StoreError::Rpc("empty image payload".to_string()));
        }
        let mut state = self.state();
        state.counter += 1;
        Ok(format!("img{}", state.counter))
    }

    async fn attach_image(&self, product_id: &str, storage_id: &str) -> Result<(), StoreError> {
        let mut state = self.state();
        match state.products.iter_mut().find(|p| p.id == product_id) {
            Some(product) => {
                product.image_storage_id = Some(storage_id.to_string());
                Ok(())
            }
            None => Err(StoreError::Rpc(format!("unknown product '{product_id}'"))),
        }
    }
}

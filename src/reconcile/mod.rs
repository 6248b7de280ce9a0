//! Reconciles a crawl batch against the catalog store.
//!
//! One run per café at a time: runs targeting the same café serialize on
//! an in-process lock, keyed by slug. Per-record failures are collected
//! into the report rather than aborting the run; only failures that make
//! the whole reconciliation meaningless (café resolution, reading the
//! product index) surface as errors.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock, Mutex};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::extract;
use crate::model::{ExtractedProduct, RecordError, StoredProduct, UploadReport};
use crate::store::{ProductStore, StoreError, UpsertAction};

/// Input records echoed back on dry runs.
const SAMPLE_LEN: usize = 3;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("café '{0}' not found in the store; pass --cafe-name to create it")]
    CafeNotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

static CAFE_LOCKS: LazyLock<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn cafe_lock(slug: &str) -> Arc<tokio::sync::Mutex<()>> {
    let mut locks = match CAFE_LOCKS.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    locks.entry(slug.to_string()).or_default().clone()
}

/// Applies a batch to the store (or rehearses it when `dry_run` is set)
/// and reports what happened.
///
/// A café missing from the store is created only when `cafe_name` is
/// given and the run is not a dry run; dry runs never mutate anything,
/// they rehearse against an empty catalog instead.
pub async fn reconcile(
    store: &dyn ProductStore,
    batch: &[ExtractedProduct],
    cafe_slug: &str,
    cafe_name: Option<&str>,
    dry_run: bool,
) -> Result<UploadReport, ReconcileError> {
    let lock = cafe_lock(cafe_slug);
    let _guard = lock.lock().await;

    info!(
        cafe = cafe_slug,
        records = batch.len(),
        dry_run,
        "reconciling batch"
    );
    if dry_run {
        rehearse(store, batch, cafe_slug, cafe_name).await
    } else {
        apply(store, batch, cafe_slug, cafe_name).await
    }
}

/// Dry run: computes the same counts a real run would produce, from the
/// current index, without calling a single mutating endpoint.
async fn rehearse(
    store: &dyn ProductStore,
    batch: &[ExtractedProduct],
    cafe_slug: &str,
    cafe_name: Option<&str>,
) -> Result<UploadReport, ReconcileError> {
    let mut report = UploadReport::new(cafe_slug, true);

    let index = match store.cafe_by_slug(cafe_slug).await? {
        Some(cafe) => store.product_index(&cafe.id).await?,
        None if cafe_name.is_some() => {
            debug!(cafe = cafe_slug, "café missing, rehearsing against an empty catalog");
            Vec::new()
        }
        None => return Err(ReconcileError::CafeNotFound(cafe_slug.to_string())),
    };
    let by_external_id: HashMap<&str, &StoredProduct> =
        index.iter().map(|p| (p.external_id.as_str(), p)).collect();

    let mut current_ids: HashSet<&str> = HashSet::new();
    for product in batch {
        report.processed += 1;
        if let Err(message) = validate(product) {
            report.errors.push(RecordError {
                record: record_key(product),
                message,
            });
            continue;
        }
        current_ids.insert(product.external_id.as_str());
        match by_external_id.get(product.external_id.as_str()) {
            None => report.created += 1,
            Some(stored) if stored.content_matches(product) => report.unchanged += 1,
            Some(_) => report.updated += 1,
        }
    }

    for stored in &index {
        let seen = current_ids.contains(stored.external_id.as_str());
        if stored.is_active && !seen {
            report.removed += 1;
            report.removed_names.push(stored.name.clone());
        } else if !stored.is_active && seen {
            report.reactivated += 1;
            report.reactivated_names.push(stored.name.clone());
        }
    }

    report.sample = batch.iter().take(SAMPLE_LEN).cloned().collect();
    Ok(report)
}

async fn apply(
    store: &dyn ProductStore,
    batch: &[ExtractedProduct],
    cafe_slug: &str,
    cafe_name: Option<&str>,
) -> Result<UploadReport, ReconcileError> {
    let mut report = UploadReport::new(cafe_slug, false);

    let cafe = match store.cafe_by_slug(cafe_slug).await? {
        Some(cafe) => cafe,
        None => {
            let Some(name) = cafe_name else {
                return Err(ReconcileError::CafeNotFound(cafe_slug.to_string()));
            };
            info!(cafe = cafe_slug, name, "registering new café");
            store.ensure_cafe(cafe_slug, name).await?
        }
    };

    // Image presence per external id, so unchanged products with a
    // missing mirror still get queued for the image pass.
    let index = store.product_index(&cafe.id).await?;
    let has_image: HashMap<&str, bool> = index
        .iter()
        .map(|p| (p.external_id.as_str(), p.image_storage_id.is_some()))
        .collect();

    let mut current_ids: Vec<String> = Vec::new();
    for product in batch {
        report.processed += 1;
        if let Err(message) = validate(product) {
            report.errors.push(RecordError {
                record: record_key(product),
                message,
            });
            continue;
        }
        current_ids.push(product.external_id.clone());

        match store.upsert_product(&cafe.id, product).await {
            Ok(outcome) => {
                let wants_image = match outcome.action {
                    UpsertAction::Created => {
                        report.created += 1;
                        true
                    }
                    UpsertAction::Updated => {
                        report.updated += 1;
                        true
                    }
                    UpsertAction::Unchanged => {
                        report.unchanged += 1;
                        !has_image
                            .get(product.external_id.as_str())
                            .copied()
                            .unwrap_or(false)
                    }
                };
                if wants_image && !product.external_image_url.is_empty() {
                    report
                        .image_targets
                        .push((outcome.id, product.external_image_url.clone()));
                }
            }
            Err(err) => {
                warn!(record = %record_key(product), %err, "upsert failed");
                report.errors.push(RecordError {
                    record: record_key(product),
                    message: err.to_string(),
                });
            }
        }
    }

    // The removal pass trusts every valid batch id, including ones whose
    // upsert just failed; a transient store error must not deactivate a
    // product that is still on the menu.
    current_ids.sort();
    current_ids.dedup();
    match store.mark_removed(&cafe.id, &current_ids).await {
        Ok(outcome) => {
            report.removed = outcome.removed;
            report.reactivated = outcome.reactivated;
            report.removed_names = outcome.removed_products;
            report.reactivated_names = outcome.reactivated_products;
        }
        Err(err) => {
            warn!(%err, "removal pass failed");
            report.errors.push(RecordError {
                record: "removal pass".to_string(),
                message: err.to_string(),
            });
        }
    }

    Ok(report)
}

fn validate(product: &ExtractedProduct) -> Result<(), String> {
    let name = product.name.trim();
    if name.is_empty() {
        return Err("record has no name".to_string());
    }
    if name.chars().count() > extract::NAME_MAX_CHARS {
        return Err(format!(
            "name exceeds {} characters",
            extract::NAME_MAX_CHARS
        ));
    }
    if product.external_id.trim().is_empty() {
        return Err("record has no external id".to_string());
    }
    if product.external_url.trim().is_empty() {
        return Err("record has no external URL".to_string());
    }
    Ok(())
}

fn record_key(product: &ExtractedProduct) -> String {
    if product.external_id.is_empty() {
        product.name.clone()
    } else {
        product.external_id.clone()
    }
}

//! Mirrors product images from café CDNs into the catalog store.
//!
//! Runs after reconciliation and never feeds back into it: a failed
//! image leaves the product serving its external URL until the next
//! run retries.

use std::time::Duration;

use anyhow::Context;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use wreq::Client;
use wreq_util::Emulation;

use crate::store::ProductStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorSummary {
    pub attached: usize,
    pub failed: usize,
}

/// Fetches each (product id, image URL) pair and attaches the stored
/// copy to the product, `workers` downloads at a time.
pub async fn mirror_images(
    store: &dyn ProductStore,
    targets: &[(String, String)],
    workers: usize,
) -> MirrorSummary {
    if targets.is_empty() {
        return MirrorSummary::default();
    }

    let client = match Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            warn!(%err, "image client failed to build, keeping external URLs");
            return MirrorSummary {
                attached: 0,
                failed: targets.len(),
            };
        }
    };

    info!(count = targets.len(), "mirroring product images");
    let results: Vec<bool> = stream::iter(targets)
        .map(|(product_id, image_url)| {
            let client = client.clone();
            async move { mirror_one(store, &client, product_id, image_url).await }
        })
        .buffer_unordered(workers.max(1))
        .collect()
        .await;

    let attached = results.iter().filter(|ok| **ok).count();
    let summary = MirrorSummary {
        attached,
        failed: results.len() - attached,
    };
    if summary.failed > 0 {
        warn!(failed = summary.failed, "some images were not mirrored");
    }
    summary
}

async fn mirror_one(
    store: &dyn ProductStore,
    client: &Client,
    product_id: &str,
    image_url: &str,
) -> bool {
    let (bytes, content_type) = match fetch_image(client, image_url).await {
        Ok(fetched) => fetched,
        Err(err) => {
            warn!(product_id, image_url, %err, "image fetch failed");
            return false;
        }
    };
    let storage_id = match store.store_image(bytes, &content_type).await {
        Ok(storage_id) => storage_id,
        Err(err) => {
            warn!(product_id, %err, "image store failed");
            return false;
        }
    };
    match store.attach_image(product_id, &storage_id).await {
        Ok(()) => {
            debug!(product_id, %storage_id, "image mirrored");
            true
        }
        Err(err) => {
            warn!(product_id, %err, "image attach failed");
            false
        }
    }
}

/// Café CDNs sit behind the same bot protection as the menu pages, so
/// the fetch emulates a browser the way the crawler does.
async fn fetch_image(client: &Client, url: &str) -> anyhow::Result<(Vec<u8>, String)> {
    let response = client
        .get(url)
        .emulation(Emulation::Chrome131)
        .send()
        .await
        .context("request failed")?;
    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("image host returned {}", status);
    }
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("image/jpeg")
        .to_string();
    let bytes = response.bytes().await.context("failed to read body")?.to_vec();
    if bytes.is_empty() {
        anyhow::bail!("empty image body");
    }
    Ok((bytes, content_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExtractedProduct;
    use crate::store::MemoryStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn seeded_product(store: &MemoryStore, image_url: &str) -> String {
        let cafe = store.seed_cafe("mega", "메가커피");
        let product = ExtractedProduct {
            name: "아메리카노".to_string(),
            name_en: None,
            description: None,
            price: None,
            external_image_url: image_url.to_string(),
            category: "음료".to_string(),
            external_category: "커피".to_string(),
            external_id: "m-1".to_string(),
            external_url: "https://menu.test/1".to_string(),
        };
        store.upsert_product(&cafe.id, &product).await.unwrap().id
    }

    #[tokio::test]
    async fn test_mirror_attaches_stored_image() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/americano.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![0x89u8, 0x50, 0x4E, 0x47]),
            )
            .mount(&mock_server)
            .await;

        let store = MemoryStore::new();
        let url = format!("{}/img/americano.png", mock_server.uri());
        let product_id = seeded_product(&store, &url).await;

        let summary = mirror_images(&store, &[(product_id, url)], 4).await;
        assert_eq!(summary, MirrorSummary { attached: 1, failed: 0 });

        let stored = store.product("cafe1", "m-1").unwrap();
        assert!(stored.image_storage_id.is_some());
    }

    #[tokio::test]
    async fn test_failed_fetch_counts_and_leaves_product_alone() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/missing.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let store = MemoryStore::new();
        let url = format!("{}/img/missing.jpg", mock_server.uri());
        let product_id = seeded_product(&store, &url).await;

        let summary = mirror_images(&store, &[(product_id, url)], 4).await;
        assert_eq!(summary, MirrorSummary { attached: 0, failed: 1 });
        assert!(store.product("cafe1", "m-1").unwrap().image_storage_id.is_none());
    }

    #[tokio::test]
    async fn test_mixed_batch_counts_each_outcome() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(vec![0xFFu8, 0xD8, 0xFF]),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone.jpg"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&mock_server)
            .await;

        let store = MemoryStore::new();
        let ok_url = format!("{}/ok.jpg", mock_server.uri());
        let product_id = seeded_product(&store, &ok_url).await;

        let targets = vec![
            (product_id, ok_url),
            ("ghost".to_string(), format!("{}/gone.jpg", mock_server.uri())),
        ];
        let summary = mirror_images(&store, &targets, 2).await;
        assert_eq!(summary, MirrorSummary { attached: 1, failed: 1 });
    }

    #[tokio::test]
    async fn test_empty_targets_do_nothing() {
        let store = MemoryStore::new();
        let summary = mirror_images(&store, &[], 4).await;
        assert_eq!(summary, MirrorSummary::default());
    }
}

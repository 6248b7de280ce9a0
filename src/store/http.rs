//! HTTP client for the catalog store's RPC endpoints.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use wreq::Client;

use crate::model::{Cafe, ExtractedProduct, StoredProduct};
use crate::store::{ProductStore, RemovalOutcome, StoreError, UpsertOutcome};

/// Client for the café catalog store. Queries go out as GETs, mutations
/// as JSON POSTs, and every call carries the deploy key as a bearer
/// token when one is configured.
pub struct HttpStore {
    client: Client,
    base_url: String,
    deploy_key: Option<String>,
}

impl HttpStore {
    pub fn new(
        base_url: impl Into<String>,
        deploy_key: Option<String>,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            deploy_key,
        })
    }

    fn authorize(&self, request: wreq::RequestBuilder) -> wreq::RequestBuilder {
        match &self.deploy_key {
            Some(key) => request.header("Authorization", format!("Bearer {key}")),
            None => request,
        }
    }

    async fn get_response(&self, path_and_query: &str) -> Result<wreq::Response, StoreError> {
        let url = format!("{}{}", self.base_url, path_and_query);
        debug!("store GET {}", url);
        Ok(self.authorize(self.client.get(&url)).send().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T, StoreError> {
        let response = self.get_response(path_and_query).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                endpoint: path_and_query.to_string(),
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// POSTs a JSON payload and returns the raw response body.
    async fn post(&self, path: &str, payload: &serde_json::Value) -> Result<String, StoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("store POST {}", url);
        let body = serde_json::to_string(payload)?;
        let response = self
            .authorize(self.client.post(&url))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(rpc_error(status.as_u16(), path, &text));
        }
        Ok(text)
    }
}

/// Mutation failures usually carry a message body worth surfacing.
fn rpc_error(status: u16, endpoint: &str, body: &str) -> StoreError {
    #[derive(Deserialize)]
    struct Failure {
        message: String,
    }
    match serde_json::from_str::<Failure>(body) {
        Ok(failure) => StoreError::Rpc(failure.message),
        Err(_) => StoreError::Status {
            status,
            endpoint: endpoint.to_string(),
        },
    }
}

#[async_trait]
impl ProductStore for HttpStore {
    async fn cafe_by_slug(&self, slug: &str) -> Result<Option<Cafe>, StoreError> {
        let path = format!("/rpc/cafes/by-slug?slug={}", urlencoding::encode(slug));
        let response = self.get_response(&path).await?;
        let status = response.status();
        if status == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                endpoint: "/rpc/cafes/by-slug".to_string(),
            });
        }
        let body = response.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn ensure_cafe(&self, slug: &str, name: &str) -> Result<Cafe, StoreError> {
        let text = self
            .post("/rpc/cafes/ensure", &json!({ "slug": slug, "name": name }))
            .await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn list_cafes(&self) -> Result<Vec<Cafe>, StoreError> {
        self.get_json("/rpc/cafes/list").await
    }

    async fn product_index(&self, cafe_id: &str) -> Result<Vec<StoredProduct>, StoreError> {
        let path = format!("/rpc/products/index?cafeId={}", urlencoding::encode(cafe_id));
        self.get_json(&path).await
    }

    async fn upsert_product(
        &self,
        cafe_id: &str,
        product: &ExtractedProduct,
    ) -> Result<UpsertOutcome, StoreError> {
        let payload = json!({ "cafeId": cafe_id, "product": product });
        let text = self.post("/rpc/products/upsert", &payload).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn mark_removed(
        &self,
        cafe_id: &str,
        current_external_ids: &[String],
    ) -> Result<RemovalOutcome, StoreError> {
        let payload = json!({ "cafeId": cafe_id, "currentExternalIds": current_external_ids });
        let text = self.post("/rpc/products/mark-removed", &payload).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn store_image(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, StoreError> {
        let url = format!("{}/rpc/images/store", self.base_url);
        debug!("store POST {} ({} bytes)", url, bytes.len());
        let response = self
            .authorize(self.client.post(&url))
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(rpc_error(status.as_u16(), "/rpc/images/store", &text));
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Receipt {
            storage_id: String,
        }
        let receipt: Receipt = serde_json::from_str(&text)?;
        Ok(receipt.storage_id)
    }

    async fn attach_image(&self, product_id: &str, storage_id: &str) -> Result<(), StoreError> {
        let payload = json!({ "productId": product_id, "storageId": storage_id });
        self.post("/rpc/products/attach-image", &payload).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UpsertAction;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_product() -> ExtractedProduct {
        ExtractedProduct {
            name: "아이스 아메리카노".to_string(),
            name_en: Some("Iced Americano".to_string()),
            description: None,
            price: Some(4500.0),
            external_image_url: "https://cdn.test/a.jpg".to_string(),
            category: "음료".to_string(),
            external_category: "에스프레소".to_string(),
            external_id: "sb-001".to_string(),
            external_url: "https://menu.test/view?id=sb-001".to_string(),
        }
    }

    #[tokio::test]
    async fn test_cafe_by_slug_found() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rpc/cafes/by-slug"))
            .and(query_param("slug", "starbucks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "c1", "name": "스타벅스", "slug": "starbucks"
            })))
            .mount(&mock_server)
            .await;

        let store = HttpStore::new(mock_server.uri(), None).unwrap();
        let cafe = store.cafe_by_slug("starbucks").await.unwrap().unwrap();
        assert_eq!(cafe.id, "c1");
        assert_eq!(cafe.name, "스타벅스");
    }

    #[tokio::test]
    async fn test_cafe_by_slug_encodes_korean_slugs() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rpc/cafes/by-slug"))
            .and(query_param("slug", "빽다방"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "c4", "name": "빽다방", "slug": "빽다방"
            })))
            .mount(&mock_server)
            .await;

        let store = HttpStore::new(mock_server.uri(), None).unwrap();
        let cafe = store.cafe_by_slug("빽다방").await.unwrap();
        assert!(cafe.is_some());
    }

    #[tokio::test]
    async fn test_cafe_by_slug_missing_is_none() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rpc/cafes/by-slug"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let store = HttpStore::new(mock_server.uri(), None).unwrap();
        assert!(store.cafe_by_slug("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cafe_by_slug_server_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rpc/cafes/by-slug"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let store = HttpStore::new(mock_server.uri(), None).unwrap();
        let err = store.cafe_by_slug("starbucks").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_deploy_key_sent_as_bearer() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rpc/cafes/list"))
            .and(header("Authorization", "Bearer deploy-key-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server)
            .await;

        let store =
            HttpStore::new(mock_server.uri(), Some("deploy-key-123".to_string())).unwrap();
        let cafes = store.list_cafes().await.unwrap();
        assert!(cafes.is_empty());
    }

    #[tokio::test]
    async fn test_product_index_decodes_stored_products() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rpc/products/index"))
            .and(query_param("cafeId", "c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "p1",
                "cafeId": "c1",
                "name": "아메리카노",
                "externalImageUrl": "https://cdn.test/a.jpg",
                "category": "음료",
                "externalCategory": "커피",
                "externalId": "sb-001",
                "externalUrl": "https://menu.test/view?id=sb-001",
                "isActive": true,
                "addedAt": "2025-03-01T09:00:00Z",
                "updatedAt": "2025-03-05T09:00:00Z"
            }])))
            .mount(&mock_server)
            .await;

        let store = HttpStore::new(mock_server.uri(), None).unwrap();
        let index = store.product_index("c1").await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].external_id, "sb-001");
        assert!(index[0].is_active);
        assert!(index[0].image_storage_id.is_none());
        assert!(index[0].removed_at.is_none());
    }

    #[tokio::test]
    async fn test_upsert_posts_payload_and_decodes_outcome() {
        let mock_server = MockServer::start().await;
        let product = make_product();
        Mock::given(method("POST"))
            .and(path("/rpc/products/upsert"))
            .and(body_json(json!({ "cafeId": "c1", "product": product })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "action": "created", "id": "p9"
            })))
            .mount(&mock_server)
            .await;

        let store = HttpStore::new(mock_server.uri(), None).unwrap();
        let outcome = store.upsert_product("c1", &product).await.unwrap();
        assert_eq!(outcome.action, UpsertAction::Created);
        assert_eq!(outcome.id, "p9");
    }

    #[tokio::test]
    async fn test_mark_removed_round_trip() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rpc/products/mark-removed"))
            .and(body_json(json!({
                "cafeId": "c1",
                "currentExternalIds": ["sb-001", "sb-002"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "removed": 2,
                "reactivated": 1,
                "removedProducts": ["돌체 라떼", "민트 모카"],
                "reactivatedProducts": ["아포가토"]
            })))
            .mount(&mock_server)
            .await;

        let store = HttpStore::new(mock_server.uri(), None).unwrap();
        let ids = vec!["sb-001".to_string(), "sb-002".to_string()];
        let outcome = store.mark_removed("c1", &ids).await.unwrap();
        assert_eq!(outcome.removed, 2);
        assert_eq!(outcome.reactivated, 1);
        assert_eq!(outcome.removed_products, vec!["돌체 라떼", "민트 모카"]);
    }

    #[tokio::test]
    async fn test_rpc_failure_surfaces_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rpc/products/upsert"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(json!({ "message": "external id already taken" })),
            )
            .mount(&mock_server)
            .await;

        let store = HttpStore::new(mock_server.uri(), None).unwrap();
        let err = store.upsert_product("c1", &make_product()).await.unwrap_err();
        assert!(matches!(err, StoreError::Rpc(_)));
        assert!(err.to_string().contains("external id already taken"));
    }

    #[tokio::test]
    async fn test_rpc_failure_without_message_keeps_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rpc/cafes/ensure"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let store = HttpStore::new(mock_server.uri(), None).unwrap();
        let err = store.ensure_cafe("mega", "메가커피").await.unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_store_image_sends_bytes_with_content_type() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rpc/images/store"))
            .and(header("Content-Type", "image/png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "storageId": "st-42"
            })))
            .mount(&mock_server)
            .await;

        let store = HttpStore::new(mock_server.uri(), None).unwrap();
        let storage_id = store
            .store_image(vec![0x89, 0x50, 0x4E, 0x47], "image/png")
            .await
            .unwrap();
        assert_eq!(storage_id, "st-42");
    }

    #[tokio::test]
    async fn test_attach_image_posts_ids() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rpc/products/attach-image"))
            .and(body_json(json!({ "productId": "p9", "storageId": "st-42" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .mount(&mock_server)
            .await;

        let store = HttpStore::new(mock_server.uri(), None).unwrap();
        store.attach_image("p9", "st-42").await.unwrap();
    }

    #[tokio::test]
    async fn test_trailing_slash_trimmed_from_base_url() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rpc/cafes/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "c1", "name": "메가커피", "slug": "mega" }
            ])))
            .mount(&mock_server)
            .await;

        let store = HttpStore::new(format!("{}/", mock_server.uri()), None).unwrap();
        let cafes = store.list_cafes().await.unwrap();
        assert_eq!(cafes[0].slug, "mega");
    }
}

//! End-to-end reconciliation tests: a crawl batch file driven through
//! the reconciler against the in-memory store.

use cafe_crawler::model::ExtractedProduct;
use cafe_crawler::reconcile::reconcile;
use cafe_crawler::store::{MemoryStore, ProductStore};

const MEGA_BATCH: &str = include_str!("fixtures/mega_batch.json");

fn batch() -> Vec<ExtractedProduct> {
    serde_json::from_str(MEGA_BATCH).unwrap()
}

#[tokio::test]
async fn test_first_upload_then_steady_state() {
    let store = MemoryStore::new();
    store.seed_cafe("mega", "메가커피");

    let report = reconcile(&store, &batch(), "mega", None, false).await.unwrap();
    assert_eq!(report.processed, 3);
    assert_eq!(report.created, 3);
    assert!(report.is_clean());

    let stored = store.snapshot();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|p| p.is_active));
    assert!(stored.iter().all(|p| p.added_at == p.updated_at));

    // A crawl that found the same menu again changes nothing.
    let report = reconcile(&store, &batch(), "mega", None, false).await.unwrap();
    assert_eq!(report.unchanged, 3);
    assert_eq!(report.created, 0);
    assert_eq!(report.updated, 0);

    let after = store.snapshot();
    for (before, now) in stored.iter().zip(after.iter()) {
        assert_eq!(before.updated_at, now.updated_at);
    }
}

#[tokio::test]
async fn test_content_drift_updates_one_record() {
    let store = MemoryStore::new();
    let cafe = store.seed_cafe("mega", "메가커피");
    reconcile(&store, &batch(), "mega", None, false).await.unwrap();

    let mut drifted = batch();
    drifted[1].description = Some("꿀을 더 넣은 새 레시피".to_string());

    let report = reconcile(&store, &drifted, "mega", None, false).await.unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(report.unchanged, 2);

    let honey = store.product(&cafe.id, "mega_음료_꿀아메리카노").unwrap();
    assert_eq!(honey.description.as_deref(), Some("꿀을 더 넣은 새 레시피"));
    assert!(honey.updated_at > honey.added_at);

    // The untouched records keep their original timestamps.
    let plain = store.product(&cafe.id, "mega_음료_아메리카노").unwrap();
    assert_eq!(plain.updated_at, plain.added_at);
}

#[tokio::test]
async fn test_menu_rotation_cycle() {
    let store = MemoryStore::new();
    let cafe = store.seed_cafe("mega", "메가커피");
    reconcile(&store, &batch(), "mega", None, false).await.unwrap();

    // The strawberry latte rotates off the menu.
    let shrunk: Vec<ExtractedProduct> =
        batch().into_iter().filter(|p| p.name != "딸기라떼").collect();
    let report = reconcile(&store, &shrunk, "mega", None, false).await.unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(report.removed_names, vec!["딸기라떼"]);

    let latte = store.product(&cafe.id, "mega_음료_딸기라떼").unwrap();
    assert!(!latte.is_active);
    assert!(latte.removed_at.is_some());
    let updated_at_while_gone = latte.updated_at;

    // Next season it comes back.
    let report = reconcile(&store, &batch(), "mega", None, false).await.unwrap();
    assert_eq!(report.reactivated, 1);
    assert_eq!(report.reactivated_names, vec!["딸기라떼"]);
    assert_eq!(report.created, 0);

    let latte = store.product(&cafe.id, "mega_음료_딸기라떼").unwrap();
    assert!(latte.is_active);
    assert!(latte.removed_at.is_none());
    assert!(latte.updated_at > updated_at_while_gone);
}

#[tokio::test]
async fn test_dry_run_predicts_without_writing() {
    let store = MemoryStore::new();
    store.seed_cafe("mega", "메가커피");
    reconcile(&store, &batch(), "mega", None, false).await.unwrap();
    let before = store.snapshot();

    let mut next = batch();
    next[0].description = Some("설명이 바뀌었다".to_string());
    next.remove(2);

    let report = reconcile(&store, &next, "mega", None, true).await.unwrap();
    assert!(report.dry_run);
    assert_eq!(report.updated, 1);
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.removed, 1);
    assert!(!report.sample.is_empty());

    let after = store.snapshot();
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.updated_at, a.updated_at);
        assert_eq!(b.is_active, a.is_active);
        assert_eq!(b.description, a.description);
    }
}

#[tokio::test]
async fn test_unknown_cafe_is_created_once_named() {
    let store = MemoryStore::new();

    let err = reconcile(&store, &batch(), "mega", None, false).await.unwrap_err();
    assert!(err.to_string().contains("--cafe-name"));

    let report = reconcile(&store, &batch(), "mega", Some("메가커피"), false).await.unwrap();
    assert_eq!(report.created, 3);

    let cafes = store.list_cafes().await.unwrap();
    assert_eq!(cafes.len(), 1);
    assert_eq!(cafes[0].slug, "mega");
    assert_eq!(cafes[0].name, "메가커피");
}

//! Integration tests: listing store behaviour over each backend, and the
//! overlapping read-modify-write cases.

use std::sync::Arc;

use chrono::Utc;
use quadmart_db::{FileKv, KvBackend, ListingStore, MemoryKv, SqliteKv};
use quadmart_types::{CategoryId, Listing, ListingId, ListingStatus};

fn listing(id: &str, title: &str) -> Listing {
    Listing {
        id: ListingId::from(id),
        title: title.to_string(),
        description: "Gently used".into(),
        price: "20.00".into(),
        category_id: CategoryId(2),
        open_to_offer: true,
        photos: vec!["file:///photo.jpg".into()],
        status: ListingStatus::Published,
        created_at: Utc::now(),
    }
}

fn ids(listings: &[Listing]) -> Vec<&str> {
    listings.iter().map(|l| l.id.as_str()).collect()
}

async fn exercise_backend<B: KvBackend>(store: ListingStore<B>) {
    assert!(store.load_all().await.is_empty());

    let chair = listing("A", "Red Chair");
    store.append(chair.clone()).await.unwrap();
    store.append(listing("B", "Lamp")).await.unwrap();
    store.append(listing("C", "Desk")).await.unwrap();

    let all = store.load_all().await;
    assert_eq!(all[0], chair);
    assert_eq!(ids(&all), ["A", "B", "C"]);

    store.remove_by_id(&ListingId::from("B")).await.unwrap();
    assert_eq!(ids(&store.load_all().await), ["A", "C"]);

    store.clear_all().await.unwrap();
    assert!(store.load_all().await.is_empty());
    assert!(store.load_all().await.is_empty());
}

#[tokio::test]
async fn memory_backend() {
    exercise_backend(ListingStore::new(MemoryKv::new())).await;
}

#[tokio::test]
async fn sqlite_backend() {
    exercise_backend(ListingStore::new(SqliteKv::open_in_memory().unwrap())).await;
}

#[tokio::test]
async fn file_backend() {
    let dir = tempfile::tempdir().unwrap();
    let kv = FileKv::new(dir.path().to_path_buf()).await.unwrap();
    exercise_backend(ListingStore::new(kv)).await;
}

#[tokio::test]
async fn append_only_growth_preserves_call_order() {
    let store = ListingStore::new(MemoryKv::new());
    let expected: Vec<String> = (0..25).map(|i| format!("id-{i:02}")).collect();

    for id in &expected {
        store.append(listing(id, "Thing")).await.unwrap();
    }

    let all = store.load_all().await;
    assert_eq!(all.len(), expected.len());
    assert_eq!(ids(&all), expected.iter().map(String::as_str).collect::<Vec<_>>());
}

#[tokio::test]
async fn persisted_blob_is_a_camel_case_json_array() {
    let kv = MemoryKv::new();
    let store = ListingStore::new(kv.clone());
    store.append(listing("A", "Red Chair")).await.unwrap();

    let raw = kv.raw("listings").unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let first = &value.as_array().unwrap()[0];
    assert_eq!(first["title"], "Red Chair");
    assert_eq!(first["categoryId"], 2);
    assert_eq!(first["openToOffer"], true);
    assert_eq!(first["status"], "published");
}

#[tokio::test]
async fn separate_stores_on_one_backend_lose_an_update() {
    // Both appends read the same empty collection before either writes.
    let kv = MemoryKv::with_read_rendezvous(2);
    let first = ListingStore::new(kv.clone());
    let second = ListingStore::new(kv.clone());

    let (a, b) = tokio::join!(
        first.append(listing("A", "Red Chair")),
        second.append(listing("B", "Blue Chair")),
    );
    a.unwrap();
    b.unwrap();

    let all = first.load_all().await;
    assert_eq!(all.len(), 1, "last writer wins");
    assert!(all[0].id.as_str() == "A" || all[0].id.as_str() == "B");
}

#[tokio::test]
async fn shared_store_serializes_concurrent_appends() {
    let store = Arc::new(ListingStore::new(MemoryKv::new()));

    let mut tasks = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            store.append(listing(&format!("L{i}"), "Thing")).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let all = store.load_all().await;
    assert_eq!(all.len(), 16);
    for i in 0..16 {
        let id = format!("L{i}");
        assert!(all.iter().any(|l| l.id.as_str() == id), "missing {id}");
    }
}

#[tokio::test]
async fn shared_store_keeps_remove_racing_append() {
    let store = Arc::new(ListingStore::new(MemoryKv::new()));
    store.append(listing("A", "Chair")).await.unwrap();
    store.append(listing("B", "Lamp")).await.unwrap();

    let a_id = ListingId::from("A");
    let (removed, appended) = tokio::join!(
        store.remove_by_id(&a_id),
        store.append(listing("C", "Desk")),
    );
    assert!(removed.unwrap());
    appended.unwrap();

    assert_eq!(ids(&store.load_all().await), ["B", "C"]);
}

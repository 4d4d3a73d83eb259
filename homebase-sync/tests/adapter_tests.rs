mod common;

use homebase_model::{Account, Cadence, Habit, HabitLog, Item, Location, SyncModel, Transaction};
use homebase_storage::{MemoryRecordStore, RecordStore};
use homebase_sync::{AdapterRegistry, EntityAdapter, ModelAdapter, SyncConfiguration, SyncError};
use homebase_types::{EntityKind, FeatureGroup, RecordId, SyncPayload};
use common::FragileItem;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn item(name: &str, tags: &[&str]) -> Item {
    let mut item = Item::new(name, 1);
    item.tags = tags.iter().map(|t| t.to_string()).collect();
    item
}

fn item_adapter(records: Vec<Item>) -> (Arc<MemoryRecordStore<Item>>, ModelAdapter<Item>) {
    let store = Arc::new(MemoryRecordStore::with_records(records));
    let adapter = ModelAdapter::new(store.clone() as Arc<dyn RecordStore<Item>>);
    (store, adapter)
}

// ── ModelAdapter ─────────────────────────────────────────────────

#[tokio::test]
async fn fetch_local_snapshots_every_record() {
    let a = item("Drill", &["tools"]);
    let b = item("Ladder", &[]);
    let (_, adapter) = item_adapter(vec![a.clone(), b.clone()]);

    assert_eq!(adapter.kind(), EntityKind::Item);
    let mut payloads = adapter.fetch_local().await.unwrap().payloads;
    payloads.sort_by_key(|p| p.id);

    let mut expected = vec![a.to_payload().unwrap(), b.to_payload().unwrap()];
    expected.sort_by_key(|p| p.id);
    assert_eq!(payloads, expected);
    assert!(payloads.iter().all(SyncPayload::verify));
}

#[tokio::test]
async fn fetch_local_reports_records_that_fail_to_encode() {
    let healthy = FragileItem::new("Receipt");
    let mut broken = FragileItem::new("Warranty");
    broken.unencodable = true;
    let store = Arc::new(MemoryRecordStore::with_records([healthy.clone(), broken.clone()]));
    let adapter = ModelAdapter::new(store as Arc<dyn RecordStore<FragileItem>>);

    let snapshot = adapter.fetch_local().await.unwrap();
    assert_eq!(snapshot.payloads, vec![healthy.to_payload().unwrap()]);
    assert_eq!(snapshot.failed, vec![broken.id]);
    assert_eq!(snapshot.len(), 2);
}

#[tokio::test]
async fn apply_remote_inserts_new_record() {
    let (store, adapter) = item_adapter(vec![]);
    let incoming = item("Tent", &["camping"]);

    adapter.apply_remote(&incoming.to_payload().unwrap()).await.unwrap();

    assert_eq!(store.find_by_id(&incoming.id).unwrap(), Some(incoming));
}

#[tokio::test]
async fn apply_remote_merges_tags_and_replaces_scalars() {
    let local = item("Drill", &["tools", "garage"]);
    let (store, adapter) = item_adapter(vec![local.clone()]);

    let mut incoming = local.clone();
    incoming.name = "Cordless drill".into();
    incoming.quantity = 2;
    incoming.tags = vec!["power".into(), "tools".into()];

    adapter.apply_remote(&incoming.to_payload().unwrap()).await.unwrap();

    let merged = store.find_by_id(&local.id).unwrap().unwrap();
    assert_eq!(merged.name, "Cordless drill");
    assert_eq!(merged.quantity, 2);
    assert_eq!(merged.tags, vec!["tools", "garage", "power"]);
}

#[tokio::test]
async fn apply_remote_is_idempotent() {
    let local = item("Drill", &["tools"]);
    let (store, adapter) = item_adapter(vec![local.clone()]);
    let mut incoming = local.clone();
    incoming.tags = vec!["power".into()];
    let payload = incoming.to_payload().unwrap();

    adapter.apply_remote(&payload).await.unwrap();
    let once = store.find_by_id(&local.id).unwrap();
    adapter.apply_remote(&payload).await.unwrap();
    let twice = store.find_by_id(&local.id).unwrap();

    assert_eq!(once, twice);
    assert_eq!(store.len().unwrap(), 1);
}

#[tokio::test]
async fn apply_remote_rejects_corrupt_payload_as_codec_error() {
    let (store, adapter) = item_adapter(vec![]);
    let id = RecordId::new();

    let garbage = SyncPayload::new(id, b"{\"not\":\"an item\"}".to_vec());
    let err = adapter.apply_remote(&garbage).await.unwrap_err();
    assert!(matches!(err, SyncError::Codec { kind: EntityKind::Item, .. }));
    assert!(err.is_record_scoped());

    let mut tampered = item("Saw", &[]).to_payload().unwrap();
    tampered.checksum = "0".repeat(64);
    assert!(adapter.apply_remote(&tampered).await.unwrap_err().is_record_scoped());

    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn apply_remote_rejects_mismatched_id() {
    let (_, adapter) = item_adapter(vec![]);
    let record = item("Hammer", &[]);
    let payload = SyncPayload::new(RecordId::new(), serde_json::to_vec(&record).unwrap());

    let err = adapter.apply_remote(&payload).await.unwrap_err();
    assert!(err.is_record_scoped());
}

#[tokio::test]
async fn delete_local_removes_and_tolerates_absence() {
    let a = item("Drill", &[]);
    let b = item("Saw", &[]);
    let (store, adapter) = item_adapter(vec![a.clone(), b.clone()]);

    adapter.delete_local(a.id).await.unwrap();
    adapter.delete_local(a.id).await.unwrap();
    adapter.delete_local(RecordId::new()).await.unwrap();

    assert_eq!(store.fetch_all().unwrap(), vec![b]);
}

#[tokio::test]
async fn scalar_only_models_replace_wholesale() {
    let account = Account::new("Checking", "EUR");
    let store = Arc::new(MemoryRecordStore::with_records([account.clone()]));
    let adapter = ModelAdapter::new(store.clone() as Arc<dyn RecordStore<Account>>);

    let mut incoming = account.clone();
    incoming.archived = true;
    incoming.opening_balance_minor = 12_50;
    adapter.apply_remote(&incoming.to_payload().unwrap()).await.unwrap();

    assert_eq!(store.find_by_id(&account.id).unwrap(), Some(incoming));
}

// ── Registry ─────────────────────────────────────────────────────

fn full_registry() -> AdapterRegistry {
    AdapterRegistry::new()
        .with_model::<Item>(Arc::new(MemoryRecordStore::<Item>::new()))
        .with_model::<Location>(Arc::new(MemoryRecordStore::<Location>::new()))
        .with_model::<Account>(Arc::new(MemoryRecordStore::<Account>::new()))
        .with_model::<Transaction>(Arc::new(MemoryRecordStore::<Transaction>::new()))
        .with_model::<Habit>(Arc::new(MemoryRecordStore::<Habit>::new()))
        .with_model::<HabitLog>(Arc::new(MemoryRecordStore::<HabitLog>::new()))
}

#[test]
fn registry_indexes_by_kind() {
    let registry = full_registry();
    assert_eq!(registry.len(), EntityKind::ALL.len());
    assert_eq!(registry.kinds().collect::<Vec<_>>(), EntityKind::ALL.to_vec());
    for kind in EntityKind::ALL {
        assert_eq!(registry.get(kind).unwrap().kind(), kind);
    }
}

#[tokio::test]
async fn registering_twice_replaces() {
    let first = Arc::new(MemoryRecordStore::<Habit>::new());
    let second = Arc::new(MemoryRecordStore::with_records([Habit::new("Read", Cadence::Daily)]));

    let registry = AdapterRegistry::new()
        .with_model::<Habit>(first)
        .with_model::<Habit>(second);
    assert_eq!(registry.len(), 1);

    let local = registry.get(EntityKind::Habit).unwrap().fetch_local().await.unwrap();
    assert_eq!(local.len(), 1);
}

#[test]
fn active_set_follows_feature_permissions() {
    let registry = full_registry();
    let config = SyncConfiguration::from_json(
        br#"{"featurePermissions":{"finances":false}}"#,
    )
    .unwrap();

    let active: Vec<EntityKind> = registry.active(&config).iter().map(|a| a.kind()).collect();
    assert_eq!(
        active,
        vec![
            EntityKind::Item,
            EntityKind::Location,
            EntityKind::Habit,
            EntityKind::HabitLog
        ]
    );
    assert!(active.iter().all(|k| k.feature() != FeatureGroup::Finances));
}

#[test]
fn empty_registry_has_no_active_adapters() {
    let registry = AdapterRegistry::new();
    assert!(registry.is_empty());
    assert!(registry.active(&SyncConfiguration::default()).is_empty());
}

//! End-to-end behaviour of the session store through its public contract.

use history::core::clock::ManualClock;
use history::core::platform::FileStorage;
use history::session::export::deliver_to;
use history::{
    AnalysisFilter, ComparisonSelection, MemoryStorage, Risk, SelectionState, SessionExport,
    SessionStore, Storage, StorageError, StoreConfig,
};
use serde_json::{json, Value};
use time::macros::datetime;

fn clock() -> ManualClock {
    ManualClock::new(datetime!(2025-03-01 08:00 UTC))
}

fn memory_store() -> SessionStore<MemoryStorage, ManualClock> {
    SessionStore::open_with_clock(MemoryStorage::new(), StoreConfig::default(), clock()).unwrap()
}

fn payload(title: &str, score: f64) -> Value {
    json!({
        "title": title,
        "source": "wire.example",
        "credibilityScore": score,
        "classification": "LIKELY_FAKE",
        "claims": [{ "text": title, "verdict": "unsupported" }]
    })
}

/// Adapter whose medium cannot be read at all.
struct UnreadableStorage;

impl Storage for UnreadableStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::ReadFailure {
            key: key.to_string(),
            reason: "permission denied".to_string(),
        })
    }

    fn write(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Ok(())
    }

    fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Scores with all 17 significant digits, spread over [0, 1).
fn full_precision_scores(count: usize) -> Vec<f64> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut scores = vec![0.21291890726713458, 0.1 + 0.2, 1.0 / 3.0];
    while scores.len() < count {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        scores.push((state >> 11) as f64 / (1u64 << 53) as f64);
    }
    scores
}

/// Adapter whose writes always fail with a non-capacity error.
struct BrokenStorage;

impl Storage for BrokenStorage {
    fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn write(&mut self, key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::WriteFailure {
            key: key.to_string(),
            reason: "read-only medium".to_string(),
        })
    }

    fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

#[test]
fn scenario_three_analyses() {
    let mut store = memory_store();
    let scores = [0.89, 0.18, 0.52];
    let records: Vec<_> = scores
        .iter()
        .enumerate()
        .map(|(i, score)| {
            store.clock().advance_ms(1_000);
            store.add_analysis(payload(&format!("article {i}"), *score))
        })
        .collect();

    let levels: Vec<_> = records.iter().map(|r| r.risk()).collect();
    assert_eq!(levels, [Risk::High, Risk::Safe, Risk::Medium]);

    let stats = store.get_statistics();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.distribution.high, 1);
    assert_eq!(stats.distribution.medium, 1);
    assert_eq!(stats.distribution.low, 0);
    assert_eq!(stats.distribution.safe, 1);
    assert!((stats.avg_score - 0.53).abs() < 1e-9);
    let range = stats.time_range.unwrap();
    assert_eq!(range.earliest, records[0].timestamp);
    assert_eq!(range.latest, records[2].timestamp);

    let series: Vec<_> = store
        .get_time_series_data()
        .into_iter()
        .map(|point| point.score)
        .collect();
    assert_eq!(series, scores);
}

#[test]
fn capacity_evicts_oldest_and_keeps_relative_order() {
    let mut store = memory_store();
    let ids: Vec<_> = (1..=51)
        .map(|i| store.add_analysis(payload(&format!("r{i}"), 0.5)).id)
        .collect();

    assert_eq!(store.len(), 50);
    assert!(store.get_analysis_by_id(&ids[0]).is_none());
    let stored: Vec<_> = store.get_analyses(None).iter().map(|r| r.id.clone()).collect();
    assert_eq!(stored, ids[1..]);
}

#[test]
fn every_save_respects_capacity() {
    let mut store = memory_store();
    let key = store.config().storage_key.clone();
    for i in 0..120 {
        store.add_analysis(payload(&format!("r{i}"), (i % 10) as f64 / 10.0));
        assert!(store.get_analyses(None).len() <= 50);
        let persisted: Value =
            serde_json::from_str(store.storage().get(&key).unwrap()).unwrap();
        assert!(persisted["analyses"].as_array().unwrap().len() <= 50);
    }
}

#[test]
fn two_overflow_additions_evict_the_two_oldest() {
    let mut store = memory_store();
    let ids: Vec<_> = (0..52)
        .map(|i| store.add_analysis(payload(&format!("r{i}"), 0.1)).id)
        .collect();
    assert_eq!(store.len(), 50);
    assert!(store.get_analysis_by_id(&ids[0]).is_none());
    assert!(store.get_analysis_by_id(&ids[1]).is_none());
    assert!(store.get_analysis_by_id(&ids[2]).is_some());
    assert!(store.get_analysis_by_id(&ids[51]).is_some());
}

#[test]
fn delete_removes_exactly_one_or_nothing() {
    let mut store = memory_store();
    let a = store.add_analysis(payload("a", 0.2));
    let b = store.add_analysis(payload("b", 0.4));
    let writes = store.storage().write_count();

    assert!(!store.delete_analysis("analysis-missing"));
    assert_eq!(store.len(), 2);
    assert_eq!(store.storage().write_count(), writes);

    assert!(store.delete_analysis(&a.id));
    assert_eq!(store.len(), 1);
    assert_eq!(store.get_analyses(None)[0].id, b.id);
    assert!(store.get_analysis_by_id(&a.id).is_none());
}

#[test]
fn clear_history_starts_a_new_document() {
    let mut store = memory_store();
    store.add_analysis(payload("a", 0.2));
    store.clock().advance_ms(5_000);
    store.clear_history();

    assert!(store.is_empty());
    let stats = store.get_statistics();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.time_range, None);

    store.reload();
    assert!(store.is_empty());
    assert_eq!(
        store.history().metadata.created,
        history::core::format::epoch_millis(datetime!(2025-03-01 08:00:05 UTC))
    );
}

#[test]
fn generic_write_failure_still_returns_the_record() {
    let mut store =
        SessionStore::open_with_clock(BrokenStorage, StoreConfig::default(), clock()).unwrap();
    let record = store.add_analysis(payload("offline", 0.75));
    assert_eq!(record.risk(), Risk::High);
    assert!(!store.is_durable());
    assert_eq!(store.get_analyses(None).len(), 1);
    assert!(store.save().is_err());
}

#[test]
fn filters_combine_with_and() {
    let mut store = memory_store();
    for (title, source, score) in [
        ("Flood warning", "Met Office", 0.1),
        ("Flood hoax", "chain letter", 0.9),
        ("Budget", "FLOOD watch", 0.6),
    ] {
        store.add_analysis(json!({ "title": title, "source": source, "credibilityScore": score }));
    }

    let flood = AnalysisFilter::default().search("flood");
    assert_eq!(store.get_analyses(Some(&flood)).len(), 3);

    let risky_flood = flood.clone().min_score(0.5);
    assert_eq!(store.get_analyses(Some(&risky_flood)).len(), 2);

    let high_only = risky_flood.risk(Risk::High);
    let found = store.get_analyses(Some(&high_only));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Flood hoax");
}

#[test]
fn comparison_resolves_selected_records() {
    let mut store = memory_store();
    let a = store.add_analysis(payload("a", 0.2));
    let b = store.add_analysis(payload("b", 0.6));
    let c = store.add_analysis(payload("c", 0.9));

    let mut selection = ComparisonSelection::new();
    selection.toggle(a.id.clone());
    assert!(store.comparison_pair(&selection).is_none());
    selection.toggle(b.id.clone());
    assert_eq!(selection.toggle(c.id.clone()), SelectionState::Two);
    assert_eq!(selection.ids(), [b.id.clone(), c.id.clone()]);

    let (left, right) = store.comparison_pair(&selection).unwrap();
    assert_eq!(left.title, "b");
    assert_eq!(right.title, "c");

    store.delete_analysis(&c.id);
    assert!(store.comparison_pair(&selection).is_none());
}

#[test]
fn export_round_trips_through_import() {
    let mut store = memory_store();
    for (title, score) in [("x", 0.3), ("y", 0.71), ("z", 0.5)] {
        store.clock().advance_ms(10);
        store.add_analysis(payload(title, score));
    }

    let export = store.export_session();
    assert_eq!(export.metadata.total_analyses, 3);
    assert_eq!(export.metadata.statistics, store.get_statistics());
    let artifact = export.to_artifact().unwrap();
    assert_eq!(artifact.filename, "session-2025-03-01.json");

    let parsed = SessionExport::from_json(&artifact.contents).unwrap();
    let original: Vec<_> = store.get_analyses(None).into_iter().cloned().collect();
    assert_eq!(parsed.analyses, original);

    let mut restored = memory_store();
    restored.add_analysis(payload("to be replaced", 0.0));
    assert_eq!(restored.import_session(&artifact.contents).unwrap(), 3);
    let restored_records: Vec<_> = restored.get_analyses(None).into_iter().cloned().collect();
    assert_eq!(restored_records, original);
    assert!(restored.is_durable());
}

#[test]
fn import_rejects_garbage_without_touching_history() {
    let mut store = memory_store();
    store.add_analysis(payload("keep", 0.2));
    assert!(store.import_session("[1, 2, 3]").is_err());
    assert_eq!(store.len(), 1);
}

#[test]
fn recent_first_reverses_insertion_order() {
    let mut store = memory_store();
    for title in ["one", "two", "three"] {
        store.add_analysis(payload(title, 0.4));
    }
    let titles: Vec<_> = store.recent_first().iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["three", "two", "one"]);
}

#[test]
fn file_storage_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::with_capacity(5);

    let first_id = {
        let mut store =
            SessionStore::open_with_clock(FileStorage::new(dir.path()), config.clone(), clock())
                .unwrap();
        let record = store.add_analysis(payload("persisted", 0.65));
        assert!(store.is_durable());
        record.id
    };

    let store =
        SessionStore::open_with_clock(FileStorage::new(dir.path()), config, clock()).unwrap();
    let record = store.get_analysis_by_id(&first_id).unwrap();
    assert_eq!(record.title, "persisted");
    assert_eq!(record.risk(), Risk::Medium);
    assert_eq!(record.result["claims"][0]["verdict"], "unsupported");

    let artifact = store.export_session().to_artifact().unwrap();
    let path = deliver_to(&dir.path().join("exports"), &artifact).unwrap();
    assert!(path.ends_with("session-2025-03-01.json"));
}

#[test]
fn file_quota_triggers_truncating_retry() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SessionStore::open_with_clock(
        FileStorage::new(dir.path()),
        StoreConfig::with_capacity(8),
        clock(),
    )
    .unwrap();
    for i in 0..8 {
        store.add_analysis(payload(&format!("r{i}"), 0.3));
    }
    let key = store.config().storage_key.clone();
    let size = store.storage().read(&key).unwrap().unwrap().len();

    // Room for roughly half of the current document.
    let mut reopened = SessionStore::open_with_clock(
        FileStorage::new(dir.path()).with_quota(size * 3 / 4),
        StoreConfig::with_capacity(8),
        clock(),
    )
    .unwrap();
    reopened.add_analysis(payload("r8", 0.3));

    assert!(reopened.is_durable());
    let titles: Vec<_> = reopened
        .get_analyses(None)
        .iter()
        .map(|r| r.title.clone())
        .collect();
    assert_eq!(titles, ["r5", "r6", "r7", "r8"]);
}

#[test]
fn full_precision_scores_survive_export_and_reload() {
    let mut store = memory_store();
    let added: Vec<_> = full_precision_scores(50)
        .into_iter()
        .enumerate()
        .map(|(i, score)| {
            store.add_analysis(json!({
                "title": format!("article {i}"),
                "credibilityScore": score,
                "features": { "sentiment": score / 7.0 }
            }))
        })
        .collect();

    let exported = store.export_session().to_artifact().unwrap();
    let parsed = SessionExport::from_json(&exported.contents).unwrap();
    assert_eq!(parsed.analyses, added);

    let blob = store.storage().clone();
    let reopened = SessionStore::open_with_clock(blob, StoreConfig::default(), clock()).unwrap();
    let reloaded: Vec<_> = reopened.get_analyses(None).into_iter().cloned().collect();
    assert_eq!(reloaded, added);
    for (before, after) in added.iter().zip(&reloaded) {
        assert_eq!(
            before.credibility_score.to_bits(),
            after.credibility_score.to_bits()
        );
    }
}

#[test]
fn unreadable_medium_opens_an_empty_history() {
    let store =
        SessionStore::open_with_clock(UnreadableStorage, StoreConfig::default(), clock()).unwrap();
    assert!(store.is_empty());
    assert_eq!(store.get_statistics().total, 0);
    assert_eq!(
        store.history().metadata.created,
        history::core::format::epoch_millis(datetime!(2025-03-01 08:00 UTC))
    );
}

#[test]
fn oversized_stored_history_is_trimmed_on_open() {
    let mut large = SessionStore::open_with_clock(
        MemoryStorage::new(),
        StoreConfig::with_capacity(10),
        clock(),
    )
    .unwrap();
    let ids: Vec<_> = (0..10)
        .map(|i| large.add_analysis(payload(&format!("r{i}"), 0.4)).id)
        .collect();

    let small = SessionStore::open_with_clock(
        large.storage().clone(),
        StoreConfig::with_capacity(4),
        clock(),
    )
    .unwrap();
    let kept: Vec<_> = small.get_analyses(None).iter().map(|r| r.id.clone()).collect();
    assert_eq!(kept, ids[6..]);
    assert_eq!(small.len(), 4);
}

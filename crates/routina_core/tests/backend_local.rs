use routina_core::backend::FileSlot;
use routina_core::{Collection, CollectionBackend, DataService, LocalBackend};
use serde_json::json;
use std::fs;

#[test]
fn file_slot_persists_across_handles() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut backend = LocalBackend::in_dir(dir.path());
        backend
            .set(Collection::Goals, &json!([{"id": "g1", "title": "Run"}]))
            .unwrap();
    }

    let blob_path = dir.path().join("routina_app_data.json");
    assert!(blob_path.exists());
    assert!(!dir.path().join("routina_app_data.json.tmp").exists());

    let mut reopened = LocalBackend::in_dir(dir.path());
    assert_eq!(
        reopened.get(Collection::Goals).unwrap(),
        Some(json!([{"id": "g1", "title": "Run"}]))
    );
}

#[test]
fn missing_data_dir_is_created_on_first_write() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("state").join("routina");
    let mut backend = LocalBackend::in_dir(&nested);

    assert_eq!(backend.get(Collection::Tasks).unwrap(), None);
    backend.set(Collection::TotalStreak, &json!("1")).unwrap();

    assert_eq!(backend.slot().path(), FileSlot::in_dir(&nested).path());
    assert!(nested.join("routina_app_data.json").exists());
}

#[test]
fn corrupted_file_reads_as_empty_and_is_repaired_by_next_write() {
    let dir = tempfile::tempdir().unwrap();
    let blob_path = dir.path().join("routina_app_data.json");
    fs::write(&blob_path, "{\"tasks\": [").unwrap();

    let mut service = DataService::new(LocalBackend::in_dir(dir.path()));
    assert!(service.get_all_tasks().unwrap().is_empty());
    assert_eq!(service.get_total_streak().unwrap(), 0);

    service.update_total_streak(3).unwrap();
    let repaired: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&blob_path).unwrap()).unwrap();
    assert_eq!(repaired, json!({"totalStreak": "3"}));
}

#[test]
fn legacy_blob_with_string_encoded_values_is_readable() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = json!({
        "tasks": [{
            "id": "1",
            "title": "Revise Linked Lists",
            "type": "daily",
            "completed": "true",
            "streak": "3",
            "category": "study",
            "emoji": "📚",
            "priority": "high",
            "tags": "[\"dsa\"]",
            "createdAt": "2025-01-01T09:00:00Z"
        }],
        "totalStreak": "7"
    });
    fs::write(dir.path().join("routina_app_data.json"), legacy.to_string()).unwrap();

    let mut service = DataService::new(LocalBackend::in_dir(dir.path()));
    let tasks = service.get_all_tasks().unwrap();

    assert_eq!(tasks.len(), 1);
    assert!(tasks[0].completed);
    assert_eq!(tasks[0].streak, 3);
    assert_eq!(tasks[0].tags, vec!["dsa".to_string()]);
    assert_eq!(service.get_total_streak().unwrap(), 7);
}

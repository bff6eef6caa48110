use chrono::NaiveDate;
use routina_core::backend::MemorySlot;
use routina_core::{
    Clock, Collection, CollectionBackend, DataService, DbSource, EntityId, FixedClock, GoalPatch,
    LocalBackend, NewGoal, NewReflection, NewTask, NewWorkSession, Priority, ReflectionPatch,
    SequentialIds, SqliteBackend, TaskKind, TaskPatch, WorkSessionPatch,
};
use serde_json::{json, Value};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
}

fn service_over<B: CollectionBackend>(backend: B) -> DataService<B, FixedClock, SequentialIds> {
    DataService::with_collaborators(backend, FixedClock::at_date(today()), SequentialIds::new("id"))
}

fn local_service() -> DataService<LocalBackend<MemorySlot>, FixedClock, SequentialIds> {
    service_over(LocalBackend::in_memory())
}

fn session(project: &str, duration: u32, day: u32) -> NewWorkSession {
    NewWorkSession {
        project: project.to_string(),
        duration,
        tags: Vec::new(),
        date: date(day),
        notes: String::new(),
        mood: None,
    }
}

fn reflection(day: u32, mood: &str) -> NewReflection {
    NewReflection {
        date: date(day),
        prompt: "What went well?".to_string(),
        response: "Shipped the parser".to_string(),
        mood: mood.to_string(),
    }
}

#[test]
fn create_task_assigns_id_streak_and_created_at() {
    let mut service = local_service();
    let mut new_task = NewTask::new("Read", TaskKind::Daily, Priority::Low, "study", "📖");
    new_task.due_date = Some(date(20));

    let id = service.create_task(new_task).unwrap();
    let tasks = service.get_all_tasks().unwrap();

    assert_eq!(id, EntityId::new("id-1"));
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].streak, 0);
    assert!(!tasks[0].completed);
    assert_eq!(tasks[0].due_date, Some(date(20)));
    assert_eq!(tasks[0].created_at, FixedClock::at_date(today()).now_utc());
}

#[test]
fn newest_records_come_first() {
    let mut service = local_service();
    service
        .create_task(NewTask::new("First", TaskKind::Daily, Priority::Low, "", ""))
        .unwrap();
    service
        .create_task(NewTask::new("Second", TaskKind::Weekly, Priority::High, "", ""))
        .unwrap();

    let titles: Vec<String> = service
        .get_all_tasks()
        .unwrap()
        .into_iter()
        .map(|task| task.title)
        .collect();
    assert_eq!(titles, vec!["Second", "First"]);
}

#[test]
fn work_sessions_and_reflections_sort_by_date_descending() {
    let mut service = local_service();
    service.create_work_session(session("DSA", 60, 10)).unwrap();
    service.create_work_session(session("React", 30, 14)).unwrap();
    service.create_work_session(session("Rust", 45, 12)).unwrap();
    service.create_reflection(reflection(3, "🙂")).unwrap();
    service.create_reflection(reflection(9, "😐")).unwrap();

    let sessions: Vec<NaiveDate> = service
        .get_all_work_sessions()
        .unwrap()
        .iter()
        .map(|session| session.date)
        .collect();
    assert_eq!(sessions, vec![date(14), date(12), date(10)]);

    let moods: Vec<String> = service
        .get_all_reflections()
        .unwrap()
        .into_iter()
        .map(|reflection| reflection.mood)
        .collect();
    assert_eq!(moods, vec!["😐", "🙂"]);
}

#[test]
fn update_merges_fields_and_unknown_id_is_noop() {
    let mut service = local_service();
    let id = service
        .create_task(NewTask::new("Draft", TaskKind::Weekly, Priority::Medium, "work", "📝"))
        .unwrap();

    let updated = service
        .update_task(
            &id,
            TaskPatch {
                title: Some("Draft v2".to_string()),
                tags: Some(vec!["writing".to_string()]),
                ..TaskPatch::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Draft v2");
    assert_eq!(updated.category, "work");
    assert_eq!(updated.tags, vec!["writing".to_string()]);

    let missing = service
        .update_task(&EntityId::new("nope"), TaskPatch::default())
        .unwrap();
    assert!(missing.is_none());
    assert_eq!(service.get_all_tasks().unwrap(), vec![updated]);
}

#[test]
fn delete_removes_only_the_matching_record() {
    let mut service = local_service();
    let keep = service.create_work_session(session("Keep", 30, 1)).unwrap();
    let gone = service.create_work_session(session("Drop", 30, 2)).unwrap();

    assert!(service.delete_work_session(&gone).unwrap());
    assert!(!service.delete_work_session(&EntityId::new("nope")).unwrap());

    let remaining = service.get_all_work_sessions().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep);
}

#[test]
fn goal_progress_is_clamped_on_create_and_update() {
    let mut service = local_service();
    let id = service
        .create_goal(NewGoal {
            title: "Learn Rust".to_string(),
            description: String::new(),
            deadline: date(31),
            progress: 140,
            subtasks: vec!["book".to_string()],
            category: "learning".to_string(),
            motivational_quote: None,
        })
        .unwrap();
    assert_eq!(service.get_all_goals().unwrap()[0].progress, 100);

    let goal = service.update_goal_progress(&id, -5).unwrap().unwrap();
    assert_eq!(goal.progress, 0);

    let goal = service
        .update_goal(
            &id,
            GoalPatch {
                progress: Some(60),
                motivational_quote: Some(Some("Keep going".to_string())),
                ..GoalPatch::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(goal.progress, 60);
    assert_eq!(goal.motivational_quote.as_deref(), Some("Keep going"));
    assert!(service.delete_goal(&id).unwrap());
    assert!(service.get_all_goals().unwrap().is_empty());
}

#[test]
fn work_session_and_reflection_updates_apply_patches() {
    let mut service = local_service();
    let session_id = service.create_work_session(session("DSA", 60, 10)).unwrap();
    let reflection_id = service.create_reflection(reflection(10, "🙂")).unwrap();

    let session = service
        .update_work_session(
            &session_id,
            WorkSessionPatch {
                duration: Some(95),
                mood: Some(Some("focused".to_string())),
                ..WorkSessionPatch::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(session.duration, 95);
    assert_eq!(session.mood.as_deref(), Some("focused"));

    let reflection = service
        .update_reflection(
            &reflection_id,
            ReflectionPatch {
                response: Some("Rested".to_string()),
                ..ReflectionPatch::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(reflection.response, "Rested");
    assert!(service.delete_reflection(&reflection_id).unwrap());
}

#[test]
fn toggling_twice_restores_task_and_keeps_global_streak_gain() {
    let mut service = local_service();
    service.update_total_streak(4).unwrap();
    let id = service
        .create_task(NewTask::new("Read", TaskKind::Daily, Priority::Low, "", ""))
        .unwrap();

    let first = service.toggle_task(&id).unwrap().unwrap();
    assert!(first.task.completed);
    assert_eq!(first.task.streak, 1);
    assert_eq!(first.total_streak, 5);

    let second = service.toggle_task(&id).unwrap().unwrap();
    assert!(!second.task.completed);
    assert_eq!(second.task.streak, 0);
    assert_eq!(second.total_streak, 5);
    assert_eq!(service.get_total_streak().unwrap(), 5);

    let stored = &service.get_all_tasks().unwrap()[0];
    assert!(!stored.completed);
    assert_eq!(stored.streak, 0);
}

#[test]
fn toggling_unknown_task_changes_nothing() {
    let mut service = local_service();
    service.update_total_streak(2).unwrap();

    assert!(service.toggle_task(&EntityId::new("ghost")).unwrap().is_none());
    assert_eq!(service.get_total_streak().unwrap(), 2);
}

#[test]
fn sqlite_backend_serves_the_same_operations() {
    let dir = tempfile::tempdir().unwrap();
    let source = DbSource::File(dir.path().join("routina.sqlite3"));

    let id = {
        let mut service = service_over(SqliteBackend::new(source.clone()));
        let id = service
            .create_task(NewTask::new("Stretch", TaskKind::Daily, Priority::Medium, "health", "🧘"))
            .unwrap();
        service.create_work_session(session("DSA", 120, 14)).unwrap();
        service.toggle_task(&id).unwrap();
        id
    };

    let mut service = service_over(SqliteBackend::new(source));
    let tasks = service.get_all_tasks().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, id);
    assert!(tasks[0].completed);
    assert_eq!(tasks[0].streak, 1);
    assert_eq!(service.get_total_streak().unwrap(), 1);
    assert_eq!(service.get_all_work_sessions().unwrap()[0].duration, 120);
}

#[test]
fn writes_keep_stored_entries_that_fail_to_decode() {
    let legacy = json!({
        "id": "legacy",
        "title": "Imported without a timestamp",
        "type": "daily",
        "dueDate": 20250115
    });
    let blob = json!({
        "tasks": [
            {
                "id": "ok",
                "title": "Read",
                "type": "daily",
                "completed": false,
                "streak": 0,
                "priority": "low",
                "createdAt": "2025-01-10T08:00:00Z"
            },
            legacy.clone()
        ]
    });
    let mut service = service_over(LocalBackend::new(MemorySlot::with_blob(blob.to_string())));
    let stored = |service: &mut DataService<LocalBackend<MemorySlot>, FixedClock, SequentialIds>| {
        match service.backend_mut().get(Collection::Tasks).unwrap() {
            Some(Value::Array(items)) => items,
            other => panic!("unexpected tasks value: {other:?}"),
        }
    };

    assert_eq!(service.get_all_tasks().unwrap().len(), 1);

    assert!(!service.delete_task(&EntityId::new("absent")).unwrap());
    assert_eq!(stored(&mut service).len(), 2);

    service
        .update_task(
            &EntityId::new("ok"),
            TaskPatch {
                title: Some("Read daily".to_string()),
                ..TaskPatch::default()
            },
        )
        .unwrap()
        .unwrap();
    service.toggle_task(&EntityId::new("ok")).unwrap().unwrap();
    service
        .create_task(NewTask::new("Stretch", TaskKind::Daily, Priority::Low, "", ""))
        .unwrap();

    let items = stored(&mut service);
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["title"], "Stretch");
    assert_eq!(items[1]["title"], "Read daily");
    assert_eq!(items[1]["completed"], true);
    assert_eq!(items[2], legacy);

    assert!(service
        .update_task(&EntityId::new("legacy"), TaskPatch::default())
        .unwrap()
        .is_none());
    assert!(service.delete_task(&EntityId::new("legacy")).unwrap());
    assert_eq!(stored(&mut service).len(), 2);
}

use rusqlite::Connection;
use todo_core::db::migrations::latest_version;
use todo_core::db::open_db_in_memory;
use todo_core::{
    NewTask, SortDirection, SortField, SqliteTaskStore, StoreConfig, StoreError, Task, TaskQuery,
    TaskStore,
};
use uuid::Uuid;

fn setup() -> SqliteTaskStore {
    SqliteTaskStore::open(&StoreConfig::in_memory()).unwrap()
}

fn new_task(id: &str, description: &str, created_at: i64) -> NewTask {
    NewTask {
        uuid: Uuid::parse_str(id).unwrap(),
        description: description.to_string(),
        is_complete: false,
        created_at,
    }
}

fn descriptions(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|task| task.description.as_str()).collect()
}

#[test]
fn create_and_fetch_roundtrip() {
    let store = setup();

    let created = store.create(NewTask::now("Buy milk")).unwrap();
    let tasks = store.fetch(&TaskQuery::default()).unwrap();

    assert_eq!(tasks, vec![created.clone()]);
    assert!(!created.is_complete);
    assert!(store.is_valid(&created).unwrap());
    assert_eq!(store.revision(), 1);
}

#[test]
fn create_rejects_duplicate_identifier() {
    let store = setup();
    let fields = new_task("00000000-0000-4000-8000-000000000001", "first", 1);
    store.create(fields.clone()).unwrap();

    let mut duplicate = fields;
    duplicate.description = "second".to_string();
    let err = store.create(duplicate).unwrap_err();

    assert!(matches!(err, StoreError::DuplicateId(id) if id.to_string() == "00000000-0000-4000-8000-000000000001"));
    let tasks = store.fetch(&TaskQuery::default()).unwrap();
    assert_eq!(descriptions(&tasks), vec!["first"]);
    assert_eq!(store.revision(), 1);
}

#[test]
fn create_rejects_blank_description_before_sql() {
    let store = setup();
    let err = store.create(NewTask::now("   ")).unwrap_err();

    assert!(matches!(err, StoreError::Validation(_)));
    assert!(store.fetch(&TaskQuery::default()).unwrap().is_empty());
}

#[test]
fn update_applies_mutator_to_persisted_row() {
    let store = setup();
    let task = store.create(NewTask::now("Buy milk")).unwrap();

    let updated = store
        .update(&task, |current| current.is_complete = !current.is_complete)
        .unwrap();

    assert!(updated.is_complete);
    assert_eq!(updated.uuid, task.uuid);
    assert_eq!(updated.description, task.description);
    assert_eq!(updated.created_at, task.created_at);
    assert_eq!(store.fetch(&TaskQuery::default()).unwrap(), vec![updated]);
}

#[test]
fn update_works_from_stale_snapshot_values() {
    let store = setup();
    let snapshot = store.create(NewTask::now("Buy milk")).unwrap();
    store
        .update(&snapshot, |current| current.is_complete = true)
        .unwrap();

    // The mutator sees the persisted row, not the caller's copy.
    let flipped = store
        .update(&snapshot, |current| current.is_complete = !current.is_complete)
        .unwrap();
    assert!(!flipped.is_complete);
}

#[test]
fn update_rejects_immutable_field_changes() {
    let store = setup();
    let task = store.create(NewTask::now("Buy milk")).unwrap();

    let err = store
        .update(&task, |current| current.uuid = Uuid::new_v4())
        .unwrap_err();
    assert!(matches!(err, StoreError::ImmutableField("uuid")));

    let err = store
        .update(&task, |current| current.created_at += 1)
        .unwrap_err();
    assert!(matches!(err, StoreError::ImmutableField("created_at")));

    assert_eq!(store.fetch(&TaskQuery::default()).unwrap(), vec![task]);
    assert_eq!(store.revision(), 1);
}

#[test]
fn update_and_delete_fail_for_deleted_reference() {
    let store = setup();
    let task = store.create(NewTask::now("Buy milk")).unwrap();
    store.delete(&task).unwrap();

    assert!(!store.is_valid(&task).unwrap());

    let update_err = store
        .update(&task, |current| current.is_complete = true)
        .unwrap_err();
    assert!(matches!(update_err, StoreError::Invalidated(id) if id == task.uuid));

    let delete_err = store.delete(&task).unwrap_err();
    assert!(matches!(delete_err, StoreError::Invalidated(id) if id == task.uuid));
    assert_eq!(store.revision(), 2);
}

#[test]
fn fetch_supports_field_and_direction() {
    let store = setup();
    store
        .create(new_task("00000000-0000-4000-8000-000000000001", "banana", 10))
        .unwrap();
    store
        .create(new_task("00000000-0000-4000-8000-000000000002", "apple", 30))
        .unwrap();
    store
        .create(new_task("00000000-0000-4000-8000-000000000003", "cherry", 20))
        .unwrap();

    let newest = store.fetch(&TaskQuery::newest_first()).unwrap();
    assert_eq!(descriptions(&newest), vec!["apple", "cherry", "banana"]);

    let oldest = store.fetch(&TaskQuery::default()).unwrap();
    assert_eq!(descriptions(&oldest), vec!["banana", "cherry", "apple"]);

    let by_name = store
        .fetch(&TaskQuery::sorted(
            SortField::Description,
            SortDirection::Ascending,
        ))
        .unwrap();
    assert_eq!(descriptions(&by_name), vec!["apple", "banana", "cherry"]);
}

#[test]
fn same_millisecond_creates_keep_insertion_order() {
    let store = setup();
    for (index, name) in ["first", "second", "third"].iter().enumerate() {
        let id = format!("00000000-0000-4000-8000-00000000000{}", 9 - index);
        store.create(new_task(&id, name, 42)).unwrap();
    }

    let newest = store.fetch(&TaskQuery::newest_first()).unwrap();
    assert_eq!(descriptions(&newest), vec!["third", "second", "first"]);
}

#[test]
fn sort_by_completion_groups_done_tasks() {
    let store = setup();
    let a = store.create(new_task("00000000-0000-4000-8000-000000000001", "a", 1)).unwrap();
    store.create(new_task("00000000-0000-4000-8000-000000000002", "b", 2)).unwrap();
    store.update(&a, |current| current.is_complete = true).unwrap();

    let done_first = store
        .fetch(&TaskQuery::sorted(
            SortField::IsComplete,
            SortDirection::Descending,
        ))
        .unwrap();
    assert_eq!(descriptions(&done_first), vec!["a", "b"]);
}

#[test]
fn file_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::file(dir.path().join("todo.db"));

    let created = {
        let store = SqliteTaskStore::open(&config).unwrap();
        store.create(NewTask::now("Walk dog")).unwrap()
    };

    let reopened = SqliteTaskStore::open(&config).unwrap();
    assert_eq!(
        reopened.fetch(&TaskQuery::default()).unwrap(),
        vec![created]
    );
}

#[test]
fn store_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteTaskStore::try_new(conn) {
        Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn store_rejects_connection_without_tasks_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteTaskStore::try_new(conn);
    assert!(matches!(result, Err(StoreError::MissingRequiredTable("tasks"))));
}

#[test]
fn store_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE tasks (
            uuid TEXT PRIMARY KEY NOT NULL,
            description TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteTaskStore::try_new(conn);
    assert!(matches!(
        result,
        Err(StoreError::MissingRequiredColumn {
            table: "tasks",
            column: "is_complete"
        })
    ));
}

#[test]
fn fetch_rejects_corrupt_rows() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO tasks (uuid, description, is_complete, created_at)
         VALUES ('not-a-uuid', 'broken', 0, 1);",
        [],
    )
    .unwrap();
    let store = SqliteTaskStore::try_new(conn).unwrap();

    let err = store.fetch(&TaskQuery::default()).unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(message) if message.contains("not-a-uuid")));
}

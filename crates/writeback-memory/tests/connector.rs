use serde_json::{Value, json};
use std::sync::Arc;
use writeback_core::{ActionName, ConnectorKind, SharedSettings, WritebackConfig};
use writeback_memory::{MemoryResourceStore, MemoryTables, register_memory_handlers};
use writeback_policy::{ContractRegistry, StaticCapabilities};
use writeback_runtime::{ActionError, ActionRegistry, Dispatcher, ErrorKind, NullAuditSink};

const CONFIG: &str = r#"
capabilities:
  mongo:
    actions: true
resources:
  - id: 2
    name: Sample
    engine: h2
    settings:
      database-enable-actions: true
    tables:
      - id: 29
        name: people
        fields: { 1: id, 2: name, 3: team }
        rows:
          - { id: 1, name: Alice, team: red }
          - { id: 2, name: Bob, team: red }
          - { id: 3, name: Carol, team: blue }
  - id: 7
    name: Docs
    engine: mongo
    settings:
      database-enable-actions: true
"#;

struct Fixture {
    dispatcher: Dispatcher,
    tables: Arc<MemoryTables>,
}

fn fixture() -> Fixture {
    let config = WritebackConfig::from_yaml(CONFIG).unwrap();
    let tables = Arc::new(MemoryTables::from_config(&config));

    let mut registry = ActionRegistry::new();
    register_memory_handlers(&mut registry, ConnectorKind::SqlJdbc, Arc::clone(&tables));

    let dispatcher = Dispatcher::new(
        Arc::new(registry),
        Arc::new(ContractRegistry::builtin().unwrap()),
        Arc::new(MemoryResourceStore::from_config(&config)),
    )
    .with_capabilities(Arc::new(
        StaticCapabilities::builtin().with_overrides(&config.capabilities),
    ))
    .with_settings(Arc::new(SharedSettings::new(config.settings.clone())))
    .with_audit(Arc::new(NullAuditSink));

    Fixture { dispatcher, tables }
}

async fn names(tables: &MemoryTables) -> Vec<String> {
    tables
        .rows(2, 29)
        .await
        .unwrap()
        .iter()
        .filter_map(|row| row.get("name")?.as_str().map(str::to_string))
        .collect()
}

async fn perform(f: &Fixture, action: ActionName, args: Value) -> Result<Value, ActionError> {
    f.dispatcher.perform_action(&action, args, None).await
}

#[tokio::test]
async fn create_inserts_and_returns_the_row() {
    let f = fixture();
    let result = perform(
        &f,
        ActionName::ROW_CREATE,
        json!({"database": 2, "query": {"source-table": 29}, "create_row": {"name": "Dan", "team": "blue"}}),
    )
    .await
    .unwrap();

    assert_eq!(
        result,
        json!({"created-row": {"id": 4, "name": "Dan", "team": "blue"}})
    );
    assert_eq!(names(&f.tables).await, vec!["Alice", "Bob", "Carol", "Dan"]);
}

#[tokio::test]
async fn update_changes_exactly_one_row() {
    let f = fixture();
    let result = perform(
        &f,
        ActionName::ROW_UPDATE,
        json!({
            "database": 2,
            "query": {"sourceTable": 29, "filter": ["=", ["field", "name", null], "Bob"]},
            "updateRow": {"name": "Robert"}
        }),
    )
    .await
    .unwrap();

    assert_eq!(result, json!({"rows-updated": 1}));
    assert_eq!(names(&f.tables).await, vec!["Alice", "Robert", "Carol"]);
}

#[tokio::test]
async fn delete_matching_several_rows_is_refused() {
    let f = fixture();
    let err = perform(
        &f,
        ActionName::ROW_DELETE,
        json!({"database": 2, "table-id": 29, "filter": ["=", 3, "red"]}),
    )
    .await
    .unwrap_err();

    let failure = err.to_failure();
    assert_eq!(failure.kind, ErrorKind::HandlerError);
    assert_eq!(failure.status_code, 400);
    assert_eq!(
        failure.message,
        "would affect 2 rows, but you can only act on 1"
    );
    assert_eq!(names(&f.tables).await.len(), 3);
}

#[tokio::test]
async fn delete_removes_the_matching_row() {
    let f = fixture();
    let result = perform(
        &f,
        ActionName::ROW_DELETE,
        json!({"database": 2, "table-id": 29, "filter": ["and", ["=", 3, "red"], ["starts-with", 2, "A"]]}),
    )
    .await
    .unwrap();

    assert_eq!(result, json!({"rows-deleted": 1}));
    assert_eq!(names(&f.tables).await, vec!["Bob", "Carol"]);
}

#[tokio::test]
async fn unknown_tables_are_not_found() {
    let f = fixture();
    let err = perform(
        &f,
        ActionName::ROW_CREATE,
        json!({"database": 2, "query": {"sourceTable": 30}, "createRow": {"name": "Eve"}}),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert_eq!(err.kind(), ErrorKind::HandlerError);
}

#[tokio::test]
async fn bulk_delete_applies_every_row() {
    let f = fixture();
    let result = perform(
        &f,
        ActionName::BULK_DELETE,
        json!({"database": 2, "arg": [
            {"sourceTable": 29, "filter": ["=", 1, 1]},
            {"sourceTable": 29, "filter": ["=", 1, 3]}
        ]}),
    )
    .await
    .unwrap();

    assert_eq!(result, json!({"success": true, "rows-deleted": 2}));
    assert_eq!(names(&f.tables).await, vec!["Bob"]);
}

#[tokio::test]
async fn bulk_failures_leave_the_table_untouched() {
    let f = fixture();
    let err = perform(
        &f,
        ActionName::BULK_UPDATE,
        json!([
            {"database": 2, "sourceTable": 29, "filter": ["=", 1, 1], "updateRow": {"name": "A"}},
            {"database": 2, "sourceTable": 29, "filter": ["=", 1, 99], "updateRow": {"name": "Z"}}
        ]),
    )
    .await
    .unwrap_err();

    let failure = err.to_failure();
    assert_eq!(failure.status_code, 400);
    assert_eq!(failure.details, Some(json!({"index": 1})));
    assert_eq!(names(&f.tables).await, vec!["Alice", "Bob", "Carol"]);
}

#[tokio::test]
async fn bulk_create_counts_rows() {
    let f = fixture();
    let result = perform(
        &f,
        ActionName::BULK_CREATE,
        json!({"database": 2, "arg": [
            {"sourceTable": 29, "createRow": {"name": "Dan"}},
            {"sourceTable": 29, "createRow": {"name": "Eve"}}
        ]}),
    )
    .await
    .unwrap();

    assert_eq!(result, json!({"success": true, "rows-created": 2}));
    let rows = f.tables.rows(2, 29).await.unwrap();
    assert_eq!(rows[4]["id"], json!(5));
}

#[tokio::test]
async fn kinds_outside_the_registered_branch_are_unsupported() {
    let f = fixture();
    let err = perform(
        &f,
        ActionName::ROW_CREATE,
        json!({"database": 7, "query": {"sourceTable": 1}, "createRow": {"title": "x"}}),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        ActionError::UnsupportedConnector {
            connector: ConnectorKind::Mongo,
            ..
        }
    ));
}

#[tokio::test]
async fn filters_tell_apart_ids_beyond_float_precision() {
    let f = fixture();
    for (id, name) in [(9007199254740992_u64, "Keep"), (9007199254740994_u64, "Other")] {
        perform(
            &f,
            ActionName::ROW_CREATE,
            json!({"database": 2, "sourceTable": 29, "createRow": {"id": id, "name": name}}),
        )
        .await
        .unwrap();
    }

    let err = perform(
        &f,
        ActionName::ROW_DELETE,
        json!({"database": 2, "sourceTable": 29, "filter": ["=", 1, 9007199254740993_u64]}),
    )
    .await
    .unwrap_err();
    assert_eq!(
        err.to_failure().message,
        "would affect 0 rows, but you can only act on 1"
    );
    assert!(names(&f.tables).await.contains(&"Keep".to_string()));

    let result = perform(
        &f,
        ActionName::ROW_DELETE,
        json!({"database": 2, "sourceTable": 29, "filter": ["=", 1, 9007199254740994_u64]}),
    )
    .await
    .unwrap();
    assert_eq!(result, json!({"rows-deleted": 1}));
    assert_eq!(
        names(&f.tables).await,
        vec!["Alice", "Bob", "Carol", "Keep"]
    );
}

#[tokio::test]
async fn creating_the_largest_key_does_not_break_later_creates() {
    let f = fixture();
    let result = perform(
        &f,
        ActionName::ROW_CREATE,
        json!({"database": 2, "sourceTable": 29, "createRow": {"id": u64::MAX, "name": "Max"}}),
    )
    .await
    .unwrap();
    assert_eq!(result["created-row"]["id"], json!(u64::MAX));

    let err = perform(
        &f,
        ActionName::ROW_CREATE,
        json!({"database": 2, "sourceTable": 29, "createRow": {"name": "Next"}}),
    )
    .await
    .unwrap_err();
    let failure = err.to_failure();
    assert_eq!(failure.kind, ErrorKind::HandlerError);
    assert_eq!(failure.status_code, 400);
    assert_eq!(names(&f.tables).await.len(), 4);
}

#[tokio::test]
async fn bare_bulk_rows_inherit_a_later_database() {
    let f = fixture();
    let result = perform(
        &f,
        ActionName::BULK_DELETE,
        json!([
            {"sourceTable": 29, "filter": ["=", 1, 1]},
            {"database": 2, "sourceTable": 29, "filter": ["=", 1, 2]}
        ]),
    )
    .await
    .unwrap();

    assert_eq!(result, json!({"success": true, "rows-deleted": 2}));
    assert_eq!(names(&f.tables).await, vec!["Carol"]);
}

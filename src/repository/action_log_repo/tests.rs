use super::ActionLogRepository;
use crate::domain::action_log::{ActionLog, ActionType};
use rusqlite::Connection;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::init_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

fn make_test_log(action_type: ActionType, entity_id: &str, actor: &str) -> ActionLog {
    ActionLog::new(
        action_type,
        actor,
        "schedule",
        entity_id,
        Some(json!({ "qty_total_target": 300 })),
        Some("Test log".to_string()),
    )
}

#[test]
fn test_insert_and_find_by_id() {
    let repo = ActionLogRepository::new(setup_test_db());

    let log = make_test_log(ActionType::CreateSchedule, "S1", "user1");
    let action_id = repo.insert(&log).unwrap();
    assert_eq!(action_id, log.action_id);

    let found = repo.find_by_id(&action_id).unwrap().unwrap();
    assert_eq!(found.action_type, "CREATE_SCHEDULE");
    assert_eq!(found.actor, "user1");
    assert_eq!(found.entity_type, "schedule");
    assert_eq!(found.entity_id, "S1");
    assert_eq!(found.payload_json, Some(json!({ "qty_total_target": 300 })));
    assert_eq!(found.detail.as_deref(), Some("Test log"));

    assert!(repo.find_by_id("missing").unwrap().is_none());
}

#[test]
fn test_find_by_entity_in_insert_order() {
    let repo = ActionLogRepository::new(setup_test_db());

    repo.insert(&make_test_log(ActionType::CreateSchedule, "S1", "user1"))
        .unwrap();
    repo.insert(&make_test_log(ActionType::CreateSchedule, "S2", "user1"))
        .unwrap();
    repo.insert(&make_test_log(ActionType::UpdateSchedule, "S1", "user2"))
        .unwrap();
    repo.insert(&make_test_log(ActionType::DeleteSchedule, "S1", "user2"))
        .unwrap();

    let logs = repo.find_by_entity("schedule", "S1").unwrap();
    let types: Vec<&str> = logs.iter().map(|l| l.action_type.as_str()).collect();
    assert_eq!(types, vec!["CREATE_SCHEDULE", "UPDATE_SCHEDULE", "DELETE_SCHEDULE"]);

    assert!(repo.find_by_entity("order", "S1").unwrap().is_empty());
    assert_eq!(repo.count_by_actor("user2").unwrap(), 2);
}

#[test]
fn test_insert_tx_rolls_back_with_transaction() {
    let conn = setup_test_db();
    let repo = ActionLogRepository::new(conn.clone());
    let log = make_test_log(ActionType::CreateSchedule, "S1", "user1");

    {
        let mut guard = conn.lock().unwrap();
        let tx = guard.transaction().unwrap();
        ActionLogRepository::insert_tx(&tx, &log).unwrap();
        // 未提交即丢弃
    }

    assert!(repo.find_by_entity("schedule", "S1").unwrap().is_empty());
}

// ==========================================
// 排产生命周期集成测试
// ==========================================
// 场景: 建单 → 可用性校验 → 改单重建 → 软删除
// ==========================================

mod test_helpers;

use production_line_aps::domain::{OrderStatus, ScheduleStatus, ScheduleUpdate};
use production_line_aps::engine::EngineError;
use production_line_aps::repository::{ActionLogRepository, ScheduleRepository};
use test_helpers::{d, new_schedule, seed_line, TestEnv};

#[test]
fn test_create_distributes_targets_with_remainder_on_last_day() {
    println!("\n=== 测试：建单拆分日目标 ===");

    let env = TestEnv::new();
    let order_id = env.seed_order("O1000", 1000);
    let line_id = env.seed_line("L1");

    let schedule = env.create(&order_id, &line_id, d(2026, 3, 1), d(2026, 3, 7), 1000);

    assert_eq!(schedule.status, ScheduleStatus::Pending);
    assert_eq!(schedule.current_finish_date, d(2026, 3, 7));
    assert_eq!(schedule.qty_completed, 0);
    assert_eq!(schedule.days_extended, 0);

    let rows = env.daily_rows(&schedule.schedule_id);
    assert_eq!(rows.len(), 7);
    assert!(rows[..6].iter().all(|r| r.target_output == 142));
    assert_eq!(rows[6].target_output, 148);
    assert_eq!(rows.iter().map(|r| r.target_output).sum::<i64>(), 1000);
    assert!(rows.iter().all(|r| r.actual_output == 0 && !r.is_completed && r.balance == 0));

    assert_eq!(env.order(&order_id).status, OrderStatus::Scheduled);

    let logs = ActionLogRepository::new(env.conn.clone())
        .find_by_entity("schedule", &schedule.schedule_id)
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action_type, "CREATE_SCHEDULE");
    assert_eq!(logs[0].actor, "tester");

    println!("✓ 7 天拆分: 6×142 + 148");
}

#[test]
fn test_create_with_invalid_range_writes_nothing() {
    let env = TestEnv::new();
    let order_id = env.seed_order("O1", 100);
    let line_id = env.seed_line("L1");

    let err = env
        .orchestrator
        .create_schedule(
            new_schedule(&order_id, &line_id, d(2026, 3, 5), d(2026, 3, 4), 100),
            "tester",
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRange { .. }));

    let schedules = ScheduleRepository::new(env.conn.clone())
        .list_by_line(&line_id)
        .unwrap();
    assert!(schedules.is_empty());
    assert_eq!(env.order(&order_id).status, OrderStatus::Pending);
}

#[test]
fn test_create_with_unknown_order_is_not_found() {
    let env = TestEnv::new();
    let line_id = env.seed_line("L1");

    let err = env
        .orchestrator
        .create_schedule(
            new_schedule("NO-SUCH-ORDER", &line_id, d(2026, 3, 1), d(2026, 3, 3), 300),
            "tester",
        )
        .unwrap_err();
    match err {
        EngineError::NotFound { entity, id } => {
            assert_eq!(entity, "Order");
            assert_eq!(id, "NO-SUCH-ORDER");
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_availability_conflict_on_overlap() {
    println!("\n=== 测试：产线占用冲突 ===");

    let env = TestEnv::new();
    let order_id = env.seed_order("O1", 1000);
    let line_id = env.seed_line("L1");

    let first = env.create(&order_id, &line_id, d(2026, 3, 1), d(2026, 3, 5), 500);

    let err = env
        .orchestrator
        .create_schedule(
            new_schedule(&order_id, &line_id, d(2026, 3, 4), d(2026, 3, 8), 400),
            "tester",
        )
        .unwrap_err();
    match err {
        EngineError::AvailabilityConflict {
            conflicting_schedule_ids,
            ..
        } => assert_eq!(conflicting_schedule_ids, vec![first.schedule_id.clone()]),
        other => panic!("unexpected: {:?}", other),
    }

    // 半开区间: 从前一排产的完工日开始不算重叠
    let adjacent = env.create(&order_id, &line_id, d(2026, 3, 5), d(2026, 3, 8), 400);
    assert_eq!(adjacent.start_date, d(2026, 3, 5));

    println!("✓ 重叠拒绝，相邻允许");
}

#[test]
fn test_inactive_line_is_unavailable() {
    let env = TestEnv::new();
    let order_id = env.seed_order("O1", 100);
    let line_id = seed_line(&env.conn, "L-OFF", false);

    let err = env
        .orchestrator
        .create_schedule(
            new_schedule(&order_id, &line_id, d(2026, 3, 1), d(2026, 3, 3), 100),
            "tester",
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::AvailabilityConflict { .. }));
}

#[test]
fn test_update_dates_regenerates_rows_and_resets_progress() {
    println!("\n=== 测试：改单重建日产出 ===");

    let env = TestEnv::new();
    let order_id = env.seed_order("O1", 300);
    let line_id = env.seed_line("L1");
    let schedule = env.create(&order_id, &line_id, d(2026, 3, 1), d(2026, 3, 3), 300);

    env.record(&schedule.schedule_id, d(2026, 3, 1), 60);
    assert_eq!(env.schedule(&schedule.schedule_id).qty_completed, 60);

    let detail = env
        .orchestrator
        .update_schedule(
            &schedule.schedule_id,
            ScheduleUpdate {
                finish_date: Some(d(2026, 3, 4)),
                ..Default::default()
            },
            "tester",
        )
        .unwrap();

    assert_eq!(detail.daily_outputs.len(), 4);
    assert!(detail.daily_outputs.iter().all(|r| r.target_output == 75));
    assert!(detail.daily_outputs.iter().all(|r| r.actual_output == 0));
    assert_eq!(detail.schedule.current_finish_date, d(2026, 3, 4));
    assert_eq!(detail.schedule.qty_completed, 0);
    assert_eq!(detail.schedule.status, ScheduleStatus::Pending);
    assert_eq!(detail.order.status, OrderStatus::Scheduled);
    assert_eq!(detail.line.line_id, line_id);

    println!("✓ 已录实绩随重建丢弃");
}

#[test]
fn test_update_notes_only_keeps_rows() {
    let env = TestEnv::new();
    let order_id = env.seed_order("O1", 300);
    let line_id = env.seed_line("L1");
    let schedule = env.create(&order_id, &line_id, d(2026, 3, 1), d(2026, 3, 3), 300);
    env.record(&schedule.schedule_id, d(2026, 3, 1), 100);
    let before_ids: Vec<String> = env
        .daily_rows(&schedule.schedule_id)
        .into_iter()
        .map(|r| r.daily_output_id)
        .collect();

    let detail = env
        .orchestrator
        .update_schedule(
            &schedule.schedule_id,
            ScheduleUpdate {
                notes: Some("夜班加产".to_string()),
                qty_total_target: Some(300),
                ..Default::default()
            },
            "tester",
        )
        .unwrap();

    assert_eq!(detail.schedule.notes.as_deref(), Some("夜班加产"));
    assert_eq!(detail.schedule.qty_completed, 100);
    assert_eq!(detail.schedule.status, ScheduleStatus::InProgress);
    let after_ids: Vec<String> = detail
        .daily_outputs
        .iter()
        .map(|r| r.daily_output_id.clone())
        .collect();
    assert_eq!(before_ids, after_ids);
    assert_eq!(detail.daily_outputs[0].actual_output, 100);
}

#[test]
fn test_update_with_invalid_range_rolls_back() {
    let env = TestEnv::new();
    let order_id = env.seed_order("O1", 300);
    let line_id = env.seed_line("L1");
    let schedule = env.create(&order_id, &line_id, d(2026, 3, 1), d(2026, 3, 3), 300);
    env.record(&schedule.schedule_id, d(2026, 3, 1), 100);

    let err = env
        .orchestrator
        .update_schedule(
            &schedule.schedule_id,
            ScheduleUpdate {
                finish_date: Some(d(2026, 2, 20)),
                ..Default::default()
            },
            "tester",
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRange { .. }));

    let rows = env.daily_rows(&schedule.schedule_id);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].actual_output, 100);
    assert_eq!(env.schedule(&schedule.schedule_id).finish_date, d(2026, 3, 3));
}

#[test]
fn test_update_into_occupied_range_is_rejected() {
    let env = TestEnv::new();
    let order_id = env.seed_order("O1", 1000);
    let line_id = env.seed_line("L1");
    let other_line = env.seed_line("L2");
    let a = env.create(&order_id, &line_id, d(2026, 3, 1), d(2026, 3, 5), 500);
    let b = env.create(&order_id, &line_id, d(2026, 3, 10), d(2026, 3, 12), 300);
    env.create(&order_id, &other_line, d(2026, 3, 1), d(2026, 3, 3), 300);

    let err = env
        .orchestrator
        .update_schedule(
            &b.schedule_id,
            ScheduleUpdate {
                start_date: Some(d(2026, 3, 4)),
                ..Default::default()
            },
            "tester",
        )
        .unwrap_err();
    match err {
        EngineError::AvailabilityConflict {
            conflicting_schedule_ids,
            ..
        } => assert_eq!(conflicting_schedule_ids, vec![a.schedule_id.clone()]),
        other => panic!("unexpected: {:?}", other),
    }

    // 换线到被占用的产线
    let err = env
        .orchestrator
        .update_schedule(
            &a.schedule_id,
            ScheduleUpdate {
                line_id: Some(other_line.clone()),
                ..Default::default()
            },
            "tester",
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::AvailabilityConflict { .. }));

    // 在自身区间内改期不与自己冲突
    let detail = env
        .orchestrator
        .update_schedule(
            &b.schedule_id,
            ScheduleUpdate {
                start_date: Some(d(2026, 3, 11)),
                ..Default::default()
            },
            "tester",
        )
        .unwrap();
    assert_eq!(detail.daily_outputs.len(), 2);
    assert_eq!(env.schedule(&a.schedule_id).line_id, line_id);
}

#[test]
fn test_soft_delete_hides_schedule_and_keeps_rows() {
    let env = TestEnv::new();
    let order_id = env.seed_order("O1", 300);
    let line_id = env.seed_line("L1");
    let schedule = env.create(&order_id, &line_id, d(2026, 3, 1), d(2026, 3, 3), 300);

    env.orchestrator
        .delete_schedule(&schedule.schedule_id, "tester")
        .unwrap();

    let repo = ScheduleRepository::new(env.conn.clone());
    assert!(repo.find_by_id(&schedule.schedule_id).unwrap().is_none());
    assert!(repo.list_by_line(&line_id).unwrap().is_empty());

    // 日产出保留
    assert_eq!(env.daily_rows(&schedule.schedule_id).len(), 3);

    // 删除后区间重新可用
    let again = env.create(&order_id, &line_id, d(2026, 3, 1), d(2026, 3, 3), 300);
    assert_ne!(again.schedule_id, schedule.schedule_id);

    // 重复删除 → NotFound
    let err = env
        .orchestrator
        .delete_schedule(&schedule.schedule_id, "tester")
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库初始化、主数据种子、常用查询
// ==========================================
#![allow(dead_code)]

use chrono::NaiveDate;
use production_line_aps::config::SchedulingConfig;
use production_line_aps::db::{init_schema, open_sqlite_connection};
use production_line_aps::domain::{
    Line, NewSchedule, Order, OrderStatus, Schedule, ScheduleDailyOutput,
};
use production_line_aps::engine::{ScheduleEvent, ScheduleEventPublisher, ScheduleOrchestrator};
use production_line_aps::repository::{
    DailyOutputRepository, LineRepository, OrderRepository, ScheduleRepository,
};
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接
pub fn open_shared_connection(db_path: &str) -> Result<Arc<Mutex<Connection>>, Box<dyn Error>> {
    Ok(Arc::new(Mutex::new(open_sqlite_connection(db_path)?)))
}

/// 临时库 + 共享连接 + 默认配置的编排器
pub struct TestEnv {
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub conn: Arc<Mutex<Connection>>,
    pub orchestrator: ScheduleOrchestrator,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_config(SchedulingConfig::default())
    }

    pub fn with_config(config: SchedulingConfig) -> Self {
        production_line_aps::logging::init_test();
        let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
        let conn = open_shared_connection(&db_path).expect("Failed to open db");
        let orchestrator = ScheduleOrchestrator::new(conn.clone(), &config);
        Self {
            _temp_file: temp_file,
            db_path,
            conn,
            orchestrator,
        }
    }

    pub fn with_publisher(publisher: Arc<dyn ScheduleEventPublisher>) -> Self {
        let mut env = Self::new();
        env.orchestrator = ScheduleOrchestrator::new(env.conn.clone(), &SchedulingConfig::default())
            .with_event_publisher(publisher);
        env
    }

    pub fn seed_order(&self, order_no: &str, qty_total: i64) -> String {
        seed_order(&self.conn, order_no, qty_total)
    }

    pub fn seed_line(&self, line_code: &str) -> String {
        seed_line(&self.conn, line_code, true)
    }

    /// 建单（失败直接 panic）
    pub fn create(
        &self,
        order_id: &str,
        line_id: &str,
        start: NaiveDate,
        finish: NaiveDate,
        qty: i64,
    ) -> Schedule {
        self.orchestrator
            .create_schedule(new_schedule(order_id, line_id, start, finish, qty), "tester")
            .expect("create_schedule failed")
    }

    pub fn schedule(&self, schedule_id: &str) -> Schedule {
        ScheduleRepository::new(self.conn.clone())
            .find_by_id(schedule_id)
            .unwrap()
            .expect("schedule not found")
    }

    pub fn order(&self, order_id: &str) -> Order {
        OrderRepository::new(self.conn.clone())
            .find_by_id(order_id)
            .unwrap()
            .expect("order not found")
    }

    pub fn daily_rows(&self, schedule_id: &str) -> Vec<ScheduleDailyOutput> {
        DailyOutputRepository::new(self.conn.clone())
            .list_by_schedule(schedule_id)
            .unwrap()
    }

    /// 按日期取日产出行
    pub fn daily_row(&self, schedule_id: &str, date: NaiveDate) -> ScheduleDailyOutput {
        DailyOutputRepository::new(self.conn.clone())
            .find_by_schedule_and_date(schedule_id, date)
            .unwrap()
            .expect("daily output not found")
    }

    /// 按日期录入实绩（失败直接 panic）
    pub fn record(&self, schedule_id: &str, date: NaiveDate, actual: i64) {
        let row = self.daily_row(schedule_id, date);
        self.orchestrator
            .input_actual_output(&row.daily_output_id, actual, "tester")
            .expect("input_actual_output failed");
    }

    pub fn targets(&self, schedule_id: &str) -> Vec<(NaiveDate, i64)> {
        self.daily_rows(schedule_id)
            .into_iter()
            .map(|r| (r.date, r.target_output))
            .collect()
    }
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn new_schedule(
    order_id: &str,
    line_id: &str,
    start: NaiveDate,
    finish: NaiveDate,
    qty: i64,
) -> NewSchedule {
    NewSchedule {
        order_id: order_id.to_string(),
        line_id: line_id.to_string(),
        start_date: start,
        finish_date: finish,
        qty_total_target: qty,
        notes: None,
    }
}

pub fn seed_order(conn: &Arc<Mutex<Connection>>, order_no: &str, qty_total: i64) -> String {
    let now = chrono::Local::now().naive_local();
    let order = Order {
        order_id: format!("ORD-{}", order_no),
        order_no: order_no.to_string(),
        product_name: format!("产品-{}", order_no),
        qty_total,
        order_date: d(2026, 2, 1),
        due_date: Some(d(2026, 4, 30)),
        status: OrderStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    OrderRepository::new(conn.clone())
        .insert(&order)
        .expect("seed order failed");
    order.order_id
}

pub fn seed_line(conn: &Arc<Mutex<Connection>>, line_code: &str, is_active: bool) -> String {
    let now = chrono::Local::now().naive_local();
    let line = Line {
        line_id: format!("LINE-{}", line_code),
        line_code: line_code.to_string(),
        line_name: format!("产线{}", line_code),
        daily_capacity: 500,
        is_active,
        created_at: now,
        updated_at: now,
    };
    LineRepository::new(conn.clone())
        .insert(&line)
        .expect("seed line failed");
    line.line_id
}

// ==========================================
// 事件发布测试替身
// ==========================================

/// 记录全部事件
#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<ScheduleEvent>>,
}

impl RecordingPublisher {
    pub fn taken(&self) -> Vec<ScheduleEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ScheduleEventPublisher for RecordingPublisher {
    fn publish(&self, event: ScheduleEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        self.events.lock().unwrap().push(event);
        Ok("recorded".to_string())
    }
}

/// 总是失败的发布者
pub struct FailingPublisher;

impl ScheduleEventPublisher for FailingPublisher {
    fn publish(&self, _event: ScheduleEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        Err("channel closed".into())
    }
}

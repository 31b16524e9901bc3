// ==========================================
// 产线排产系统 - 排产单数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 所有查询默认排除软删除 (deleted_at IS NULL)
// 对齐: schedules 表
// ==========================================

use crate::domain::schedule::Schedule;
use crate::domain::types::ScheduleStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{
    fmt_date, fmt_datetime, get_date, get_datetime, get_enum, get_opt_datetime, now,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SCHEDULE_COLUMNS: &str = r#"
    schedule_id, order_id, line_id, start_date, finish_date, current_finish_date,
    qty_total_target, qty_completed, days_extended, status, notes,
    created_at, updated_at, deleted_at
"#;

fn map_schedule(row: &Row) -> rusqlite::Result<Schedule> {
    Ok(Schedule {
        schedule_id: row.get(0)?,
        order_id: row.get(1)?,
        line_id: row.get(2)?,
        start_date: get_date(row, 3)?,
        finish_date: get_date(row, 4)?,
        current_finish_date: get_date(row, 5)?,
        qty_total_target: row.get(6)?,
        qty_completed: row.get(7)?,
        days_extended: row.get(8)?,
        status: get_enum(row, 9, ScheduleStatus::from_db_str)?,
        notes: row.get(10)?,
        created_at: get_datetime(row, 11)?,
        updated_at: get_datetime(row, 12)?,
        deleted_at: get_opt_datetime(row, 13)?,
    })
}

// ==========================================
// ScheduleRepository - 排产单仓储
// ==========================================
pub struct ScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询单个有效排产
    pub fn find_by_id(&self, schedule_id: &str) -> RepositoryResult<Option<Schedule>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, schedule_id)
    }

    /// 查询产线上的有效排产（按开工日升序）
    pub fn list_by_line(&self, line_id: &str) -> RepositoryResult<Vec<Schedule>> {
        let conn = self.get_conn()?;
        Self::list_by_line_tx(&conn, line_id)
    }

    /// 查询订单下的有效排产
    pub fn list_by_order(&self, order_id: &str) -> RepositoryResult<Vec<Schedule>> {
        let conn = self.get_conn()?;
        Self::list_by_order_tx(&conn, order_id)
    }

    // ==========================================
    // 事务内操作
    // ==========================================

    pub fn insert_tx(conn: &Connection, schedule: &Schedule) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO schedules (
                schedule_id, order_id, line_id, start_date, finish_date, current_finish_date,
                qty_total_target, qty_completed, days_extended, status, notes,
                created_at, updated_at, deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, NULL)
            "#,
            params![
                schedule.schedule_id,
                schedule.order_id,
                schedule.line_id,
                fmt_date(schedule.start_date),
                fmt_date(schedule.finish_date),
                fmt_date(schedule.current_finish_date),
                schedule.qty_total_target,
                schedule.qty_completed,
                schedule.days_extended,
                schedule.status.to_db_str(),
                schedule.notes,
                fmt_datetime(schedule.created_at),
                fmt_datetime(schedule.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id_tx(conn: &Connection, schedule_id: &str) -> RepositoryResult<Option<Schedule>> {
        let sql = format!(
            "SELECT {} FROM schedules WHERE schedule_id = ?1 AND deleted_at IS NULL",
            SCHEDULE_COLUMNS
        );
        let schedule = conn
            .query_row(&sql, params![schedule_id], map_schedule)
            .optional()?;
        Ok(schedule)
    }

    /// 按ID读取有效排产，不存在或已软删除时返回 NotFound
    pub fn get_tx(conn: &Connection, schedule_id: &str) -> RepositoryResult<Schedule> {
        Self::find_by_id_tx(conn, schedule_id)?
            .ok_or_else(|| RepositoryError::not_found("Schedule", schedule_id))
    }

    pub fn list_by_line_tx(conn: &Connection, line_id: &str) -> RepositoryResult<Vec<Schedule>> {
        let sql = format!(
            r#"
            SELECT {} FROM schedules
            WHERE line_id = ?1 AND deleted_at IS NULL
            ORDER BY start_date ASC, schedule_id ASC
            "#,
            SCHEDULE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let schedules = stmt
            .query_map(params![line_id], map_schedule)?
            .collect::<rusqlite::Result<Vec<Schedule>>>()?;
        Ok(schedules)
    }

    pub fn list_by_order_tx(conn: &Connection, order_id: &str) -> RepositoryResult<Vec<Schedule>> {
        let sql = format!(
            r#"
            SELECT {} FROM schedules
            WHERE order_id = ?1 AND deleted_at IS NULL
            ORDER BY start_date ASC, schedule_id ASC
            "#,
            SCHEDULE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let schedules = stmt
            .query_map(params![order_id], map_schedule)?
            .collect::<rusqlite::Result<Vec<Schedule>>>()?;
        Ok(schedules)
    }

    /// 查询级联顺延候选: 同产线、非自身、有效、开工日严格晚于 after_date
    ///
    /// 按开工日升序返回
    pub fn find_starting_after_tx(
        conn: &Connection,
        line_id: &str,
        exclude_schedule_id: &str,
        after_date: NaiveDate,
    ) -> RepositoryResult<Vec<Schedule>> {
        let sql = format!(
            r#"
            SELECT {} FROM schedules
            WHERE line_id = ?1
              AND schedule_id <> ?2
              AND deleted_at IS NULL
              AND start_date > ?3
            ORDER BY start_date ASC, schedule_id ASC
            "#,
            SCHEDULE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let schedules = stmt
            .query_map(
                params![line_id, exclude_schedule_id, fmt_date(after_date)],
                map_schedule,
            )?
            .collect::<rusqlite::Result<Vec<Schedule>>>()?;
        Ok(schedules)
    }

    /// 查询与 [start, finish) 半开区间重叠的有效排产
    ///
    /// 已占用区间取 [start_date, current_finish_date)
    pub fn find_overlapping_tx(
        conn: &Connection,
        line_id: &str,
        start: NaiveDate,
        finish: NaiveDate,
        exclude_schedule_id: Option<&str>,
    ) -> RepositoryResult<Vec<Schedule>> {
        let sql = format!(
            r#"
            SELECT {} FROM schedules
            WHERE line_id = ?1
              AND deleted_at IS NULL
              AND start_date < ?3
              AND current_finish_date > ?2
              AND (?4 IS NULL OR schedule_id <> ?4)
            ORDER BY start_date ASC
            "#,
            SCHEDULE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let schedules = stmt
            .query_map(
                params![line_id, fmt_date(start), fmt_date(finish), exclude_schedule_id],
                map_schedule,
            )?
            .collect::<rusqlite::Result<Vec<Schedule>>>()?;
        Ok(schedules)
    }

    /// 回写排产单的全部可变字段
    pub fn update_tx(conn: &Connection, schedule: &Schedule) -> RepositoryResult<()> {
        let affected = conn.execute(
            r#"
            UPDATE schedules SET
                line_id = ?1,
                start_date = ?2,
                finish_date = ?3,
                current_finish_date = ?4,
                qty_total_target = ?5,
                qty_completed = ?6,
                days_extended = ?7,
                status = ?8,
                notes = ?9,
                updated_at = ?10
            WHERE schedule_id = ?11 AND deleted_at IS NULL
            "#,
            params![
                schedule.line_id,
                fmt_date(schedule.start_date),
                fmt_date(schedule.finish_date),
                fmt_date(schedule.current_finish_date),
                schedule.qty_total_target,
                schedule.qty_completed,
                schedule.days_extended,
                schedule.status.to_db_str(),
                schedule.notes,
                fmt_datetime(now()),
                schedule.schedule_id,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Schedule", &schedule.schedule_id));
        }
        Ok(())
    }

    /// 全量重算累计完成量 = Σ actual_output，返回重算后的值
    pub fn resum_qty_completed_tx(conn: &Connection, schedule_id: &str) -> RepositoryResult<i64> {
        let total: i64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(actual_output), 0)
            FROM schedule_daily_outputs
            WHERE schedule_id = ?1
            "#,
            params![schedule_id],
            |row| row.get(0),
        )?;

        conn.execute(
            "UPDATE schedules SET qty_completed = ?1, updated_at = ?2 WHERE schedule_id = ?3",
            params![total, fmt_datetime(now()), schedule_id],
        )?;

        Ok(total)
    }

    pub fn update_status_tx(
        conn: &Connection,
        schedule_id: &str,
        status: ScheduleStatus,
    ) -> RepositoryResult<()> {
        conn.execute(
            "UPDATE schedules SET status = ?1, updated_at = ?2 WHERE schedule_id = ?3",
            params![status.to_db_str(), fmt_datetime(now()), schedule_id],
        )?;
        Ok(())
    }

    /// 软删除
    pub fn soft_delete_tx(conn: &Connection, schedule_id: &str) -> RepositoryResult<()> {
        let ts = fmt_datetime(now());
        let affected = conn.execute(
            r#"
            UPDATE schedules SET deleted_at = ?1, updated_at = ?1
            WHERE schedule_id = ?2 AND deleted_at IS NULL
            "#,
            params![ts, schedule_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Schedule", schedule_id));
        }
        Ok(())
    }
}

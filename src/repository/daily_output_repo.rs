// ==========================================
// 产线排产系统 - 日产出数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 对齐: schedule_daily_outputs 表, UNIQUE(schedule_id, date)
// ==========================================

use crate::domain::schedule::ScheduleDailyOutput;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{fmt_date, fmt_datetime, get_date, get_datetime, now};
use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const DAILY_OUTPUT_COLUMNS: &str = r#"
    daily_output_id, schedule_id, date, target_output, actual_output,
    balance, is_completed, created_at, updated_at
"#;

fn map_daily_output(row: &Row) -> rusqlite::Result<ScheduleDailyOutput> {
    Ok(ScheduleDailyOutput {
        daily_output_id: row.get(0)?,
        schedule_id: row.get(1)?,
        date: get_date(row, 2)?,
        target_output: row.get(3)?,
        actual_output: row.get(4)?,
        balance: row.get(5)?,
        is_completed: row.get::<_, i64>(6)? != 0,
        created_at: get_datetime(row, 7)?,
        updated_at: get_datetime(row, 8)?,
    })
}

// ==========================================
// DailyOutputRepository - 日产出仓储
// ==========================================
pub struct DailyOutputRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DailyOutputRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn find_by_id(&self, daily_output_id: &str) -> RepositoryResult<Option<ScheduleDailyOutput>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, daily_output_id)
    }

    /// 查询排产的全部日产出（按日期升序）
    pub fn list_by_schedule(&self, schedule_id: &str) -> RepositoryResult<Vec<ScheduleDailyOutput>> {
        let conn = self.get_conn()?;
        Self::list_by_schedule_tx(&conn, schedule_id)
    }

    /// 按排产与日期查询
    pub fn find_by_schedule_and_date(
        &self,
        schedule_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<Option<ScheduleDailyOutput>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM schedule_daily_outputs WHERE schedule_id = ?1 AND date = ?2",
            DAILY_OUTPUT_COLUMNS
        );
        let row = conn
            .query_row(&sql, params![schedule_id, fmt_date(date)], map_daily_output)
            .optional()?;
        Ok(row)
    }

    // ==========================================
    // 事务内操作
    // ==========================================

    /// 批量插入日产出
    pub fn batch_insert_tx(conn: &Connection, rows: &[ScheduleDailyOutput]) -> RepositoryResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut stmt = conn.prepare(
            r#"
            INSERT INTO schedule_daily_outputs (
                daily_output_id, schedule_id, date, target_output, actual_output,
                balance, is_completed, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )?;

        for row in rows {
            stmt.execute(params![
                row.daily_output_id,
                row.schedule_id,
                fmt_date(row.date),
                row.target_output,
                row.actual_output,
                row.balance,
                if row.is_completed { 1 } else { 0 },
                fmt_datetime(row.created_at),
                fmt_datetime(row.updated_at),
            ])?;
        }

        Ok(rows.len())
    }

    pub fn find_by_id_tx(
        conn: &Connection,
        daily_output_id: &str,
    ) -> RepositoryResult<Option<ScheduleDailyOutput>> {
        let sql = format!(
            "SELECT {} FROM schedule_daily_outputs WHERE daily_output_id = ?1",
            DAILY_OUTPUT_COLUMNS
        );
        let row = conn
            .query_row(&sql, params![daily_output_id], map_daily_output)
            .optional()?;
        Ok(row)
    }

    pub fn get_tx(conn: &Connection, daily_output_id: &str) -> RepositoryResult<ScheduleDailyOutput> {
        Self::find_by_id_tx(conn, daily_output_id)?
            .ok_or_else(|| RepositoryError::not_found("ScheduleDailyOutput", daily_output_id))
    }

    pub fn list_by_schedule_tx(
        conn: &Connection,
        schedule_id: &str,
    ) -> RepositoryResult<Vec<ScheduleDailyOutput>> {
        let sql = format!(
            "SELECT {} FROM schedule_daily_outputs WHERE schedule_id = ?1 ORDER BY date ASC",
            DAILY_OUTPUT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![schedule_id], map_daily_output)?
            .collect::<rusqlite::Result<Vec<ScheduleDailyOutput>>>()?;
        Ok(rows)
    }

    /// 查询严格晚于 date 的最早日产出
    ///
    /// 最多返回两行：若两行同日，说明唯一约束被破坏，由调用方判定
    pub fn find_next_after_tx(
        conn: &Connection,
        schedule_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<ScheduleDailyOutput>> {
        let sql = format!(
            r#"
            SELECT {} FROM schedule_daily_outputs
            WHERE schedule_id = ?1 AND date > ?2
            ORDER BY date ASC
            LIMIT 2
            "#,
            DAILY_OUTPUT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![schedule_id, fmt_date(date)], map_daily_output)?
            .collect::<rusqlite::Result<Vec<ScheduleDailyOutput>>>()?;
        Ok(rows)
    }

    /// 回写实绩、差额与完成标志
    pub fn update_actual_tx(conn: &Connection, row: &ScheduleDailyOutput) -> RepositoryResult<()> {
        let affected = conn.execute(
            r#"
            UPDATE schedule_daily_outputs SET
                actual_output = ?1,
                balance = ?2,
                is_completed = ?3,
                updated_at = ?4
            WHERE daily_output_id = ?5
            "#,
            params![
                row.actual_output,
                row.balance,
                if row.is_completed { 1 } else { 0 },
                fmt_datetime(now()),
                row.daily_output_id,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("ScheduleDailyOutput", &row.daily_output_id));
        }
        Ok(())
    }

    /// 原地追加目标量，返回追加后的目标
    ///
    /// 不改动 actual_output / is_completed
    pub fn add_to_target_tx(
        conn: &Connection,
        daily_output_id: &str,
        delta: i64,
    ) -> RepositoryResult<i64> {
        let affected = conn.execute(
            r#"
            UPDATE schedule_daily_outputs
            SET target_output = target_output + ?1, updated_at = ?2
            WHERE daily_output_id = ?3
            "#,
            params![delta, fmt_datetime(now()), daily_output_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("ScheduleDailyOutput", daily_output_id));
        }

        let target: i64 = conn.query_row(
            "SELECT target_output FROM schedule_daily_outputs WHERE daily_output_id = ?1",
            params![daily_output_id],
            |row| row.get(0),
        )?;
        Ok(target)
    }

    /// 删除排产的全部日产出（改单重建时使用）
    pub fn delete_by_schedule_tx(conn: &Connection, schedule_id: &str) -> RepositoryResult<usize> {
        let deleted = conn.execute(
            "DELETE FROM schedule_daily_outputs WHERE schedule_id = ?1",
            params![schedule_id],
        )?;
        Ok(deleted)
    }

    /// 将排产的全部日产出日期整体平移 days 天，返回平移行数
    ///
    /// SQLite 的 UNIQUE 约束按行检查：正向平移从最晚日期开始，反向平移从最早日期开始，
    /// 避免中途与尚未移动的行冲突。
    pub fn shift_dates_tx(conn: &Connection, schedule_id: &str, days: i64) -> RepositoryResult<usize> {
        if days == 0 {
            return Ok(0);
        }

        let mut rows = Self::list_by_schedule_tx(conn, schedule_id)?;
        if days > 0 {
            rows.reverse();
        }

        let ts = fmt_datetime(now());
        let mut stmt = conn.prepare(
            "UPDATE schedule_daily_outputs SET date = ?1, updated_at = ?2 WHERE daily_output_id = ?3",
        )?;
        for row in &rows {
            let shifted = row.date + Duration::days(days);
            stmt.execute(params![fmt_date(shifted), ts, row.daily_output_id])?;
        }

        Ok(rows.len())
    }
}

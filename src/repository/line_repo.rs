// ==========================================
// 产线排产系统 - 产线数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 对齐: master_lines 表
// ==========================================

use crate::domain::line::Line;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{fmt_datetime, get_datetime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

fn map_line(row: &Row) -> rusqlite::Result<Line> {
    Ok(Line {
        line_id: row.get(0)?,
        line_code: row.get(1)?,
        line_name: row.get(2)?,
        daily_capacity: row.get(3)?,
        is_active: row.get::<_, i64>(4)? != 0,
        created_at: get_datetime(row, 5)?,
        updated_at: get_datetime(row, 6)?,
    })
}

// ==========================================
// LineRepository - 产线仓储
// ==========================================
pub struct LineRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LineRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, line: &Line) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, line)
    }

    pub fn find_by_id(&self, line_id: &str) -> RepositoryResult<Option<Line>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, line_id)
    }

    /// 按产线代码查询
    pub fn find_by_code(&self, line_code: &str) -> RepositoryResult<Option<Line>> {
        let conn = self.get_conn()?;
        let line = conn
            .query_row(
                r#"
                SELECT line_id, line_code, line_name, daily_capacity, is_active, created_at, updated_at
                FROM master_lines
                WHERE line_code = ?1
                "#,
                params![line_code],
                map_line,
            )
            .optional()?;
        Ok(line)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Line>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT line_id, line_code, line_name, daily_capacity, is_active, created_at, updated_at
            FROM master_lines
            ORDER BY line_code
            "#,
        )?;
        let lines = stmt
            .query_map([], map_line)?
            .collect::<rusqlite::Result<Vec<Line>>>()?;
        Ok(lines)
    }

    // ==========================================
    // 事务内操作
    // ==========================================

    pub fn insert_tx(conn: &Connection, line: &Line) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO master_lines (
                line_id, line_code, line_name, daily_capacity, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                line.line_id,
                line.line_code,
                line.line_name,
                line.daily_capacity,
                if line.is_active { 1 } else { 0 },
                fmt_datetime(line.created_at),
                fmt_datetime(line.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id_tx(conn: &Connection, line_id: &str) -> RepositoryResult<Option<Line>> {
        let line = conn
            .query_row(
                r#"
                SELECT line_id, line_code, line_name, daily_capacity, is_active, created_at, updated_at
                FROM master_lines
                WHERE line_id = ?1
                "#,
                params![line_id],
                map_line,
            )
            .optional()?;
        Ok(line)
    }

    pub fn get_tx(conn: &Connection, line_id: &str) -> RepositoryResult<Line> {
        Self::find_by_id_tx(conn, line_id)?
            .ok_or_else(|| RepositoryError::not_found("Line", line_id))
    }
}

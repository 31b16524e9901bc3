use super::core::ActionLogRepository;
use crate::domain::action_log::ActionLog;
use crate::repository::error::RepositoryResult;
use crate::repository::row_utils::get_datetime;
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

const ACTION_LOG_COLUMNS: &str =
    "action_id, action_type, action_ts, actor, entity_type, entity_id, payload_json, detail";

impl ActionLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 action_id 查询单个日志
    pub fn find_by_id(&self, action_id: &str) -> RepositoryResult<Option<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM action_log WHERE action_id = ?1",
            ACTION_LOG_COLUMNS
        );
        let log = conn
            .query_row(&sql, params![action_id], map_row)
            .optional()?;
        Ok(log)
    }

    /// 查询作用于指定对象的全部日志（按写入先后）
    ///
    /// # 参数
    /// - `entity_type`: "order" / "line" / "schedule" / "daily_output"
    pub fn find_by_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM action_log
            WHERE entity_type = ?1 AND entity_id = ?2
            ORDER BY action_ts ASC, rowid ASC
            "#,
            ACTION_LOG_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![entity_type, entity_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 统计指定操作人的操作总数
    pub fn count_by_actor(&self, actor: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM action_log WHERE actor = ?1",
            params![actor],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

// ==========================================
// 辅助方法
// ==========================================

/// 将数据库行映射为 ActionLog 实体
fn map_row(row: &Row) -> SqliteResult<ActionLog> {
    let payload_json_str: Option<String> = row.get(6)?;

    Ok(ActionLog {
        action_id: row.get(0)?,
        action_type: row.get(1)?,
        action_ts: get_datetime(row, 2)?,
        actor: row.get(3)?,
        entity_type: row.get(4)?,
        entity_id: row.get(5)?,
        // 损坏的 JSON 按缺失处理，不阻断审计查询
        payload_json: payload_json_str.and_then(|s| serde_json::from_str(&s).ok()),
        detail: row.get(7)?,
    })
}

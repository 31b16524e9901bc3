// ==========================================
// 产线排产系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::scheduling_config::{SchedulingConfig, DEFAULT_AVG_DAILY_OUTPUT};
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;

        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        serde_json::to_string(&json!(config_map))
            .map_err(|e| RepositoryError::InternalError(e.to_string()))
    }

    // ===== 排产引擎配置 =====

    /// 获取延期兜底日均产出
    ///
    /// # 默认值
    /// - 100（配置缺失、非整数或非正数时）
    pub fn get_default_avg_daily_output(&self) -> RepositoryResult<i64> {
        let raw = match self.get_global_config_value(config_keys::DEFAULT_AVG_DAILY_OUTPUT)? {
            Some(v) => v,
            None => return Ok(DEFAULT_AVG_DAILY_OUTPUT),
        };

        match raw.trim().parse::<i64>() {
            Ok(v) if v > 0 => Ok(v),
            _ => {
                tracing::warn!(
                    key = config_keys::DEFAULT_AVG_DAILY_OUTPUT,
                    value = %raw,
                    "配置值无效，使用默认值 {}",
                    DEFAULT_AVG_DAILY_OUTPUT
                );
                Ok(DEFAULT_AVG_DAILY_OUTPUT)
            }
        }
    }

    /// 加载排产引擎配置快照
    pub fn load_scheduling_config(&self) -> RepositoryResult<SchedulingConfig> {
        Ok(SchedulingConfig::with_default_avg_daily_output(
            self.get_default_avg_daily_output()?,
        ))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 延期兜底日均产出
    pub const DEFAULT_AVG_DAILY_OUTPUT: &str = "default_avg_daily_output";
}

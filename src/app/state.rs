// ==========================================
// 产线排产系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接、仓储、引擎与API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::ScheduleApi;
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{ScheduleEventPublisher, ScheduleOrchestrator};
use crate::repository::{
    ActionLogRepository, DailyOutputRepository, LineRepository, OrderRepository,
    ScheduleRepository,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "PRODUCTION_LINE_APS_DB_PATH";

const DB_FILE_NAME: &str = "production_line_aps.db";

/// 应用状态
///
/// 所有仓储与编排器共享同一个连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 排产API
    pub schedule_api: Arc<ScheduleApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 产线仓储（用于概览输出）
    pub line_repo: Arc<LineRepository>,

    /// 排产仓储（用于概览输出）
    pub schedule_repo: Arc<ScheduleRepository>,
}

impl AppState {
    /// 创建新的AppState实例（不发布事件）
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_event_publisher(db_path, None)
    }

    /// 创建AppState，并为编排器配置事件发布者
    ///
    /// # 说明
    /// 1. 打开数据库并幂等建表
    /// 2. 从 config_kv 加载排产引擎配置
    /// 3. 初始化Repository、编排器与API
    pub fn with_event_publisher(
        db_path: String,
        event_publisher: Option<Arc<dyn ScheduleEventPublisher>>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("无法初始化数据库结构: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 配置
        // ==========================================
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));
        let scheduling_config = config_manager
            .load_scheduling_config()
            .map_err(|e| format!("无法加载排产配置: {}", e))?;
        tracing::info!(
            default_avg_daily_output = scheduling_config.default_avg_daily_output,
            "排产配置已加载"
        );

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let order_repo = Arc::new(OrderRepository::new(conn.clone()));
        let line_repo = Arc::new(LineRepository::new(conn.clone()));
        let schedule_repo = Arc::new(ScheduleRepository::new(conn.clone()));
        let daily_output_repo = Arc::new(DailyOutputRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let mut orchestrator = ScheduleOrchestrator::new(conn, &scheduling_config);
        if let Some(publisher) = event_publisher {
            orchestrator = orchestrator.with_event_publisher(publisher);
        }

        // ==========================================
        // 初始化API层
        // ==========================================
        let schedule_api = Arc::new(ScheduleApi::new(
            order_repo,
            line_repo.clone(),
            schedule_repo.clone(),
            daily_output_repo,
            action_log_repo,
            Arc::new(orchestrator),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            schedule_api,
            config_manager,
            line_repo,
            schedule_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from(format!("./{}", DB_FILE_NAME));

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("production-line-aps");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join(DB_FILE_NAME);
        }
    }

    path.to_string_lossy().to_string()
}

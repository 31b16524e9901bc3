// ==========================================
// 产线排产系统 - 配置层
// ==========================================
// 职责: 系统配置管理
// 存储: config_kv 表 (scope_id = 'global')
// ==========================================

pub mod config_manager;
pub mod scheduling_config;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use scheduling_config::{SchedulingConfig, DEFAULT_AVG_DAILY_OUTPUT};

// ==========================================
// 产线排产系统 - 排产引擎配置
// ==========================================

use serde::{Deserialize, Serialize};

/// 延期兜底日均产出
///
/// 原计划日均目标为 0（目标总量小于天数）时使用，保证延期天数有限
pub const DEFAULT_AVG_DAILY_OUTPUT: i64 = 100;

/// 排产引擎配置快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// 延期兜底日均产出 (> 0)
    pub default_avg_daily_output: i64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_avg_daily_output: DEFAULT_AVG_DAILY_OUTPUT,
        }
    }
}

impl SchedulingConfig {
    /// 指定兜底日均产出，非正值回退为默认值
    pub fn with_default_avg_daily_output(value: i64) -> Self {
        if value <= 0 {
            return Self::default();
        }
        Self {
            default_avg_daily_output: value,
        }
    }
}

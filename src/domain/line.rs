// ==========================================
// 产线排产系统 - 产线领域模型
// ==========================================
// 对齐: master_lines 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Line - 生产线
// ==========================================
// 可用性: 区间内无重叠排产即可用（建单时校验，级联时不复核）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub line_id: String,      // 产线ID
    pub line_code: String,    // 产线代码 (唯一)
    pub line_name: String,    // 产线名称
    pub daily_capacity: i64,  // 日产能
    pub is_active: bool,      // 启用标志
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ==========================================
// 产线排产系统 - 操作日志领域模型
// ==========================================
// 红线: 订单/排产的所有写入必须记录 (谁、改了什么、何时)
// 对齐: action_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub action_type: String,       // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,  // 操作时间戳
    pub actor: String,             // 操作人

    // ===== 作用对象 =====
    pub entity_type: String,       // "order" / "schedule" / "daily_output"
    pub entity_id: String,

    pub payload_json: Option<JsonValue>, // 操作参数/变更内容 (JSON)
    pub detail: Option<String>,          // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateOrder,
    CreateLine,
    CreateSchedule,
    UpdateSchedule,
    DeleteSchedule,
    InputActualOutput,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreateOrder => "CREATE_ORDER",
            ActionType::CreateLine => "CREATE_LINE",
            ActionType::CreateSchedule => "CREATE_SCHEDULE",
            ActionType::UpdateSchedule => "UPDATE_SCHEDULE",
            ActionType::DeleteSchedule => "DELETE_SCHEDULE",
            ActionType::InputActualOutput => "INPUT_ACTUAL_OUTPUT",
        }
    }
}

impl ActionLog {
    /// 以当前时间构造一条日志
    pub fn new(
        action_type: ActionType,
        actor: &str,
        entity_type: &str,
        entity_id: &str,
        payload_json: Option<JsonValue>,
        detail: Option<String>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Local::now().naive_local(),
            actor: actor.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            payload_json,
            detail,
        }
    }
}

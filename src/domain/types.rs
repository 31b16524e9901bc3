// ==========================================
// 产线排产系统 - 领域类型定义
// ==========================================
// 职责: 订单状态、排产状态等枚举
// 序列化格式: snake_case (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 订单状态 (Order Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,    // 待排产
    Scheduled,  // 已排产
    InProgress, // 生产中
    Completed,  // 已完成
    Cancelled,  // 已取消
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl OrderStatus {
    /// 从数据库字符串解析（未知值返回 None，由调用方决定如何报错）
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(OrderStatus::Pending),
            "scheduled" => Some(OrderStatus::Scheduled),
            "in_progress" => Some(OrderStatus::InProgress),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Scheduled => "scheduled",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

// ==========================================
// 排产状态 (Schedule Status)
// ==========================================
// 状态机:
//   pending --(录入实绩, 未达标)--> in_progress --(达标)--> completed
//   in_progress --(发生延期)--> delayed --(达标)--> completed
// completed 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Pending,    // 待生产
    InProgress, // 生产中
    Completed,  // 已完成
    Delayed,    // 已延期
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ScheduleStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(ScheduleStatus::Pending),
            "in_progress" => Some(ScheduleStatus::InProgress),
            "completed" => Some(ScheduleStatus::Completed),
            "delayed" => Some(ScheduleStatus::Delayed),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "pending",
            ScheduleStatus::InProgress => "in_progress",
            ScheduleStatus::Completed => "completed",
            ScheduleStatus::Delayed => "delayed",
        }
    }

    /// 是否终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScheduleStatus::Completed)
    }

    /// 根据累计完成量推导录入实绩后的状态
    ///
    /// # 规则
    /// - 累计完成量 >= 目标量 → completed
    /// - completed 为终态，不回退
    /// - delayed 在未达标前保持 delayed
    /// - 其余 → in_progress
    pub fn after_progress(self, qty_completed: i64, qty_total_target: i64) -> ScheduleStatus {
        if self.is_terminal() {
            return self;
        }
        if qty_completed >= qty_total_target {
            return ScheduleStatus::Completed;
        }
        match self {
            ScheduleStatus::Delayed => ScheduleStatus::Delayed,
            _ => ScheduleStatus::InProgress,
        }
    }

    /// 订单状态跟随排产状态
    pub fn mirrored_order_status(&self) -> OrderStatus {
        match self {
            ScheduleStatus::Pending => OrderStatus::Scheduled,
            ScheduleStatus::Completed => OrderStatus::Completed,
            ScheduleStatus::InProgress | ScheduleStatus::Delayed => OrderStatus::InProgress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_db_round_trip() {
        for status in [
            ScheduleStatus::Pending,
            ScheduleStatus::InProgress,
            ScheduleStatus::Completed,
            ScheduleStatus::Delayed,
        ] {
            assert_eq!(ScheduleStatus::from_db_str(status.to_db_str()), Some(status));
        }
        assert_eq!(OrderStatus::from_db_str("IN_PROGRESS"), Some(OrderStatus::InProgress));
        assert_eq!(OrderStatus::from_db_str("unknown"), None);
    }

    #[test]
    fn test_after_progress_transitions() {
        let s = ScheduleStatus::Pending.after_progress(100, 500);
        assert_eq!(s, ScheduleStatus::InProgress);

        let s = s.after_progress(500, 500);
        assert_eq!(s, ScheduleStatus::Completed);

        // 终态不回退
        assert_eq!(s.after_progress(10, 500), ScheduleStatus::Completed);

        // 延期状态未达标时保持
        assert_eq!(
            ScheduleStatus::Delayed.after_progress(200, 500),
            ScheduleStatus::Delayed
        );
        assert_eq!(
            ScheduleStatus::Delayed.after_progress(600, 500),
            ScheduleStatus::Completed
        );
    }

    #[test]
    fn test_mirrored_order_status() {
        assert_eq!(
            ScheduleStatus::Delayed.mirrored_order_status(),
            OrderStatus::InProgress
        );
        assert_eq!(
            ScheduleStatus::Completed.mirrored_order_status(),
            OrderStatus::Completed
        );
    }
}

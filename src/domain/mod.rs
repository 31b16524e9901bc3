// ==========================================
// 产线排产系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、纯业务规则
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod line;
pub mod order;
pub mod schedule;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use line::Line;
pub use order::{Order, OrderProgress};
pub use schedule::{
    DailyTarget, NewSchedule, Schedule, ScheduleDailyOutput, ScheduleDetail, ScheduleUpdate,
};
pub use types::{OrderStatus, ScheduleStatus};

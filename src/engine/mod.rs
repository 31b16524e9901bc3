// ==========================================
// 产线排产系统 - 引擎层
// ==========================================
// 职责: 日目标拆分、实绩对账、差额平衡、延期、级联顺延
// 红线: Engine 不拼 SQL，数据访问一律经 Repository 的 *_tx 函数
// ==========================================

pub mod availability;
pub mod cascade;
pub mod daily_target;
pub mod error;
pub mod events;
pub mod extender;
pub mod orchestrator;
pub mod rebalancer;
pub mod reconciler;

// 重导出核心引擎
pub use availability::{AvailabilityReport, LineAvailability};
pub use cascade::{CascadeOutcome, CascadeShifter, ShiftedSchedule};
pub use daily_target::DailyTargetGenerator;
pub use error::{EngineError, EngineResult};
pub use events::{
    NoOpEventPublisher, OptionalEventPublisher, ScheduleEvent, ScheduleEventPublisher,
    ScheduleEventType,
};
pub use extender::{ExtensionOutcome, ExtensionPlan, ScheduleExtender};
pub use orchestrator::{InputActualOutputResult, ScheduleOrchestrator};
pub use rebalancer::{RebalanceOutcome, Rebalancer};
pub use reconciler::{OutputReconciler, ReconcileOutcome};

// ==========================================
// 产线排产系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: `*_tx` 关联函数接受 &Connection，供引擎在同一事务内组合
// ==========================================

pub mod action_log_repo;
pub mod daily_output_repo;
pub mod error;
pub mod line_repo;
pub mod order_repo;
pub mod row_utils;
pub mod schedule_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use daily_output_repo::DailyOutputRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use line_repo::LineRepository;
pub use order_repo::OrderRepository;
pub use schedule_repo::ScheduleRepository;

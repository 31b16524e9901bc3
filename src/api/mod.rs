// ==========================================
// 产线排产系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供外层请求处理调用
// ==========================================

pub mod error;
pub mod schedule_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use schedule_api::ScheduleApi;

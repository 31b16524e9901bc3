// ==========================================
// 产线排产系统 - 引擎层错误类型
// ==========================================
// 约束: 任一错误都使所在事务整体回滚，不存在部分生效
// ==========================================

use crate::repository::error::RepositoryError;
use chrono::NaiveDate;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 完工日早于开工日（总天数 <= 0）
    #[error("无效日期区间: start={start}, end={end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// 当日已完成且已有实绩，禁止重复录入
    #[error("当日实绩已完成，禁止重复录入: daily_output_id={daily_output_id}, date={date}, actual_output={actual_output}")]
    AlreadyCompleted {
        daily_output_id: String,
        date: NaiveDate,
        actual_output: i64,
    },

    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    /// 产线在申请区间已被占用（仅建单时校验）
    #[error("产线不可用: line_id={line_id}, {start}~{finish}, 原因: {reason}")]
    AvailabilityConflict {
        line_id: String,
        start: NaiveDate,
        finish: NaiveDate,
        reason: String,
        conflicting_schedule_ids: Vec<String>,
    },

    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// 数据完整性被破坏（如同一排产同日多行）
    #[error("数据完整性违反: {0}")]
    DataIntegrity(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            other => EngineError::Repository(other),
        }
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        EngineError::from(RepositoryError::from(err))
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_not_found_is_lifted() {
        let err: EngineError = RepositoryError::not_found("Schedule", "S1").into();
        match err {
            EngineError::NotFound { entity, id } => {
                assert_eq!(entity, "Schedule");
                assert_eq!(id, "S1");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}

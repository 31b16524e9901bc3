// ==========================================
// 产线排产系统 - API层错误类型
// ==========================================
// 职责: 将引擎层/仓储层错误转换为调用方可识别的错误
// 约束: 错误信息必须包含显式原因
// ==========================================

use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 排产规则错误
    // ==========================================
    #[error("无效日期区间: {0}")]
    InvalidRange(String),

    /// 当日已完成且已有实绩
    #[error("当日实绩已完成: daily_output_id={daily_output_id}, date={date}")]
    AlreadyCompleted { daily_output_id: String, date: String },

    #[error("产线不可用: line_id={line_id}, 原因: {reason}")]
    AvailabilityConflict {
        line_id: String,
        reason: String,
        conflicting_schedule_ids: Vec<String>,
    },

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("数据完整性违反: {0}")]
    DataIntegrity(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 调用方使用的错误代码
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidRange(_) => "INVALID_RANGE",
            ApiError::AlreadyCompleted { .. } => "ALREADY_COMPLETED",
            ApiError::AvailabilityConflict { .. } => "AVAILABILITY_CONFLICT",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BusinessRuleViolation(_) => "BUSINESS_RULE_VIOLATION",
            ApiError::DataIntegrity(_) => "DATA_INTEGRITY",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::DatabaseConnectionError(_) => "DATABASE_CONNECTION_ERROR",
            ApiError::DatabaseTransactionError(_) => "DATABASE_TRANSACTION_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Other(_) => "OTHER_ERROR",
        }
    }

    /// 转换为错误响应（供外层请求处理使用）
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: match self {
                ApiError::AvailabilityConflict {
                    conflicting_schedule_ids,
                    ..
                } => Some(serde_json::json!({
                    "conflicting_schedule_ids": conflicting_schedule_ids,
                })),
                _ => None,
            },
        }
    }
}

/// 错误响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    /// 详细信息（可选）
    pub details: Option<serde_json::Value>,
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::DataIntegrity(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidRange { start, end } => {
                ApiError::InvalidRange(format!("完工日 {} 早于开工日 {}", end, start))
            }
            EngineError::AlreadyCompleted {
                daily_output_id,
                date,
                ..
            } => ApiError::AlreadyCompleted {
                daily_output_id,
                date: date.to_string(),
            },
            EngineError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            EngineError::AvailabilityConflict {
                line_id,
                start,
                finish,
                reason,
                conflicting_schedule_ids,
            } => ApiError::AvailabilityConflict {
                line_id,
                reason: format!("{}~{} {}", start, finish, reason),
                conflicting_schedule_ids,
            },
            EngineError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            EngineError::DataIntegrity(msg) => ApiError::DataIntegrity(msg),
            EngineError::Repository(err) => ApiError::from(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

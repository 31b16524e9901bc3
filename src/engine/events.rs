// ==========================================
// 产线排产系统 - 引擎层事件发布
// ==========================================
// 职责: 定义排产变更事件发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，外部通知通道实现适配器
// 约束: 事件在事务提交后发布，发布失败不回滚已提交的变更
// ==========================================

use crate::domain::schedule::ScheduleDetail;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 排产事件类型
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleEventType {
    /// 排产创建
    ScheduleCreated,
    /// 排产修改（对外广播 schedule:updated）
    ScheduleUpdated,
    /// 排产软删除
    ScheduleDeleted,
    /// 实绩录入（含平衡/延期/顺延）
    ActualOutputRecorded,
}

impl ScheduleEventType {
    /// 转换为广播频道使用的字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            ScheduleEventType::ScheduleCreated => "schedule:created",
            ScheduleEventType::ScheduleUpdated => "schedule:updated",
            ScheduleEventType::ScheduleDeleted => "schedule:deleted",
            ScheduleEventType::ActualOutputRecorded => "schedule:output_recorded",
        }
    }
}

/// 排产事件
///
/// 负载为完整排产详情（含订单、产线、日产出）；软删除事件不带详情
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub event_type: ScheduleEventType,
    pub schedule_id: String,
    pub line_id: String,
    /// 操作人
    pub actor: Option<String>,
    pub detail: Option<ScheduleDetail>,
    /// 同一事件中被级联顺延的其它排产
    pub shifted_schedule_ids: Vec<String>,
}

impl ScheduleEvent {
    fn with_detail(event_type: ScheduleEventType, detail: ScheduleDetail, actor: Option<String>) -> Self {
        Self {
            event_type,
            schedule_id: detail.schedule.schedule_id.clone(),
            line_id: detail.schedule.line_id.clone(),
            actor,
            detail: Some(detail),
            shifted_schedule_ids: Vec::new(),
        }
    }

    pub fn created(detail: ScheduleDetail, actor: Option<String>) -> Self {
        Self::with_detail(ScheduleEventType::ScheduleCreated, detail, actor)
    }

    pub fn updated(detail: ScheduleDetail, actor: Option<String>) -> Self {
        Self::with_detail(ScheduleEventType::ScheduleUpdated, detail, actor)
    }

    pub fn output_recorded(
        detail: ScheduleDetail,
        actor: Option<String>,
        shifted_schedule_ids: Vec<String>,
    ) -> Self {
        Self {
            shifted_schedule_ids,
            ..Self::with_detail(ScheduleEventType::ActualOutputRecorded, detail, actor)
        }
    }

    pub fn deleted(schedule_id: String, line_id: String, actor: Option<String>) -> Self {
        Self {
            event_type: ScheduleEventType::ScheduleDeleted,
            schedule_id,
            line_id,
            actor,
            detail: None,
            shifted_schedule_ids: Vec::new(),
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 排产事件发布者 Trait
///
/// # 返回
/// - `Ok(message_id)`: 通道返回的消息 ID（如果支持）或空字符串
/// - `Err`: 发布失败
pub trait ScheduleEventPublisher: Send + Sync {
    fn publish(&self, event: ScheduleEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
///
/// 用于不需要事件发布的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl ScheduleEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: ScheduleEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - schedule_id={}, event_type={}",
            event.schedule_id,
            event.event_type.as_str()
        );
        Ok(String::new())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn ScheduleEventPublisher>> 的使用
#[derive(Clone)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn ScheduleEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn ScheduleEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    pub fn publish(&self, event: ScheduleEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(event),
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - schedule_id={}, event_type={}",
                    event.schedule_id,
                    event.event_type.as_str()
                );
                Ok(String::new())
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}

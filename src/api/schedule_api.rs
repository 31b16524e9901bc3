// ==========================================
// 产线排产系统 - 排产 API
// ==========================================
// 职责: 订单/产线登记、建单/改单/录入实绩/软删除、详情与进度查询
// 约束: 入参校验在此层完成，业务规则在引擎层
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::ActionLog;
use crate::domain::line::Line;
use crate::domain::order::{Order, OrderProgress};
use crate::domain::schedule::{
    NewSchedule, Schedule, ScheduleDailyOutput, ScheduleDetail, ScheduleUpdate,
};
use crate::domain::types::OrderStatus;
use crate::engine::availability::AvailabilityReport;
use crate::engine::orchestrator::{InputActualOutputResult, ScheduleOrchestrator};
use crate::repository::row_utils::now;
use crate::repository::{
    ActionLogRepository, DailyOutputRepository, LineRepository, OrderRepository,
    ScheduleRepository,
};

// ==========================================
// ScheduleApi - 排产 API
// ==========================================
pub struct ScheduleApi {
    order_repo: Arc<OrderRepository>,
    line_repo: Arc<LineRepository>,
    schedule_repo: Arc<ScheduleRepository>,
    daily_output_repo: Arc<DailyOutputRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    orchestrator: Arc<ScheduleOrchestrator>,
}

impl ScheduleApi {
    pub fn new(
        order_repo: Arc<OrderRepository>,
        line_repo: Arc<LineRepository>,
        schedule_repo: Arc<ScheduleRepository>,
        daily_output_repo: Arc<DailyOutputRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        orchestrator: Arc<ScheduleOrchestrator>,
    ) -> Self {
        Self {
            order_repo,
            line_repo,
            schedule_repo,
            daily_output_repo,
            action_log_repo,
            orchestrator,
        }
    }

    // ==========================================
    // 主数据登记
    // ==========================================

    /// 登记订单
    ///
    /// # 返回
    /// - Ok(String): 订单ID
    pub fn create_order(
        &self,
        order_no: &str,
        product_name: &str,
        qty_total: i64,
        order_date: NaiveDate,
        due_date: Option<NaiveDate>,
        actor: &str,
    ) -> ApiResult<String> {
        validate_actor(actor)?;
        if order_no.trim().is_empty() {
            return Err(ApiError::InvalidInput("订单编号不能为空".to_string()));
        }
        if qty_total <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "订单总量必须为正: qty_total={}",
                qty_total
            )));
        }
        if let Some(due) = due_date {
            if due < order_date {
                return Err(ApiError::InvalidInput(format!(
                    "交期 {} 早于下单日期 {}",
                    due, order_date
                )));
            }
        }

        let ts = now();
        let order = Order {
            order_id: uuid::Uuid::new_v4().to_string(),
            order_no: order_no.trim().to_string(),
            product_name: product_name.trim().to_string(),
            qty_total,
            order_date,
            due_date,
            status: OrderStatus::Pending,
            created_at: ts,
            updated_at: ts,
        };
        self.orchestrator.register_order(&order, actor)?;

        Ok(order.order_id)
    }

    /// 登记产线（产线代码唯一）
    pub fn create_line(
        &self,
        line_code: &str,
        line_name: &str,
        daily_capacity: i64,
        actor: &str,
    ) -> ApiResult<String> {
        validate_actor(actor)?;
        let line_code = line_code.trim();
        if line_code.is_empty() {
            return Err(ApiError::InvalidInput("产线代码不能为空".to_string()));
        }
        if daily_capacity < 0 {
            return Err(ApiError::InvalidInput(format!(
                "日产能不能为负: daily_capacity={}",
                daily_capacity
            )));
        }
        if self.line_repo.find_by_code(line_code)?.is_some() {
            return Err(ApiError::BusinessRuleViolation(format!(
                "产线代码已存在: {}",
                line_code
            )));
        }

        let ts = now();
        let line = Line {
            line_id: uuid::Uuid::new_v4().to_string(),
            line_code: line_code.to_string(),
            line_name: line_name.trim().to_string(),
            daily_capacity,
            is_active: true,
            created_at: ts,
            updated_at: ts,
        };
        self.orchestrator.register_line(&line, actor)?;

        Ok(line.line_id)
    }

    // ==========================================
    // 排产操作
    // ==========================================

    /// 创建排产
    pub fn create_schedule(&self, input: NewSchedule, actor: &str) -> ApiResult<Schedule> {
        validate_actor(actor)?;
        if input.qty_total_target <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "目标总量必须为正: qty_total_target={}",
                input.qty_total_target
            )));
        }
        Ok(self.orchestrator.create_schedule(input, actor)?)
    }

    /// 修改排产
    pub fn update_schedule(
        &self,
        schedule_id: &str,
        update: ScheduleUpdate,
        actor: &str,
    ) -> ApiResult<ScheduleDetail> {
        validate_actor(actor)?;
        if update.is_empty() {
            return Err(ApiError::InvalidInput("未指定任何修改字段".to_string()));
        }
        if let Some(qty) = update.qty_total_target {
            if qty <= 0 {
                return Err(ApiError::InvalidInput(format!(
                    "目标总量必须为正: qty_total_target={}",
                    qty
                )));
            }
        }
        Ok(self.orchestrator.update_schedule(schedule_id, update, actor)?)
    }

    /// 录入单日实绩
    pub fn input_actual_output(
        &self,
        daily_output_id: &str,
        actual_output: i64,
        actor: &str,
    ) -> ApiResult<InputActualOutputResult> {
        validate_actor(actor)?;
        if actual_output < 0 {
            return Err(ApiError::InvalidInput(format!(
                "实绩不能为负: actual_output={}",
                actual_output
            )));
        }
        Ok(self
            .orchestrator
            .input_actual_output(daily_output_id, actual_output, actor)?)
    }

    /// 软删除排产
    pub fn delete_schedule(&self, schedule_id: &str, actor: &str) -> ApiResult<()> {
        validate_actor(actor)?;
        Ok(self.orchestrator.delete_schedule(schedule_id, actor)?)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_schedule_detail(&self, schedule_id: &str) -> ApiResult<ScheduleDetail> {
        Ok(self.orchestrator.load_detail(schedule_id)?)
    }

    /// 按产线查询有效排产（开工日升序）
    pub fn list_schedules_by_line(&self, line_id: &str) -> ApiResult<Vec<Schedule>> {
        Ok(self.schedule_repo.list_by_line(line_id)?)
    }

    pub fn list_daily_outputs(&self, schedule_id: &str) -> ApiResult<Vec<ScheduleDailyOutput>> {
        if self.schedule_repo.find_by_id(schedule_id)?.is_none() {
            return Err(ApiError::NotFound(format!("Schedule(id={})不存在", schedule_id)));
        }
        Ok(self.daily_output_repo.list_by_schedule(schedule_id)?)
    }

    pub fn list_lines(&self) -> ApiResult<Vec<Line>> {
        Ok(self.line_repo.list_all()?)
    }

    /// 订单进度（只统计有效排产）
    pub fn get_order_progress(&self, order_id: &str) -> ApiResult<OrderProgress> {
        let order = self
            .order_repo
            .find_by_id(order_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Order(id={})不存在", order_id)))?;
        let schedules = self.schedule_repo.list_by_order(order_id)?;
        Ok(order.progress(&schedules))
    }

    pub fn check_line_availability(
        &self,
        line_id: &str,
        start: NaiveDate,
        finish: NaiveDate,
        exclude_schedule_id: Option<&str>,
    ) -> ApiResult<AvailabilityReport> {
        Ok(self
            .orchestrator
            .check_line_availability(line_id, start, finish, exclude_schedule_id)?)
    }

    pub fn list_action_logs_by_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.find_by_entity(entity_type, entity_id)?)
    }
}

fn validate_actor(actor: &str) -> ApiResult<()> {
    if actor.trim().is_empty() {
        return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
    }
    Ok(())
}

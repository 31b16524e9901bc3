// ==========================================
// 产线排产系统 - 引擎编排器
// ==========================================
// 用途: 建单 / 改单 / 录入实绩 / 软删除 的统一入口
// 流程: 录入实绩 → 对账 → (欠产) 平衡 → (最后一天) 延期 → 级联顺延
// 红线: 每次调用在一个 BEGIN IMMEDIATE 事务内完成，任一步失败整体回滚
// 红线: 事件在提交后发布，发布失败只记录告警
// ==========================================

use crate::config::SchedulingConfig;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::line::Line;
use crate::domain::order::Order;
use crate::domain::schedule::{
    NewSchedule, Schedule, ScheduleDailyOutput, ScheduleDetail, ScheduleUpdate,
};
use crate::domain::types::{OrderStatus, ScheduleStatus};
use crate::engine::availability::{AvailabilityReport, LineAvailability};
use crate::engine::daily_target::DailyTargetGenerator;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::{OptionalEventPublisher, ScheduleEvent, ScheduleEventPublisher};
use crate::engine::extender::ScheduleExtender;
use crate::engine::rebalancer::{RebalanceOutcome, Rebalancer};
use crate::engine::reconciler::OutputReconciler;
use crate::repository::error::RepositoryError;
use crate::repository::row_utils::now;
use crate::repository::{
    ActionLogRepository, DailyOutputRepository, LineRepository, OrderRepository,
    ScheduleRepository,
};
use chrono::NaiveDate;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Serialize;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

const ENTITY_ORDER: &str = "order";
const ENTITY_LINE: &str = "line";
const ENTITY_SCHEDULE: &str = "schedule";
const ENTITY_DAILY_OUTPUT: &str = "daily_output";

// ==========================================
// InputActualOutputResult - 录入实绩结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct InputActualOutputResult {
    pub daily_output: ScheduleDailyOutput,
    /// 平衡/延期之后的排产
    pub schedule: Schedule,
    pub previous_status: ScheduleStatus,
    pub balance: i64,
    pub rebalance: RebalanceOutcome,
}

impl InputActualOutputResult {
    pub fn shifted_schedule_ids(&self) -> Vec<String> {
        match &self.rebalance {
            RebalanceOutcome::Extended(outcome) => outcome
                .cascade
                .shifted
                .iter()
                .map(|s| s.schedule_id.clone())
                .collect(),
            _ => Vec::new(),
        }
    }
}

// ==========================================
// ScheduleOrchestrator - 引擎编排器
// ==========================================
pub struct ScheduleOrchestrator {
    conn: Arc<Mutex<Connection>>,
    generator: DailyTargetGenerator,
    reconciler: OutputReconciler,
    rebalancer: Rebalancer,
    availability: LineAvailability,
    event_publisher: OptionalEventPublisher,
}

impl ScheduleOrchestrator {
    /// 创建编排器实例（不发布事件）
    ///
    /// # 参数
    /// - conn: 共享数据库连接
    /// - config: 排产引擎配置快照
    pub fn new(conn: Arc<Mutex<Connection>>, config: &SchedulingConfig) -> Self {
        Self {
            conn,
            generator: DailyTargetGenerator::new(),
            reconciler: OutputReconciler::new(),
            rebalancer: Rebalancer::new(ScheduleExtender::new(config)),
            availability: LineAvailability::new(),
            event_publisher: OptionalEventPublisher::none(),
        }
    }

    /// 配置事件发布者
    pub fn with_event_publisher(mut self, publisher: Arc<dyn ScheduleEventPublisher>) -> Self {
        self.event_publisher = OptionalEventPublisher::with_publisher(publisher);
        self
    }

    // ==========================================
    // 主数据登记
    // ==========================================

    /// 登记订单（与操作日志同一事务）
    pub fn register_order(&self, order: &Order, actor: &str) -> EngineResult<()> {
        self.in_transaction(|tx| {
            OrderRepository::insert_tx(tx, order)?;
            ActionLogRepository::insert_tx(
                tx,
                &ActionLog::new(
                    ActionType::CreateOrder,
                    actor,
                    ENTITY_ORDER,
                    &order.order_id,
                    Some(json!({
                        "order_no": order.order_no,
                        "qty_total": order.qty_total,
                    })),
                    Some(format!("登记订单: {}", order.order_no)),
                ),
            )?;
            Ok(())
        })?;

        info!(order_id = %order.order_id, order_no = %order.order_no, actor, "订单已登记");
        Ok(())
    }

    /// 登记产线（与操作日志同一事务）
    pub fn register_line(&self, line: &Line, actor: &str) -> EngineResult<()> {
        self.in_transaction(|tx| {
            LineRepository::insert_tx(tx, line)?;
            ActionLogRepository::insert_tx(
                tx,
                &ActionLog::new(
                    ActionType::CreateLine,
                    actor,
                    ENTITY_LINE,
                    &line.line_id,
                    Some(json!({
                        "line_code": line.line_code,
                        "daily_capacity": line.daily_capacity,
                    })),
                    Some(format!("登记产线: {}", line.line_code)),
                ),
            )?;
            Ok(())
        })?;

        info!(line_id = %line.line_id, line_code = %line.line_code, actor, "产线已登记");
        Ok(())
    }

    // ==========================================
    // 建单
    // ==========================================

    /// 创建排产
    ///
    /// # 步骤
    /// 1. 拆分日目标（区间无效直接失败，不产生任何写入）
    /// 2. 校验订单存在、产线可用
    /// 3. 写入排产与全部日产出，订单置为 scheduled
    pub fn create_schedule(&self, input: NewSchedule, actor: &str) -> EngineResult<Schedule> {
        if input.qty_total_target < 0 {
            return Err(EngineError::InvalidInput(format!(
                "目标总量不能为负: qty_total_target={}",
                input.qty_total_target
            )));
        }

        let targets =
            self.generator
                .generate(input.qty_total_target, input.start_date, input.finish_date)?;

        let (schedule, detail) = self.in_transaction(|tx| {
            OrderRepository::get_tx(tx, &input.order_id)?;
            self.availability
                .check_tx(tx, &input.line_id, input.start_date, input.finish_date, None)?
                .into_result()?;

            let ts = now();
            let schedule = Schedule {
                schedule_id: uuid::Uuid::new_v4().to_string(),
                order_id: input.order_id.clone(),
                line_id: input.line_id.clone(),
                start_date: input.start_date,
                finish_date: input.finish_date,
                current_finish_date: input.finish_date,
                qty_total_target: input.qty_total_target,
                qty_completed: 0,
                days_extended: 0,
                status: ScheduleStatus::Pending,
                notes: input.notes.clone(),
                created_at: ts,
                updated_at: ts,
                deleted_at: None,
            };
            ScheduleRepository::insert_tx(tx, &schedule)?;

            let rows: Vec<ScheduleDailyOutput> = targets
                .into_iter()
                .map(|t| t.into_daily_output(&schedule.schedule_id, ts))
                .collect();
            DailyOutputRepository::batch_insert_tx(tx, &rows)?;

            OrderRepository::update_status_tx(tx, &schedule.order_id, OrderStatus::Scheduled)?;

            ActionLogRepository::insert_tx(
                tx,
                &ActionLog::new(
                    ActionType::CreateSchedule,
                    actor,
                    ENTITY_SCHEDULE,
                    &schedule.schedule_id,
                    Some(json!({
                        "order_id": schedule.order_id,
                        "line_id": schedule.line_id,
                        "start_date": schedule.start_date,
                        "finish_date": schedule.finish_date,
                        "qty_total_target": schedule.qty_total_target,
                        "daily_rows": rows.len(),
                    })),
                    None,
                ),
            )?;

            let detail = Self::load_detail_tx(tx, &schedule.schedule_id)?;
            Ok((schedule, detail))
        })?;

        info!(
            schedule_id = %schedule.schedule_id,
            order_id = %schedule.order_id,
            line_id = %schedule.line_id,
            start_date = %schedule.start_date,
            finish_date = %schedule.finish_date,
            qty_total_target = schedule.qty_total_target,
            actor,
            "排产已创建"
        );

        self.publish(ScheduleEvent::created(detail, Some(actor.to_string())));
        Ok(schedule)
    }

    // ==========================================
    // 改单
    // ==========================================

    /// 修改排产
    ///
    /// 开工日/完工日/目标总量任一变化时，删除并重建全部日产出（已录实绩随之丢弃），
    /// 延期与进度同时清零；否则仅更新字段。提交后广播 schedule:updated。
    pub fn update_schedule(
        &self,
        schedule_id: &str,
        update: ScheduleUpdate,
        actor: &str,
    ) -> EngineResult<ScheduleDetail> {
        if let Some(qty) = update.qty_total_target {
            if qty < 0 {
                return Err(EngineError::InvalidInput(format!(
                    "目标总量不能为负: qty_total_target={}",
                    qty
                )));
            }
        }

        let (detail, regenerated) = self.in_transaction(|tx| {
            let current = ScheduleRepository::get_tx(tx, schedule_id)?;
            let regenerate = update.requires_regeneration(&current);

            let mut next = current.clone();
            if let Some(line_id) = &update.line_id {
                if *line_id != current.line_id {
                    LineRepository::get_tx(tx, line_id)?;
                }
                next.line_id = line_id.clone();
            }
            if let Some(start) = update.start_date {
                next.start_date = start;
            }
            if let Some(finish) = update.finish_date {
                next.finish_date = finish;
            }
            if let Some(qty) = update.qty_total_target {
                next.qty_total_target = qty;
            }
            if let Some(notes) = &update.notes {
                next.notes = Some(notes.clone());
            }

            // 换线或改期时校验新区间（排除自身）
            let moved = next.line_id != current.line_id
                || next.start_date != current.start_date
                || next.finish_date != current.finish_date;
            if moved {
                let occupied_until = if regenerate {
                    next.finish_date
                } else {
                    next.current_finish_date
                };
                self.availability
                    .check_tx(tx, &next.line_id, next.start_date, occupied_until, Some(schedule_id))?
                    .into_result()?;
            }

            if regenerate {
                let targets =
                    self.generator
                        .generate(next.qty_total_target, next.start_date, next.finish_date)?;

                next.current_finish_date = next.finish_date;
                next.days_extended = 0;
                next.qty_completed = 0;
                next.status = ScheduleStatus::Pending;

                DailyOutputRepository::delete_by_schedule_tx(tx, schedule_id)?;
                let ts = now();
                let rows: Vec<ScheduleDailyOutput> = targets
                    .into_iter()
                    .map(|t| t.into_daily_output(schedule_id, ts))
                    .collect();
                DailyOutputRepository::batch_insert_tx(tx, &rows)?;
                OrderRepository::update_status_tx(
                    tx,
                    &next.order_id,
                    next.status.mirrored_order_status(),
                )?;
            }

            ScheduleRepository::update_tx(tx, &next)?;

            ActionLogRepository::insert_tx(
                tx,
                &ActionLog::new(
                    ActionType::UpdateSchedule,
                    actor,
                    ENTITY_SCHEDULE,
                    schedule_id,
                    Some(json!({
                        "changes": &update,
                        "regenerated": regenerate,
                        "before": {
                            "line_id": current.line_id,
                            "start_date": current.start_date,
                            "finish_date": current.finish_date,
                            "qty_total_target": current.qty_total_target,
                        },
                    })),
                    None,
                ),
            )?;

            let detail = Self::load_detail_tx(tx, schedule_id)?;
            Ok((detail, regenerate))
        })?;

        info!(
            schedule_id,
            regenerated,
            daily_rows = detail.daily_outputs.len(),
            actor,
            "排产已修改"
        );

        self.publish(ScheduleEvent::updated(detail.clone(), Some(actor.to_string())));
        Ok(detail)
    }

    // ==========================================
    // 录入实绩
    // ==========================================

    /// 录入单日实绩
    ///
    /// 对账、平衡、延期、级联顺延在同一事务内完成
    pub fn input_actual_output(
        &self,
        daily_output_id: &str,
        actual_output: i64,
        actor: &str,
    ) -> EngineResult<InputActualOutputResult> {
        let (result, detail) = self.in_transaction(|tx| {
            let reconciled = self.reconciler.reconcile_tx(tx, daily_output_id, actual_output)?;

            let rebalance = if reconciled.triggers_rebalance {
                self.rebalancer.rebalance_tx(
                    tx,
                    &reconciled.schedule,
                    reconciled.daily_output.date,
                    reconciled.balance,
                )?
            } else {
                RebalanceOutcome::NotRequired
            };

            let schedule_id = reconciled.schedule.schedule_id.clone();
            let result = InputActualOutputResult {
                schedule: ScheduleRepository::get_tx(tx, &schedule_id)?,
                daily_output: reconciled.daily_output,
                previous_status: reconciled.previous_status,
                balance: reconciled.balance,
                rebalance,
            };

            ActionLogRepository::insert_tx(
                tx,
                &ActionLog::new(
                    ActionType::InputActualOutput,
                    actor,
                    ENTITY_DAILY_OUTPUT,
                    daily_output_id,
                    Some(json!({
                        "schedule_id": schedule_id,
                        "date": result.daily_output.date,
                        "target_output": result.daily_output.target_output,
                        "actual_output": result.daily_output.actual_output,
                        "balance": result.balance,
                        "rebalance": &result.rebalance,
                        "status": result.schedule.status,
                    })),
                    None,
                ),
            )?;

            let detail = Self::load_detail_tx(tx, &schedule_id)?;
            Ok((result, detail))
        })?;

        info!(
            schedule_id = %result.schedule.schedule_id,
            date = %result.daily_output.date,
            actual_output,
            balance = result.balance,
            extended = result.rebalance.is_extended(),
            status = %result.schedule.status,
            actor,
            "实绩已录入"
        );

        self.publish(ScheduleEvent::output_recorded(
            detail,
            Some(actor.to_string()),
            result.shifted_schedule_ids(),
        ));
        Ok(result)
    }

    // ==========================================
    // 软删除
    // ==========================================

    /// 软删除排产（日产出保留，后续查询/顺延/可用性校验均忽略）
    pub fn delete_schedule(&self, schedule_id: &str, actor: &str) -> EngineResult<()> {
        let schedule = self.in_transaction(|tx| {
            let schedule = ScheduleRepository::get_tx(tx, schedule_id)?;
            ScheduleRepository::soft_delete_tx(tx, schedule_id)?;

            ActionLogRepository::insert_tx(
                tx,
                &ActionLog::new(
                    ActionType::DeleteSchedule,
                    actor,
                    ENTITY_SCHEDULE,
                    schedule_id,
                    Some(json!({
                        "order_id": schedule.order_id,
                        "line_id": schedule.line_id,
                        "qty_completed": schedule.qty_completed,
                    })),
                    None,
                ),
            )?;
            Ok(schedule)
        })?;

        info!(schedule_id, line_id = %schedule.line_id, actor, "排产已软删除");

        self.publish(ScheduleEvent::deleted(
            schedule.schedule_id,
            schedule.line_id,
            Some(actor.to_string()),
        ));
        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 读取排产详情（含订单、产线、日产出）
    pub fn load_detail(&self, schedule_id: &str) -> EngineResult<ScheduleDetail> {
        let conn = self.lock_conn()?;
        Self::load_detail_tx(&conn, schedule_id)
    }

    /// 查询产线在区间内的占用情况（只读）
    pub fn check_line_availability(
        &self,
        line_id: &str,
        start: NaiveDate,
        finish: NaiveDate,
        exclude_schedule_id: Option<&str>,
    ) -> EngineResult<AvailabilityReport> {
        let conn = self.lock_conn()?;
        self.availability
            .check_tx(&conn, line_id, start, finish, exclude_schedule_id)
    }

    fn load_detail_tx(conn: &Connection, schedule_id: &str) -> EngineResult<ScheduleDetail> {
        let schedule = ScheduleRepository::get_tx(conn, schedule_id)?;
        let order = OrderRepository::get_tx(conn, &schedule.order_id)?;
        let line = LineRepository::get_tx(conn, &schedule.line_id)?;
        let daily_outputs = DailyOutputRepository::list_by_schedule_tx(conn, schedule_id)?;
        Ok(ScheduleDetail {
            schedule,
            order,
            line,
            daily_outputs,
        })
    }

    // ==========================================
    // 内部工具
    // ==========================================

    fn lock_conn(&self) -> EngineResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| EngineError::from(RepositoryError::LockError(e.to_string())))
    }

    /// 在 IMMEDIATE 事务中执行；闭包返回 Err 时事务随 drop 回滚
    fn in_transaction<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> EngineResult<T>,
    {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn publish(&self, event: ScheduleEvent) {
        let schedule_id = event.schedule_id.clone();
        let event_type = event.event_type;
        if let Err(e) = self.event_publisher.publish(event) {
            warn!(
                schedule_id = %schedule_id,
                event_type = event_type.as_str(),
                error = %e,
                "排产事件发布失败"
            );
        }
    }
}

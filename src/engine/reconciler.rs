// ==========================================
// 产线排产系统 - 实绩对账引擎
// ==========================================
// 职责: 录入单日实绩 → 计算差额/完成标志 → 全量重算累计完成量 → 推进状态
// 红线: 累计完成量必须全量重算（Σ actual_output），不做增量累加
// 红线: 超产（差额为负）不触发平衡
// ==========================================

use crate::domain::schedule::{Schedule, ScheduleDailyOutput};
use crate::domain::types::ScheduleStatus;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::{DailyOutputRepository, OrderRepository, ScheduleRepository};
use rusqlite::Connection;
use tracing::debug;

// ==========================================
// ReconcileOutcome - 对账结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// 回写后的日产出
    pub daily_output: ScheduleDailyOutput,
    /// 重算累计完成量、推进状态后的排产
    pub schedule: Schedule,
    pub previous_status: ScheduleStatus,
    /// target - actual，可为负
    pub balance: i64,
    /// balance > 0 时需要平衡
    pub triggers_rebalance: bool,
}

// ==========================================
// OutputReconciler - 实绩对账
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputReconciler;

impl OutputReconciler {
    pub fn new() -> Self {
        Self
    }

    /// 计算录入实绩后的日产出（纯函数）
    ///
    /// # 规则
    /// - 已完成且已有实绩 (> 0) 的日期拒绝重复录入
    /// - balance = target - actual
    /// - is_completed = actual >= target
    pub fn apply(
        &self,
        daily_output: &ScheduleDailyOutput,
        actual_output: i64,
    ) -> EngineResult<ScheduleDailyOutput> {
        if actual_output < 0 {
            return Err(EngineError::InvalidInput(format!(
                "实绩不能为负: actual_output={}",
                actual_output
            )));
        }

        if daily_output.is_completed && daily_output.actual_output > 0 {
            return Err(EngineError::AlreadyCompleted {
                daily_output_id: daily_output.daily_output_id.clone(),
                date: daily_output.date,
                actual_output: daily_output.actual_output,
            });
        }

        let mut updated = daily_output.clone();
        updated.actual_output = actual_output;
        updated.balance = daily_output.target_output - actual_output;
        updated.is_completed = actual_output >= daily_output.target_output;
        Ok(updated)
    }

    /// 在调用方事务中录入实绩并回写
    ///
    /// # 步骤
    /// 1. 读取日产出与所属有效排产（不存在/已软删除 → NotFound）
    /// 2. 计算并回写日产出
    /// 3. 全量重算排产累计完成量
    /// 4. 推进排产状态，订单状态跟随
    pub fn reconcile_tx(
        &self,
        conn: &Connection,
        daily_output_id: &str,
        actual_output: i64,
    ) -> EngineResult<ReconcileOutcome> {
        let daily_output = DailyOutputRepository::get_tx(conn, daily_output_id)?;
        let mut schedule = ScheduleRepository::get_tx(conn, &daily_output.schedule_id)?;

        let updated = self.apply(&daily_output, actual_output)?;
        DailyOutputRepository::update_actual_tx(conn, &updated)?;

        let qty_completed = ScheduleRepository::resum_qty_completed_tx(conn, &schedule.schedule_id)?;
        let previous_status = schedule.status;
        let next_status = previous_status.after_progress(qty_completed, schedule.qty_total_target);

        schedule.qty_completed = qty_completed;
        schedule.status = next_status;

        if next_status != previous_status {
            ScheduleRepository::update_status_tx(conn, &schedule.schedule_id, next_status)?;
        }
        OrderRepository::update_status_tx(
            conn,
            &schedule.order_id,
            next_status.mirrored_order_status(),
        )?;

        debug!(
            schedule_id = %schedule.schedule_id,
            date = %updated.date,
            target = updated.target_output,
            actual = updated.actual_output,
            balance = updated.balance,
            qty_completed,
            status = %next_status,
            "实绩对账完成"
        );

        Ok(ReconcileOutcome {
            balance: updated.balance,
            triggers_rebalance: updated.balance > 0,
            daily_output: updated,
            schedule,
            previous_status,
        })
    }
}

// ==========================================
// 产线排产系统 - 排产延期引擎
// ==========================================
// 规则:
// - 日均产出 = 原计划日均目标 floor(目标总量 / 原计划天数)，为 0 时取配置兜底值
// - 延期天数 = ceil(剩余量 / 日均产出)
// - 延期总是追加在**当前**完工日之后（多次延期累加）
// - 新增日期的目标均为日均产出，实绩为 0
// - 延期后触发级联顺延
// - 已完成的排产不延期（completed 为终态）
// ==========================================

use crate::config::SchedulingConfig;
use crate::domain::schedule::{Schedule, ScheduleDailyOutput};
use crate::domain::types::ScheduleStatus;
use crate::engine::cascade::{CascadeOutcome, CascadeShifter};
use crate::engine::daily_target::DailyTargetGenerator;
use crate::engine::error::EngineResult;
use crate::repository::row_utils::now;
use crate::repository::{DailyOutputRepository, ScheduleRepository};
use chrono::{Duration, NaiveDate};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// ==========================================
// ExtensionPlan - 延期计算结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionPlan {
    pub remaining_qty: i64,
    pub avg_daily_output: i64,
    /// 是否使用了兜底日均产出
    pub used_fallback: bool,
    pub days_needed: i64,
    pub old_current_finish_date: NaiveDate,
    pub new_current_finish_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionOutcome {
    pub plan: ExtensionPlan,
    /// 延期后的排产
    pub schedule: Schedule,
    pub new_daily_outputs: Vec<ScheduleDailyOutput>,
    pub cascade: CascadeOutcome,
}

// ==========================================
// ScheduleExtender - 排产延期
// ==========================================
#[derive(Debug, Clone)]
pub struct ScheduleExtender {
    default_avg_daily_output: i64,
    generator: DailyTargetGenerator,
    cascade: CascadeShifter,
}

impl ScheduleExtender {
    pub fn new(config: &SchedulingConfig) -> Self {
        Self {
            default_avg_daily_output: config.default_avg_daily_output.max(1),
            generator: DailyTargetGenerator::new(),
            cascade: CascadeShifter::new(),
        }
    }

    /// 计算延期方案（纯函数）
    ///
    /// 剩余量非正时返回 None
    pub fn plan(&self, schedule: &Schedule, remaining_qty: i64) -> Option<ExtensionPlan> {
        if remaining_qty <= 0 {
            return None;
        }

        let base = schedule.base_target_per_day();
        let (avg_daily_output, used_fallback) = if base > 0 {
            (base, false)
        } else {
            (self.default_avg_daily_output, true)
        };

        let days_needed = (remaining_qty + avg_daily_output - 1) / avg_daily_output;
        let old_current_finish_date = schedule.current_finish_date;

        Some(ExtensionPlan {
            remaining_qty,
            avg_daily_output,
            used_fallback,
            days_needed,
            old_current_finish_date,
            new_current_finish_date: old_current_finish_date + Duration::days(days_needed),
        })
    }

    /// 在调用方事务中执行延期并级联顺延
    ///
    /// # 返回
    /// - Ok(None): 剩余量非正或排产已完成，无需延期
    /// - Ok(Some(outcome)): 延期与顺延结果
    pub fn extend_tx(
        &self,
        conn: &Connection,
        schedule: &Schedule,
        remaining_qty: i64,
    ) -> EngineResult<Option<ExtensionOutcome>> {
        if schedule.status.is_terminal() {
            debug!(
                schedule_id = %schedule.schedule_id,
                remaining_qty,
                "排产已完成，跳过延期"
            );
            return Ok(None);
        }

        let plan = match self.plan(schedule, remaining_qty) {
            Some(p) => p,
            None => return Ok(None),
        };

        if plan.used_fallback {
            warn!(
                schedule_id = %schedule.schedule_id,
                qty_total_target = schedule.qty_total_target,
                planned_days = schedule.planned_days(),
                fallback = plan.avg_daily_output,
                "原计划日均目标为 0，使用兜底日均产出"
            );
        }

        let mut extended = schedule.clone();
        extended.current_finish_date = plan.new_current_finish_date;
        extended.days_extended += plan.days_needed;
        extended.status = ScheduleStatus::Delayed;
        ScheduleRepository::update_tx(conn, &extended)?;

        let ts = now();
        let new_daily_outputs: Vec<ScheduleDailyOutput> = self
            .generator
            .generate_fixed(
                plan.avg_daily_output,
                plan.old_current_finish_date,
                plan.new_current_finish_date,
            )
            .into_iter()
            .map(|t| t.into_daily_output(&extended.schedule_id, ts))
            .collect();
        DailyOutputRepository::batch_insert_tx(conn, &new_daily_outputs)?;

        info!(
            schedule_id = %extended.schedule_id,
            remaining_qty,
            avg_daily_output = plan.avg_daily_output,
            days_needed = plan.days_needed,
            new_current_finish_date = %plan.new_current_finish_date,
            days_extended = extended.days_extended,
            "排产已延期"
        );

        let cascade = self.cascade.shift_tx(conn, &extended, plan.days_needed)?;

        Ok(Some(ExtensionOutcome {
            plan,
            schedule: extended,
            new_daily_outputs,
            cascade,
        }))
    }
}

// ==========================================
// 产线排产系统 - 差额平衡引擎
// ==========================================
// 规则:
// - 欠产差额加到严格晚于欠产日的下一天（按日期，不按行ID）的目标上
// - 只追加目标，不改动该日实绩与完成标志
// - 欠产日已是最后一天时，转交延期引擎
// - 同一天重复录入时按当次差额再推一次，先前推入的量不撤回
// ==========================================

use crate::domain::schedule::Schedule;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::extender::{ExtensionOutcome, ScheduleExtender};
use crate::repository::DailyOutputRepository;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ==========================================
// RebalanceOutcome - 平衡结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RebalanceOutcome {
    /// 差额非正，无需平衡
    NotRequired,
    /// 差额已推到下一天
    PushedForward {
        daily_output_id: String,
        date: NaiveDate,
        shortfall: i64,
        new_target: i64,
    },
    /// 无后续日期，排产已延期
    Extended(Box<ExtensionOutcome>),
}

impl RebalanceOutcome {
    pub fn is_extended(&self) -> bool {
        matches!(self, RebalanceOutcome::Extended(_))
    }
}

// ==========================================
// Rebalancer - 差额平衡
// ==========================================
#[derive(Debug, Clone)]
pub struct Rebalancer {
    extender: ScheduleExtender,
}

impl Rebalancer {
    pub fn new(extender: ScheduleExtender) -> Self {
        Self { extender }
    }

    /// 在调用方事务中平衡欠产差额
    ///
    /// # 参数
    /// - schedule: 对账后的排产
    /// - short_date: 欠产日期
    /// - shortfall: 欠产量
    pub fn rebalance_tx(
        &self,
        conn: &Connection,
        schedule: &Schedule,
        short_date: NaiveDate,
        shortfall: i64,
    ) -> EngineResult<RebalanceOutcome> {
        if shortfall <= 0 {
            return Ok(RebalanceOutcome::NotRequired);
        }

        let next_rows =
            DailyOutputRepository::find_next_after_tx(conn, &schedule.schedule_id, short_date)?;

        if let [first, second, ..] = next_rows.as_slice() {
            if first.date == second.date {
                return Err(EngineError::DataIntegrity(format!(
                    "排产 {} 在 {} 存在多条日产出",
                    schedule.schedule_id, first.date
                )));
            }
        }

        match next_rows.into_iter().next() {
            Some(next) => {
                let new_target =
                    DailyOutputRepository::add_to_target_tx(conn, &next.daily_output_id, shortfall)?;

                debug!(
                    schedule_id = %schedule.schedule_id,
                    short_date = %short_date,
                    next_date = %next.date,
                    shortfall,
                    new_target,
                    "欠产差额已推到下一天"
                );

                Ok(RebalanceOutcome::PushedForward {
                    daily_output_id: next.daily_output_id,
                    date: next.date,
                    shortfall,
                    new_target,
                })
            }
            None => match self.extender.extend_tx(conn, schedule, shortfall)? {
                Some(outcome) => Ok(RebalanceOutcome::Extended(Box::new(outcome))),
                None => Ok(RebalanceOutcome::NotRequired),
            },
        }
    }
}

// ==========================================
// 产线排产系统 - 级联顺延引擎
// ==========================================
// 规则: 同一产线上、开工日严格晚于锚点排产**原计划完工日**的有效排产，
//       开工日/原计划完工日/当前完工日及全部日产出日期整体平移相同天数
// 限制: 只顺延一层。被顺延的排产不再查找自己的下游，也不检测二次冲突
// ==========================================

use crate::domain::schedule::Schedule;
use crate::engine::error::EngineResult;
use crate::repository::{DailyOutputRepository, ScheduleRepository};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ==========================================
// 顺延结果
// ==========================================

/// 单个被顺延的排产
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftedSchedule {
    pub schedule_id: String,
    pub from_start_date: NaiveDate,
    pub to_start_date: NaiveDate,
    pub to_current_finish_date: NaiveDate,
    pub daily_rows_shifted: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CascadeOutcome {
    pub days_shifted: i64,
    /// 按开工日升序
    pub shifted: Vec<ShiftedSchedule>,
}

// ==========================================
// CascadeShifter - 级联顺延
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct CascadeShifter;

impl CascadeShifter {
    pub fn new() -> Self {
        Self
    }

    /// 在调用方事务中顺延下游排产
    ///
    /// # 参数
    /// - anchor: 发生延期的排产（使用其 finish_date 判定下游）
    /// - days_to_shift: 顺延天数；非正数不做任何修改
    pub fn shift_tx(
        &self,
        conn: &Connection,
        anchor: &Schedule,
        days_to_shift: i64,
    ) -> EngineResult<CascadeOutcome> {
        if days_to_shift <= 0 {
            return Ok(CascadeOutcome::default());
        }

        let candidates = ScheduleRepository::find_starting_after_tx(
            conn,
            &anchor.line_id,
            &anchor.schedule_id,
            anchor.finish_date,
        )?;

        let mut shifted = Vec::with_capacity(candidates.len());
        for mut schedule in candidates
            .into_iter()
            .filter(|s| s.is_shift_eligible_after(anchor))
        {
            let from_start_date = schedule.start_date;
            schedule.shift_dates(days_to_shift);
            ScheduleRepository::update_tx(conn, &schedule)?;
            let daily_rows_shifted =
                DailyOutputRepository::shift_dates_tx(conn, &schedule.schedule_id, days_to_shift)?;

            debug!(
                schedule_id = %schedule.schedule_id,
                from = %from_start_date,
                to = %schedule.start_date,
                daily_rows_shifted,
                "下游排产已顺延"
            );

            shifted.push(ShiftedSchedule {
                schedule_id: schedule.schedule_id,
                from_start_date,
                to_start_date: schedule.start_date,
                to_current_finish_date: schedule.current_finish_date,
                daily_rows_shifted,
            });
        }

        info!(
            anchor_schedule_id = %anchor.schedule_id,
            line_id = %anchor.line_id,
            anchor_finish_date = %anchor.finish_date,
            days_to_shift,
            shifted_count = shifted.len(),
            "级联顺延完成"
        );

        Ok(CascadeOutcome {
            days_shifted: days_to_shift,
            shifted,
        })
    }
}

// ==========================================
// 产线排产系统 - 产线可用性校验
// ==========================================
// 规则: 申请区间 [start, finish) 与有效排产的 [start_date, current_finish_date)
//       半开区间重叠即视为占用；停用产线一律不可用
// 说明: 仅建单时校验，级联顺延不复查
// ==========================================

use crate::engine::error::{EngineError, EngineResult};
use crate::repository::{LineRepository, ScheduleRepository};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// 可用性校验结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub line_id: String,
    pub start: NaiveDate,
    pub finish: NaiveDate,
    pub line_active: bool,
    pub conflicting_schedule_ids: Vec<String>,
}

impl AvailabilityReport {
    pub fn is_available(&self) -> bool {
        self.line_active && self.conflicting_schedule_ids.is_empty()
    }

    /// 不可用时转换为 AvailabilityConflict
    pub fn into_result(self) -> EngineResult<()> {
        if self.is_available() {
            return Ok(());
        }
        let reason = if !self.line_active {
            "产线已停用".to_string()
        } else {
            format!("与 {} 个排产重叠", self.conflicting_schedule_ids.len())
        };
        Err(EngineError::AvailabilityConflict {
            line_id: self.line_id,
            start: self.start,
            finish: self.finish,
            reason,
            conflicting_schedule_ids: self.conflicting_schedule_ids,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LineAvailability;

impl LineAvailability {
    pub fn new() -> Self {
        Self
    }

    /// 查询产线在区间内的占用情况
    ///
    /// exclude_schedule_id: 改单时排除自身
    pub fn check_tx(
        &self,
        conn: &Connection,
        line_id: &str,
        start: NaiveDate,
        finish: NaiveDate,
        exclude_schedule_id: Option<&str>,
    ) -> EngineResult<AvailabilityReport> {
        if finish < start {
            return Err(EngineError::InvalidRange { start, end: finish });
        }

        let line = LineRepository::get_tx(conn, line_id)?;
        let conflicting_schedule_ids =
            ScheduleRepository::find_overlapping_tx(conn, line_id, start, finish, exclude_schedule_id)?
                .into_iter()
                .map(|s| s.schedule_id)
                .collect();

        Ok(AvailabilityReport {
            line_id: line.line_id,
            start,
            finish,
            line_active: line.is_active,
            conflicting_schedule_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn report(active: bool, conflicts: Vec<&str>) -> AvailabilityReport {
        AvailabilityReport {
            line_id: "L1".to_string(),
            start: d(2026, 3, 1),
            finish: d(2026, 3, 5),
            line_active: active,
            conflicting_schedule_ids: conflicts.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn test_free_line_is_available() {
        assert!(report(true, vec![]).into_result().is_ok());
    }

    #[test]
    fn test_inactive_line_conflicts() {
        match report(false, vec![]).into_result() {
            Err(EngineError::AvailabilityConflict { reason, .. }) => assert!(reason.contains("停用")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_overlap_reports_schedule_ids() {
        match report(true, vec!["S9"]).into_result() {
            Err(EngineError::AvailabilityConflict {
                conflicting_schedule_ids,
                ..
            }) => assert_eq!(conflicting_schedule_ids, vec!["S9".to_string()]),
            other => panic!("unexpected: {:?}", other),
        }
    }
}

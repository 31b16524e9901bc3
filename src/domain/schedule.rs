// ==========================================
// 产线排产系统 - 排产领域模型
// ==========================================
// 对齐: schedules / schedule_daily_outputs 表
// ==========================================
// 不变量:
// - current_finish_date >= finish_date
// - qty_completed = Σ daily.actual_output（由对账引擎全量重算维护）
// - finish_date 为原计划完工日，仅随级联顺延整体平移，延期只改 current_finish_date
// ==========================================

use crate::domain::line::Line;
use crate::domain::order::Order;
use crate::domain::types::ScheduleStatus;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Schedule - 排产单
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    // ===== 主键与归属 =====
    pub schedule_id: String,
    pub order_id: String,
    pub line_id: String,

    // ===== 日期 =====
    pub start_date: NaiveDate,          // 开工日
    pub finish_date: NaiveDate,         // 原计划完工日
    pub current_finish_date: NaiveDate, // 延期后的当前完工日

    // ===== 数量 =====
    pub qty_total_target: i64, // 目标总量
    pub qty_completed: i64,    // 累计完成量 (冗余字段)
    pub days_extended: i64,    // 累计延期天数

    pub status: ScheduleStatus,
    pub notes: Option<String>,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>, // 软删除标记
}

impl Schedule {
    /// 原计划天数（闭区间）
    pub fn planned_days(&self) -> i64 {
        (self.finish_date - self.start_date).num_days() + 1
    }

    /// 原计划日均目标 = floor(目标总量 / 原计划天数)
    ///
    /// 原计划天数非正时返回 0，由延期引擎决定兜底值。
    pub fn base_target_per_day(&self) -> i64 {
        let days = self.planned_days();
        if days <= 0 {
            return 0;
        }
        self.qty_total_target / days
    }

    /// 剩余未完成量（不小于 0）
    pub fn qty_remaining(&self) -> i64 {
        (self.qty_total_target - self.qty_completed).max(0)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// 级联顺延资格判定
    ///
    /// 同一产线、非自身、未软删除，且开工日严格晚于 `anchor` 的**原计划**完工日。
    /// 使用原计划完工日而非当前完工日，多次延期时每次都能识别出同一批下游排产。
    pub fn is_shift_eligible_after(&self, anchor: &Schedule) -> bool {
        !self.is_deleted()
            && self.schedule_id != anchor.schedule_id
            && self.line_id == anchor.line_id
            && self.start_date > anchor.finish_date
    }

    /// 整体平移开工日/原计划完工日/当前完工日
    pub fn shift_dates(&mut self, days: i64) {
        let offset = Duration::days(days);
        self.start_date += offset;
        self.finish_date += offset;
        self.current_finish_date += offset;
    }
}

// ==========================================
// ScheduleDailyOutput - 日产出
// ==========================================
// 每个排产在 [start_date, current_finish_date] 内每天一行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDailyOutput {
    pub daily_output_id: String,
    pub schedule_id: String,
    pub date: NaiveDate,
    pub target_output: i64,
    pub actual_output: i64,
    pub balance: i64, // target - actual，超产时为负
    pub is_completed: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ==========================================
// DailyTarget - 日目标拆分结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTarget {
    pub date: NaiveDate,
    pub target: i64,
}

impl DailyTarget {
    /// 转换为全新初始化的日产出行 (actual=0, balance=0, completed=false)
    pub fn into_daily_output(self, schedule_id: &str, now: NaiveDateTime) -> ScheduleDailyOutput {
        ScheduleDailyOutput {
            daily_output_id: uuid::Uuid::new_v4().to_string(),
            schedule_id: schedule_id.to_string(),
            date: self.date,
            target_output: self.target,
            actual_output: 0,
            balance: 0,
            is_completed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

// ==========================================
// NewSchedule - 建单入参
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSchedule {
    pub order_id: String,
    pub line_id: String,
    pub start_date: NaiveDate,
    pub finish_date: NaiveDate,
    pub qty_total_target: i64,
    pub notes: Option<String>,
}

// ==========================================
// ScheduleUpdate - 改单入参（None 表示不修改）
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleUpdate {
    pub line_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub finish_date: Option<NaiveDate>,
    pub qty_total_target: Option<i64>,
    pub notes: Option<String>,
}

impl ScheduleUpdate {
    /// 是否改动了开工日/完工日/目标总量（需要整体重建日产出）
    pub fn requires_regeneration(&self, current: &Schedule) -> bool {
        self.start_date.map_or(false, |d| d != current.start_date)
            || self.finish_date.map_or(false, |d| d != current.finish_date)
            || self
                .qty_total_target
                .map_or(false, |q| q != current.qty_total_target)
    }

    pub fn is_empty(&self) -> bool {
        self.line_id.is_none()
            && self.start_date.is_none()
            && self.finish_date.is_none()
            && self.qty_total_target.is_none()
            && self.notes.is_none()
    }
}

// ==========================================
// ScheduleDetail - 排产详情（含关联）
// ==========================================
// 用途: 改单广播负载、详情查询
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDetail {
    pub schedule: Schedule,
    pub order: Order,
    pub line: Line,
    pub daily_outputs: Vec<ScheduleDailyOutput>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn make_schedule(id: &str, line: &str, start: NaiveDate, finish: NaiveDate, qty: i64) -> Schedule {
        let now = chrono::Local::now().naive_local();
        Schedule {
            schedule_id: id.to_string(),
            order_id: "O1".to_string(),
            line_id: line.to_string(),
            start_date: start,
            finish_date: finish,
            current_finish_date: finish,
            qty_total_target: qty,
            qty_completed: 0,
            days_extended: 0,
            status: ScheduleStatus::Pending,
            notes: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_base_target_per_day() {
        let s = make_schedule("S1", "L1", d(2026, 3, 1), d(2026, 3, 7), 1000);
        assert_eq!(s.planned_days(), 7);
        assert_eq!(s.base_target_per_day(), 142);

        let tiny = make_schedule("S2", "L1", d(2026, 3, 1), d(2026, 3, 7), 5);
        assert_eq!(tiny.base_target_per_day(), 0);
    }

    #[test]
    fn test_shift_eligibility_uses_planned_finish() {
        let mut a = make_schedule("A", "L1", d(2026, 3, 1), d(2026, 3, 5), 500);
        let b = make_schedule("B", "L1", d(2026, 3, 6), d(2026, 3, 10), 500);
        let other_line = make_schedule("C", "L2", d(2026, 3, 6), d(2026, 3, 10), 500);

        // 延期只推迟当前完工日
        a.current_finish_date = d(2026, 3, 8);

        assert!(b.is_shift_eligible_after(&a));
        assert!(!other_line.is_shift_eligible_after(&a));
        assert!(!a.is_shift_eligible_after(&a));

        let mut deleted = b.clone();
        deleted.schedule_id = "D".to_string();
        deleted.deleted_at = Some(chrono::Local::now().naive_local());
        assert!(!deleted.is_shift_eligible_after(&a));
    }

    #[test]
    fn test_requires_regeneration() {
        let s = make_schedule("S1", "L1", d(2026, 3, 1), d(2026, 3, 5), 500);

        let notes_only = ScheduleUpdate {
            notes: Some("换班".to_string()),
            ..Default::default()
        };
        assert!(!notes_only.requires_regeneration(&s));

        let same_qty = ScheduleUpdate {
            qty_total_target: Some(500),
            ..Default::default()
        };
        assert!(!same_qty.requires_regeneration(&s));

        let new_finish = ScheduleUpdate {
            finish_date: Some(d(2026, 3, 6)),
            ..Default::default()
        };
        assert!(new_finish.requires_regeneration(&s));
    }
}

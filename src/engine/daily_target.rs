// ==========================================
// 产线排产系统 - 日目标拆分引擎
// ==========================================
// 规则: 总量在闭区间 [start, end] 内平均拆分，余数全部落在最后一天
// 纯函数: 无副作用
// ==========================================

use crate::domain::schedule::DailyTarget;
use crate::engine::error::{EngineError, EngineResult};
use chrono::{Duration, NaiveDate};

// ==========================================
// DailyTargetGenerator - 日目标拆分
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyTargetGenerator;

impl DailyTargetGenerator {
    pub fn new() -> Self {
        Self
    }

    /// 拆分日目标
    ///
    /// # 参数
    /// - total_qty: 目标总量
    /// - start_date / end_date: 闭区间
    ///
    /// # 返回
    /// - 每个自然日一项；除最后一天外 target = floor(total/days)，最后一天加上余数
    /// - Err(InvalidRange): end_date 早于 start_date
    pub fn generate(
        &self,
        total_qty: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> EngineResult<Vec<DailyTarget>> {
        let total_days = (end_date - start_date).num_days() + 1;
        if total_days <= 0 {
            return Err(EngineError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }

        let base_target = total_qty / total_days;
        let remainder = total_qty % total_days;

        let targets = (0..total_days)
            .map(|offset| {
                let is_last = offset == total_days - 1;
                DailyTarget {
                    date: start_date + Duration::days(offset),
                    target: if is_last { base_target + remainder } else { base_target },
                }
            })
            .collect();

        Ok(targets)
    }

    /// 生成固定日目标的连续日期（延期追加使用）
    ///
    /// 区间为 (after, through]
    pub fn generate_fixed(
        &self,
        daily_target: i64,
        after: NaiveDate,
        through: NaiveDate,
    ) -> Vec<DailyTarget> {
        let days = (through - after).num_days();
        (1..=days)
            .map(|offset| DailyTarget {
                date: after + Duration::days(offset),
                target: daily_target,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_generate_remainder_on_last_day() {
        let targets = DailyTargetGenerator::new()
            .generate(1000, d(2026, 3, 1), d(2026, 3, 7))
            .unwrap();

        assert_eq!(targets.len(), 7);
        assert!(targets[..6].iter().all(|t| t.target == 142));
        assert_eq!(targets[6].target, 148);
        assert_eq!(targets[6].date, d(2026, 3, 7));
        assert_eq!(targets.iter().map(|t| t.target).sum::<i64>(), 1000);
    }

    #[test]
    fn test_generate_sum_is_exact_across_ranges() {
        let generator = DailyTargetGenerator::new();
        let start = d(2026, 1, 30);
        for days in 1..=40i64 {
            for qty in [0i64, 1, 7, 99, 1000, 12_345] {
                let end = start + Duration::days(days - 1);
                let targets = generator.generate(qty, start, end).unwrap();
                assert_eq!(targets.len() as i64, days);
                assert_eq!(targets.iter().map(|t| t.target).sum::<i64>(), qty);
                let base = qty / days;
                assert!(targets[..targets.len() - 1].iter().all(|t| t.target == base));
            }
        }
    }

    #[test]
    fn test_generate_single_day() {
        let targets = DailyTargetGenerator::new()
            .generate(500, d(2026, 3, 1), d(2026, 3, 1))
            .unwrap();
        assert_eq!(targets, vec![DailyTarget { date: d(2026, 3, 1), target: 500 }]);
    }

    #[test]
    fn test_generate_invalid_range() {
        let err = DailyTargetGenerator::new()
            .generate(100, d(2026, 3, 5), d(2026, 3, 4))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidRange { .. }));
    }

    #[test]
    fn test_generate_fixed_is_exclusive_of_start() {
        let targets = DailyTargetGenerator::new().generate_fixed(80, d(2026, 3, 5), d(2026, 3, 7));
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].date, d(2026, 3, 6));
        assert_eq!(targets[1].date, d(2026, 3, 7));
        assert!(targets.iter().all(|t| t.target == 80));
    }
}

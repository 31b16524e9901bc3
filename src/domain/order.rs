// ==========================================
// 产线排产系统 - 订单领域模型
// ==========================================
// 对齐: master_orders 表
// ==========================================

use crate::domain::schedule::Schedule;
use crate::domain::types::OrderStatus;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Order - 客户生产订单
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,           // 订单ID
    pub order_no: String,           // 订单编号
    pub product_name: String,       // 产品描述
    pub qty_total: i64,             // 订单总量
    pub order_date: NaiveDate,      // 下单日期
    pub due_date: Option<NaiveDate>, // 交期
    pub status: OrderStatus,        // 生命周期状态
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ==========================================
// OrderProgress - 订单进度（派生量）
// ==========================================
// 剩余量 = 总量 - 已排量；约定不为负，但存储层不强制
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderProgress {
    pub order_id: String,
    pub qty_total: i64,
    pub qty_scheduled: i64,
    pub qty_completed: i64,
    pub qty_remaining: i64,
    pub schedule_count: usize,
}

impl Order {
    /// 根据该订单下的有效排产计算进度
    ///
    /// 调用方负责只传入本订单、未软删除的排产。
    pub fn progress(&self, schedules: &[Schedule]) -> OrderProgress {
        let qty_scheduled: i64 = schedules.iter().map(|s| s.qty_total_target).sum();
        let qty_completed: i64 = schedules.iter().map(|s| s.qty_completed).sum();

        OrderProgress {
            order_id: self.order_id.clone(),
            qty_total: self.qty_total,
            qty_scheduled,
            qty_completed,
            qty_remaining: self.qty_total - qty_scheduled,
            schedule_count: schedules.len(),
        }
    }
}

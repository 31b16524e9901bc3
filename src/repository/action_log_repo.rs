// ==========================================
// 产线排产系统 - 操作日志数据仓储
// ==========================================
// 红线: 订单/产线/排产的所有写入必须记录，且与被记录的写入同一事务
// 组织: core 写入 / queries 查询
// 对齐: action_log 表
// ==========================================

mod core;
mod queries;

#[cfg(test)]
mod tests;

pub use self::core::ActionLogRepository;

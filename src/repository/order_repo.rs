// ==========================================
// 产线排产系统 - 订单数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 对齐: master_orders 表
// ==========================================

use crate::domain::order::Order;
use crate::domain::types::OrderStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{
    fmt_date, fmt_datetime, get_date, get_datetime, get_enum, get_opt_date, now,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const ORDER_COLUMNS: &str = r#"
    order_id, order_no, product_name, qty_total, order_date, due_date,
    status, created_at, updated_at
"#;

fn map_order(row: &Row) -> rusqlite::Result<Order> {
    Ok(Order {
        order_id: row.get(0)?,
        order_no: row.get(1)?,
        product_name: row.get(2)?,
        qty_total: row.get(3)?,
        order_date: get_date(row, 4)?,
        due_date: get_opt_date(row, 5)?,
        status: get_enum(row, 6, OrderStatus::from_db_str)?,
        created_at: get_datetime(row, 7)?,
        updated_at: get_datetime(row, 8)?,
    })
}

// ==========================================
// OrderRepository - 订单仓储
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, order: &Order) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, order)
    }

    pub fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, order_id)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Order>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM master_orders ORDER BY order_date, order_no", ORDER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map([], map_order)?
            .collect::<rusqlite::Result<Vec<Order>>>()?;
        Ok(orders)
    }

    // ==========================================
    // 事务内操作（供引擎在同一事务中组合）
    // ==========================================

    pub fn insert_tx(conn: &Connection, order: &Order) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO master_orders (
                order_id, order_no, product_name, qty_total, order_date, due_date,
                status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                order.order_id,
                order.order_no,
                order.product_name,
                order.qty_total,
                fmt_date(order.order_date),
                order.due_date.map(fmt_date),
                order.status.to_db_str(),
                fmt_datetime(order.created_at),
                fmt_datetime(order.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id_tx(conn: &Connection, order_id: &str) -> RepositoryResult<Option<Order>> {
        let sql = format!("SELECT {} FROM master_orders WHERE order_id = ?1", ORDER_COLUMNS);
        let order = conn
            .query_row(&sql, params![order_id], map_order)
            .optional()?;
        Ok(order)
    }

    /// 按ID读取，不存在时返回 NotFound
    pub fn get_tx(conn: &Connection, order_id: &str) -> RepositoryResult<Order> {
        Self::find_by_id_tx(conn, order_id)?
            .ok_or_else(|| RepositoryError::not_found("Order", order_id))
    }

    pub fn update_status_tx(
        conn: &Connection,
        order_id: &str,
        status: OrderStatus,
    ) -> RepositoryResult<()> {
        let affected = conn.execute(
            "UPDATE master_orders SET status = ?1, updated_at = ?2 WHERE order_id = ?3",
            params![status.to_db_str(), fmt_datetime(now()), order_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Order", order_id));
        }
        Ok(())
    }
}

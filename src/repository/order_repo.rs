// ==========================================
// 机台生产排程 - 订单数据仓储（只读）
// ==========================================
// 表: production_order / production_order_product
// 说明: 订单维护属于外部协作方，这里只提供排程需要的读取
// ==========================================

use crate::domain::order::{OrderProduct, ProductionOrder};
use crate::domain::types::OrderStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// OrderRepository - 订单仓储
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询机台的排队订单（待生产/生产中），新订单在前
    pub fn find_queued_orders(&self, machine_no: &str) -> RepositoryResult<Vec<ProductionOrder>> {
        let conn = self.get_conn()?;
        let [pending, in_production] = OrderStatus::QUEUED;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, order_no, machine_no, status, create_time
            FROM production_order
            WHERE machine_no = ?1
              AND deleted = 0
              AND status IN (?2, ?3)
            ORDER BY create_time DESC, id DESC
            "#,
        )?;

        let rows = stmt
            .query_map(
                params![machine_no, pending.code(), in_production.code()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i32>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, order_no, machine_no, status, create_time)| {
                let status = OrderStatus::from_code(status).ok_or_else(|| {
                    RepositoryError::FieldValueError {
                        field: "status".to_string(),
                        message: format!("未知订单状态: {}", status),
                    }
                })?;
                let create_time = NaiveDateTime::parse_from_str(&create_time, "%Y-%m-%d %H:%M:%S")
                    .map_err(|e| RepositoryError::FieldValueError {
                        field: "create_time".to_string(),
                        message: e.to_string(),
                    })?;
                Ok(ProductionOrder {
                    id,
                    order_no,
                    machine_no,
                    status,
                    create_time,
                })
            })
            .collect()
    }

    /// 查询机台排队订单下的全部产品（排程名单）
    ///
    /// # 参数
    /// - machine_no: 机台号
    ///
    /// # 返回
    /// - Ok(Vec<OrderProduct>): 订单按创建时间倒序展开，单个订单内按 sort_order 升序
    /// - Err: 数据库错误
    ///
    /// 已删除的订单/产品、已完成与已取消的订单不会出现在名单中。
    pub fn find_queued_products(&self, machine_no: &str) -> RepositoryResult<Vec<OrderProduct>> {
        let conn = self.get_conn()?;
        let [pending, in_production] = OrderStatus::QUEUED;

        let mut stmt = conn.prepare(
            r#"
            SELECT
                p.product_name, p.product_code, p.order_quantity,
                p.daily_capacity, p.sort_order, p.order_id
            FROM production_order_product p
            JOIN production_order o ON o.id = p.order_id
            WHERE o.machine_no = ?1
              AND o.deleted = 0
              AND p.deleted = 0
              AND o.status IN (?2, ?3)
            ORDER BY o.create_time DESC, o.id DESC, p.sort_order ASC, p.id ASC
            "#,
        )?;

        let products = stmt
            .query_map(
                params![machine_no, pending.code(), in_production.code()],
                |row| {
                    Ok(OrderProduct {
                        product_name: row.get(0)?,
                        product_code: row.get(1)?,
                        order_quantity: row.get(2)?,
                        daily_capacity: row.get(3)?,
                        sort_order: row.get(4)?,
                        order_id: row.get(5)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(products)
    }
}

// ==========================================
// 机台生产排程 - 排程数据仓储
// ==========================================
// 表: production_schedule / production_schedule_run
// 红线: Repository 不含业务逻辑
// 红线: 重排 = 同一事务内物理删除旧排程 + 插入新排程
// ==========================================

use crate::domain::schedule::{ScheduleQuery, ScheduleRecord, ScheduleResult, ScheduleRun};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{Local, NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SELECT_COLUMNS: &str = r#"
    SELECT
        id, machine_no, equipment_id, equipment_no, schedule_date, day_number,
        product_code, product_name, production_quantity, daily_capacity,
        remaining_quantity, order_id, created_at
    FROM production_schedule
"#;

// ==========================================
// ScheduleRepository - 排程仓储
// ==========================================

/// 排程仓储
/// 职责: 管理 production_schedule 与 production_schedule_run 表
pub struct ScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleRepository {
    /// 创建新的排程仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(ScheduleRepository): 仓储实例
    /// - Err: 数据库连接错误
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写操作
    // ==========================================

    /// 重排落库：删除机台全部旧排程，写入新排程，并记录本次运行
    ///
    /// 三步在同一事务内完成；任一步失败整体回滚，旧排程保持原样。
    ///
    /// # 参数
    /// - result: 引擎输出的排程结果
    ///
    /// # 返回
    /// - Ok(usize): 写入的排程行数
    /// - Err: 数据库错误（事务已回滚）
    pub fn regenerate(&self, result: &ScheduleResult) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let now = Local::now().naive_local().format(DATETIME_FORMAT).to_string();

        let deleted = tx.execute(
            "DELETE FROM production_schedule WHERE machine_no = ?1",
            params![&result.machine_no],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO production_schedule (
                        machine_no, equipment_id, equipment_no, schedule_date, day_number,
                        product_code, product_name, production_quantity, daily_capacity,
                        remaining_quantity, order_id, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"#,
            )?;

            for day in &result.days {
                stmt.execute(params![
                    &result.machine_no,
                    &result.equipment_id,
                    &result.equipment_no,
                    day.schedule_date.format(DATE_FORMAT).to_string(),
                    day.day_number,
                    &day.product_code,
                    &day.product_name,
                    day.production_quantity,
                    day.daily_capacity,
                    day.remaining_quantity,
                    day.order_id,
                    &now,
                ])?;
            }
        }

        tx.execute(
            r#"INSERT INTO production_schedule_run (
                    machine_no, schedule_start_date, can_complete_target,
                    horizon_days, required_days, generated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(machine_no) DO UPDATE SET
                    schedule_start_date = excluded.schedule_start_date,
                    can_complete_target = excluded.can_complete_target,
                    horizon_days = excluded.horizon_days,
                    required_days = excluded.required_days,
                    generated_at = excluded.generated_at"#,
            params![
                &result.machine_no,
                result.schedule_start_date.format(DATE_FORMAT).to_string(),
                if result.can_complete_target { 1 } else { 0 },
                result.horizon_days.map(|h| h as i64),
                result.required_days,
                &now,
            ],
        )?;

        tx.commit()?;

        tracing::debug!(
            machine_no = %result.machine_no,
            deleted,
            inserted = result.days.len(),
            "排程已重写"
        );
        Ok(result.days.len())
    }

    /// 删除机台的全部排程及运行记录
    ///
    /// # 返回
    /// - Ok(usize): 删除的排程行数
    pub fn delete_by_machine(&self, machine_no: &str) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let deleted = tx.execute(
            "DELETE FROM production_schedule WHERE machine_no = ?1",
            params![machine_no],
        )?;
        tx.execute(
            "DELETE FROM production_schedule_run WHERE machine_no = ?1",
            params![machine_no],
        )?;

        tx.commit()?;
        Ok(deleted)
    }

    /// 按ID删除单条排程行
    ///
    /// # 返回
    /// - Ok(usize): 删除行数（0 表示不存在）
    pub fn delete_by_id(&self, id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let deleted = conn.execute("DELETE FROM production_schedule WHERE id = ?1", params![id])?;
        Ok(deleted)
    }

    // ==========================================
    // 读操作
    // ==========================================

    /// 按ID查询排程行
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ScheduleRecord>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let record = conn
            .query_row(&sql, params![id], map_record)
            .optional()?;
        Ok(record)
    }

    /// 查询机台的排程（按日期、day_number 升序）
    ///
    /// # 参数
    /// - machine_no: 机台号
    /// - start_date: 可选，只返回该日期及之后的行
    pub fn find_by_machine(
        &self,
        machine_no: &str,
        start_date: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<ScheduleRecord>> {
        if machine_no.trim().is_empty() {
            return Ok(Vec::new());
        }
        let query = ScheduleQuery {
            machine_no: Some(machine_no.to_string()),
            start_date,
        };
        self.find_by_query(&query)
    }

    /// 按条件查询排程明细
    ///
    /// 排序: 机台号、排程日期、工作日序号
    pub fn find_by_query(&self, query: &ScheduleQuery) -> RepositoryResult<Vec<ScheduleRecord>> {
        let conn = self.get_conn()?;
        let (where_clause, values) = build_filter(query);
        let sql = format!(
            "{}{} ORDER BY machine_no ASC, schedule_date ASC, day_number ASC",
            SELECT_COLUMNS, where_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(values), map_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// 列出有排程的机台号（去重，升序）
    pub fn list_machine_nos(&self, query: &ScheduleQuery) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let (where_clause, values) = build_filter(query);
        let sql = format!(
            "SELECT DISTINCT machine_no FROM production_schedule{} ORDER BY machine_no ASC",
            where_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let machine_nos = stmt
            .query_map(params_from_iter(values), |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(machine_nos)
    }

    /// 统计机台排程行数
    pub fn count_by_machine(&self, machine_no: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM production_schedule WHERE machine_no = ?1",
            params![machine_no],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// 查询机台最近一次重排记录
    pub fn find_run(&self, machine_no: &str) -> RepositoryResult<Option<ScheduleRun>> {
        let conn = self.get_conn()?;
        let run = conn
            .query_row(
                r#"SELECT machine_no, schedule_start_date, can_complete_target,
                          horizon_days, required_days, generated_at
                   FROM production_schedule_run
                   WHERE machine_no = ?1"#,
                params![machine_no],
                |row| {
                    Ok(ScheduleRun {
                        machine_no: row.get(0)?,
                        schedule_start_date: parse_date(row, 1)?,
                        can_complete_target: row.get::<_, i64>(2)? != 0,
                        horizon_days: row.get(3)?,
                        required_days: row.get(4)?,
                        generated_at: parse_datetime(row, 5)?,
                    })
                },
            )
            .optional()?;
        Ok(run)
    }
}

// ==========================================
// 辅助函数
// ==========================================

fn build_filter(query: &ScheduleQuery) -> (String, Vec<Value>) {
    let mut conditions: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(machine_no) = query.machine_filter() {
        conditions.push("machine_no = ?");
        values.push(Value::Text(machine_no.to_string()));
    }
    if let Some(start_date) = query.start_date {
        conditions.push("schedule_date >= ?");
        values.push(Value::Text(start_date.format(DATE_FORMAT).to_string()));
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), values)
    }
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<ScheduleRecord> {
    Ok(ScheduleRecord {
        id: row.get(0)?,
        machine_no: row.get(1)?,
        equipment_id: row.get(2)?,
        equipment_no: row.get(3)?,
        schedule_date: parse_date(row, 4)?,
        day_number: row.get(5)?,
        product_code: row.get(6)?,
        product_name: row.get(7)?,
        production_quantity: row.get(8)?,
        daily_capacity: row.get(9)?,
        remaining_quantity: row.get(10)?,
        order_id: row.get(11)?,
        created_at: parse_datetime(row, 12)?,
    })
}

fn parse_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

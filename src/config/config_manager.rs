// ==========================================
// 机台生产排程 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::parse_weekday;
use crate::engine::calendar::{CalendarPolicy, Horizon};
use chrono::Weekday;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 导出默认的工作日列数
pub const DEFAULT_EXPORT_HORIZON_DAYS: usize = 30;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    // ===== 排程配置 =====

    /// 导出时默认展示的工作日列数
    ///
    /// 配置缺失、非数字或为 0 时回退到 30
    pub fn export_horizon_days(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::EXPORT_HORIZON_DAYS,
            &DEFAULT_EXPORT_HORIZON_DAYS.to_string(),
        )?;
        match value.trim().parse::<usize>() {
            Ok(days) if days > 0 => Ok(days),
            _ => {
                tracing::warn!(
                    config_key = config_keys::EXPORT_HORIZON_DAYS,
                    raw_value = %value,
                    "导出天数配置无效，使用默认值"
                );
                Ok(DEFAULT_EXPORT_HORIZON_DAYS)
            }
        }
    }

    /// 落库排程的天数上限
    ///
    /// # 返回
    /// - Horizon::Unbounded: 未配置、空值、0 或无法解析
    /// - Horizon::WorkingDays(n): 配置为正整数 n
    pub fn plan_horizon(&self) -> Result<Horizon, Box<dyn Error>> {
        let value = match self.get_config_value(config_keys::PLAN_HORIZON_DAYS)? {
            Some(v) => v,
            None => return Ok(Horizon::Unbounded),
        };

        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(Horizon::Unbounded);
        }

        match trimmed.parse::<usize>() {
            Ok(days) if days > 0 => Ok(Horizon::WorkingDays(days)),
            _ => {
                tracing::warn!(
                    config_key = config_keys::PLAN_HORIZON_DAYS,
                    raw_value = %value,
                    "排程天数上限配置无效，按不限天数处理"
                );
                Ok(Horizon::Unbounded)
            }
        }
    }

    /// 休息日日历
    ///
    /// 配置格式: 逗号分隔的星期代码，例如 "SAT,SUN"；无法识别的代码会被忽略。
    /// 全部七天都是休息日时返回错误（EngineError::InvalidCalendar）。
    pub fn calendar_policy(&self) -> Result<CalendarPolicy, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::REST_WEEKDAYS, "SUN")?;

        let mut rest_days: Vec<Weekday> = Vec::new();
        for token in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match parse_weekday(token) {
                Some(day) => rest_days.push(day),
                None => tracing::warn!(
                    config_key = config_keys::REST_WEEKDAYS,
                    token,
                    "无法识别的休息日代码，已忽略"
                ),
            }
        }

        Ok(CalendarPolicy::with_rest_days(&rest_days)?)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 导出
    pub const EXPORT_HORIZON_DAYS: &str = "schedule/export_horizon_days";

    // 排程
    pub const PLAN_HORIZON_DAYS: &str = "schedule/plan_horizon_days";
    pub const REST_WEEKDAYS: &str = "schedule/rest_weekdays";
}

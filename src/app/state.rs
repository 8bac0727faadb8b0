// ==========================================
// 机台生产排程 - 应用状态
// ==========================================
// 职责: 打开数据库、建表、装配 API 实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::ScheduleApi;
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::ScheduleEventPublisher;

/// 应用状态
///
/// 持有共享连接上装配好的 API 实例
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 排程API
    pub schedule_api: Arc<ScheduleApi>,

    /// 配置管理器（与排程API共享连接）
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - event_publisher: 可选的排程事件发布者
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(
        db_path: String,
        event_publisher: Option<Arc<dyn ScheduleEventPublisher>>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let schedule_api = Arc::new(
            ScheduleApi::from_connection(conn, event_publisher)
                .map_err(|e| format!("无法创建ScheduleApi: {}", e))?,
        );

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            schedule_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 PRODUCTION_SCHEDULE_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("PRODUCTION_SCHEDULE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./production_schedule.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("production-schedule");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("production_schedule.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_initializes_schema() {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();

        let state = AppState::new(db_path.clone(), None).unwrap();
        assert_eq!(state.db_path, db_path);
        assert_eq!(state.config_manager.export_horizon_days().unwrap(), 30);

        let view = state
            .schedule_api
            .get_schedule_by_machine("M1", None)
            .unwrap();
        assert!(view.days.is_empty());
    }
}

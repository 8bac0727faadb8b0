// ==========================================
// 机台生产排程 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 按机台逐日排产（每个工作日只排一个产品）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 排程算法
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    EquipmentInfo, Job, OrderProduct, OrderStatus, ProductionOrder, ScheduleDay, ScheduleQuery,
    ScheduleRecord, ScheduleResult,
};

// 引擎
pub use engine::{
    Allocator, CalendarPolicy, DemandQueue, EngineError, Exporter, FeasibilityChecker, Horizon,
    ScheduleEngine, ScheduleRequest,
};

// API
pub use api::{ApiError, ScheduleApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "机台生产排程";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(!APP_NAME.is_empty());
    }
}

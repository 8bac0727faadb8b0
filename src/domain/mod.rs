// ==========================================
// 机台生产排程 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod equipment;
pub mod order;
pub mod schedule;
pub mod types;

// 重导出核心类型
pub use equipment::EquipmentInfo;
pub use order::{OrderProduct, ProductionOrder};
pub use schedule::{Job, ScheduleDay, ScheduleQuery, ScheduleRecord, ScheduleResult, ScheduleRun};
pub use types::{parse_weekday, weekday_code, OrderStatus};

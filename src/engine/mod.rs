// ==========================================
// 机台生产排程 - 引擎层
// ==========================================
// 职责: 实现排程算法,不拼 SQL
// 红线: Engine 不做 I/O, 非法输入在分配前拒绝
// ==========================================

pub mod allocator;
pub mod calendar;
pub mod demand_queue;
pub mod error;
pub mod events;
pub mod exporter;
pub mod feasibility;
pub mod orchestrator;

// 重导出核心引擎
pub use allocator::{Allocation, Allocator};
pub use calendar::{CalendarPolicy, Horizon, WorkingDays};
pub use demand_queue::DemandQueue;
pub use error::{EngineError, EngineResult};
pub use events::{
    NoOpEventPublisher, OptionalEventPublisher, ScheduleEvent, ScheduleEventPublisher,
    ScheduleEventType,
};
pub use exporter::{ExportCell, ExportRow, Exporter, RosterEntry};
pub use feasibility::{FeasibilityChecker, FeasibilityReport};
pub use orchestrator::{ScheduleEngine, ScheduleRequest};
